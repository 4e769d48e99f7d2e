//! Append-only persistence of completed sessions.
//!
//! One JSON document per session, keyed by a second-resolution timestamp.
//! Records are written once and never mutated.

use crate::error::DebateError;

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// The immutable snapshot persisted for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub motion: String,
    pub speech_log: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_info: Option<Vec<SpeakerInfo>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerInfo {
    pub role: String,
    pub speaker: String,
}

/// A record as read back from disk, keyed by its filename timestamp.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub timestamp: String,
    pub file_name: String,
    pub record: HistoryRecord,
}

pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, DebateError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            DebateError::Persist(format!("cannot create {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes one record. The write goes to a scratch file and is renamed
    /// into place, so a partially written record is never visible.
    pub fn append(&self, record: &HistoryRecord) -> Result<PathBuf, DebateError> {
        if let Some(info) = &record.speaker_info {
            if info.len() != record.speech_log.len() {
                return Err(DebateError::Persist(format!(
                    "speaker_info length {} does not match speech_log length {}",
                    info.len(),
                    record.speech_log.len()
                )));
            }
        }

        let key = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let path = self.reserve_path(&key)?;

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| DebateError::Persist(e.to_string()))?;

        let scratch = path.with_extension("json.tmp");
        fs::write(&scratch, json).map_err(|e| DebateError::Persist(e.to_string()))?;
        fs::rename(&scratch, &path).map_err(|e| {
            let _ = fs::remove_file(&scratch);
            DebateError::Persist(e.to_string())
        })?;

        Ok(path)
    }

    // Two sessions finishing within the same second get a numeric suffix,
    // which still sorts after the plain key.
    fn reserve_path(&self, key: &str) -> Result<PathBuf, DebateError> {
        let candidate = self.dir.join(format!("{key}.json"));
        if !candidate.exists() {
            return Ok(candidate);
        }
        for n in 1..100 {
            let candidate = self.dir.join(format!("{key}_{n}.json"));
            if !candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(DebateError::Persist(format!(
            "too many records within the same second for key {key}"
        )))
    }

    /// Most-recent-first listing. Unreadable or corrupt entries are logged
    /// and skipped rather than failing the whole query.
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<StoredRecord>, DebateError> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)
            .map_err(|e| DebateError::Persist(e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();

        // Filenames are timestamp keys, so lexicographic order is creation order.
        files.sort();
        files.reverse();
        if let Some(limit) = limit {
            files.truncate(limit);
        }

        let mut records = Vec::with_capacity(files.len());
        for path in files {
            match read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping unreadable history file {}: {e}", path.display()),
            }
        }
        Ok(records)
    }
}

fn read_record(path: &Path) -> Result<StoredRecord, DebateError> {
    let contents = fs::read_to_string(path).map_err(|e| DebateError::Persist(e.to_string()))?;
    let record: HistoryRecord =
        serde_json::from_str(&contents).map_err(|e| DebateError::Persist(e.to_string()))?;
    let timestamp = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(StoredRecord {
        timestamp,
        file_name,
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(motion: &str) -> HistoryRecord {
        HistoryRecord {
            motion: motion.to_string(),
            speech_log: vec!["Speech 1".to_string(), "Speech 2".to_string()],
            speaker_info: Some(vec![
                SpeakerInfo {
                    role: "Prime Minister".to_string(),
                    speaker: "AI".to_string(),
                },
                SpeakerInfo {
                    role: "Leader of Opposition".to_string(),
                    speaker: "Alice".to_string(),
                },
            ]),
        }
    }

    #[test]
    fn test_append_then_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path()).unwrap();

        let path = store.append(&record("This house would persist.")).unwrap();
        assert!(path.exists());

        let listed = store.list(None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].record, record("This house would persist."));
        assert!(!listed[0].timestamp.is_empty());
    }

    #[test]
    fn test_same_second_appends_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path()).unwrap();

        store.append(&record("First")).unwrap();
        store.append(&record("Second")).unwrap();
        store.append(&record("Third")).unwrap();

        let listed = store.list(None).unwrap();
        assert_eq!(listed.len(), 3);
        // Most recent first: the suffixed keys sort after the plain key.
        assert_eq!(listed[0].record.motion, "Third");
        assert_eq!(listed[2].record.motion, "First");
    }

    #[test]
    fn test_list_skips_corrupt_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path()).unwrap();

        store.append(&record("Valid")).unwrap();
        fs::write(dir.path().join("00000000_000000.json"), "not json at all").unwrap();

        let listed = store.list(None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].record.motion, "Valid");
    }

    #[test]
    fn test_list_honors_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path()).unwrap();

        for motion in ["a", "b", "c"] {
            store.append(&record(motion)).unwrap();
        }

        let listed = store.list(Some(2)).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].record.motion, "c");
    }

    #[test]
    fn test_append_rejects_mismatched_speaker_info() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path()).unwrap();

        let mut bad = record("Mismatch");
        bad.speech_log.push("Speech 3".to_string());

        assert!(matches!(
            store.append(&bad),
            Err(DebateError::Persist(_))
        ));
        assert!(store.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_speaker_info_omitted_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path()).unwrap();

        let mut anonymous = record("No speakers");
        anonymous.speaker_info = None;
        let path = store.append(&anonymous).unwrap();

        let raw = fs::read_to_string(path).unwrap();
        assert!(!raw.contains("speaker_info"));
    }
}
