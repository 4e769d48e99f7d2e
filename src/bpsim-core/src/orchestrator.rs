//! Debate session orchestration.
//!
//! Drives one full British Parliamentary session: motion announcement,
//! prep-time brainstorming, eight speeches in fixed order, persistence.

use crate::brainstorm::{BrainstormCoordinator, ClueSet};
use crate::capture::{AudioCaptureController, CapturedAudio};
use crate::chair::Chair;
use crate::error::DebateError;
use crate::history::{HistoryRecord, HistoryStore, SpeakerInfo};
use crate::providers::{ContentGenerator, Transcriber};
use crate::role::{ParticipantKind, Role, Team};

use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};

/// Where a speech came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechSource {
    Ai,
    Human,
}

/// One delivered speech.
#[derive(Debug, Clone)]
pub struct Speech {
    pub role: Role,
    pub content: String,
    pub source: SpeechSource,
    pub speaker_label: String,
    pub sequence_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Init,
    Brainstorming,
    Ready,
    InProgress,
    Complete,
    Failed,
}

/// The state of one debate session.
#[derive(Debug)]
pub struct Session {
    pub motion: String,
    pub role_assignments: Vec<(Role, ParticipantKind)>,
    pub speech_log: Vec<Speech>,
    pub clue_set: Option<ClueSet>,
    pub status: SessionStatus,
    pub current_index: usize,
}

/// Microphone capture seam for human turns.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    async fn capture(&self, role: Role, sample_rate: u32) -> Option<CapturedAudio>;
}

#[async_trait]
impl SpeechCapture for AudioCaptureController {
    async fn capture(&self, role: Role, sample_rate: u32) -> Option<CapturedAudio> {
        AudioCaptureController::capture(self, role, sample_rate).await
    }
}

pub struct SessionOrchestrator {
    content: Arc<dyn ContentGenerator>,
    chair: Chair,
    transcriber: Arc<dyn Transcriber>,
    brainstorm: BrainstormCoordinator,
    capture: Arc<dyn SpeechCapture>,
    history: HistoryStore,
    sample_rate: u32,
}

impl SessionOrchestrator {
    pub fn new(
        content: Arc<dyn ContentGenerator>,
        chair: Chair,
        transcriber: Arc<dyn Transcriber>,
        brainstorm: BrainstormCoordinator,
        capture: Arc<dyn SpeechCapture>,
        history: HistoryStore,
        sample_rate: u32,
    ) -> Self {
        Self {
            content,
            chair,
            transcriber,
            brainstorm,
            capture,
            history,
            sample_rate,
        }
    }

    /// Runs one session start to finish.
    ///
    /// A failed prep phase ends the session in `Failed` without any turns
    /// and without a history record. A speech generation failure aborts
    /// with an error. Persistence failures are logged but do not demote a
    /// completed session.
    pub async fn run(
        &self,
        motion: &str,
        role_assignments: Vec<(Role, ParticipantKind)>,
    ) -> Result<Session, DebateError> {
        validate_assignments(&role_assignments)?;

        let mut session = Session {
            motion: motion.to_string(),
            role_assignments,
            speech_log: Vec::new(),
            clue_set: None,
            status: SessionStatus::Init,
            current_index: 0,
        };

        info!("session starting, motion: {motion}");
        self.chair.announce_motion(motion).await;

        session.status = SessionStatus::Brainstorming;
        match self.brainstorm.prepare(motion, &Team::ALL).await {
            Ok(clue_set) => session.clue_set = Some(clue_set),
            Err(e) => {
                warn!("prep phase failed, abandoning session: {e}");
                session.status = SessionStatus::Failed;
                return Ok(session);
            }
        }
        session.status = SessionStatus::Ready;

        self.chair.start_debate().await;
        session.status = SessionStatus::InProgress;

        let assignments = session.role_assignments.clone();
        let mut speaker_info = Vec::with_capacity(assignments.len());
        for (i, (role, kind)) in assignments.iter().enumerate() {
            let speech = match kind {
                ParticipantKind::Ai => self.ai_turn(&session, *role).await?,
                ParticipantKind::Human { nickname } => {
                    self.human_turn(*role, nickname, i).await
                }
            };

            speaker_info.push(SpeakerInfo {
                role: role.display_name().to_string(),
                speaker: speech.speaker_label.clone(),
            });
            session.speech_log.push(speech);
            session.current_index += 1;

            if let Some((next, _)) = assignments.get(i + 1) {
                self.chair.announce_next_speaker(*role, *next).await;
            }
        }

        self.chair.announce_end().await;
        session.status = SessionStatus::Complete;

        let record = HistoryRecord {
            motion: session.motion.clone(),
            speech_log: session
                .speech_log
                .iter()
                .map(|s| s.content.clone())
                .collect(),
            speaker_info: Some(speaker_info),
        };
        if let Err(e) = self.history.append(&record) {
            warn!("failed to persist session record: {e}");
        }

        info!("session complete, {} speeches", session.speech_log.len());
        Ok(session)
    }

    async fn ai_turn(&self, session: &Session, role: Role) -> Result<Speech, DebateError> {
        let clue = session
            .clue_set
            .as_ref()
            .map(|c| c.get(role.team()))
            .unwrap_or_default();
        let prior: Vec<String> = session
            .speech_log
            .iter()
            .map(|s| s.content.clone())
            .collect();

        let raw = self
            .content
            .generate(&session.motion, role, &prior, clue)
            .await?;
        let content = sanitize_speech(&raw);

        self.chair.read_speech(&content).await;

        Ok(Speech {
            role,
            content,
            source: SpeechSource::Ai,
            speaker_label: "AI".to_string(),
            sequence_index: session.current_index,
        })
    }

    /// A human turn never fails the session. A dead microphone or a failed
    /// transcription yields an empty speech and the debate moves on.
    async fn human_turn(&self, role: Role, nickname: &str, sequence_index: usize) -> Speech {
        let content = match self.capture.capture(role, self.sample_rate).await {
            Some(audio) => match self.transcriber.transcribe(audio.path()).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("transcription failed for {}: {e}", role.display_name());
                    String::new()
                }
            },
            None => {
                warn!("no audio captured for {}", role.display_name());
                String::new()
            }
        };

        Speech {
            role,
            content,
            source: SpeechSource::Human,
            speaker_label: nickname.to_string(),
            sequence_index,
        }
    }
}

fn validate_assignments(assignments: &[(Role, ParticipantKind)]) -> Result<(), DebateError> {
    if assignments.len() != Role::SPEAKING_ORDER.len() {
        return Err(DebateError::InvalidAssignments(format!(
            "expected {} role assignments, got {}",
            Role::SPEAKING_ORDER.len(),
            assignments.len()
        )));
    }
    for (expected, (actual, _)) in Role::SPEAKING_ORDER.iter().zip(assignments) {
        if expected != actual {
            return Err(DebateError::InvalidAssignments(format!(
                "expected {} at position {}, got {}",
                expected.display_name(),
                expected.index(),
                actual.display_name()
            )));
        }
    }
    Ok(())
}

/// Strips reasoning tags, markdown emphasis and excess whitespace from a
/// generated speech so the chair reads only the spoken words.
fn sanitize_speech(response: &str) -> String {
    let tags_to_strip = [
        "thinking",
        "think",
        "reflection",
        "reflect",
        "internal",
        "reasoning",
        "thought",
        "scratchpad",
        "plan",
        "analysis",
    ];

    let mut result = response.to_string();

    for tag in &tags_to_strip {
        let pattern = format!(r"(?is)<{tag}[^>]*>.*?</{tag}>");
        if let Ok(re) = Regex::new(&pattern) {
            result = re.replace_all(&result, "").to_string();
        }
    }

    if let Ok(orphan_re) = Regex::new(r"</?[\w]+[^>]*>") {
        result = orphan_re.replace_all(&result, "").to_string();
    }

    result = result.replace('*', "");

    if let Ok(ws_re) = Regex::new(r"\s+") {
        result = ws_re.replace_all(&result, " ").to_string();
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Announcer, BrainstormProvider};

    fn all_ai() -> Vec<(Role, ParticipantKind)> {
        Role::SPEAKING_ORDER
            .iter()
            .map(|&r| (r, ParticipantKind::Ai))
            .collect()
    }

    struct CannedContent;

    #[async_trait]
    impl ContentGenerator for CannedContent {
        async fn generate(
            &self,
            _motion: &str,
            role: Role,
            prior_speeches: &[String],
            clue: &str,
        ) -> Result<String, DebateError> {
            Ok(format!(
                "{} speech after {} others, clue: {clue}",
                role.display_name(),
                prior_speeches.len()
            ))
        }
    }

    struct FailingContent;

    #[async_trait]
    impl ContentGenerator for FailingContent {
        async fn generate(
            &self,
            _motion: &str,
            role: Role,
            _prior_speeches: &[String],
            _clue: &str,
        ) -> Result<String, DebateError> {
            Err(DebateError::ContentGeneration {
                role: role.display_name().to_string(),
                message: "model unavailable".to_string(),
            })
        }
    }

    struct SilentAnnouncer;

    #[async_trait]
    impl Announcer for SilentAnnouncer {
        async fn speak(&self, _tone: &str, _text: &str) -> Result<(), DebateError> {
            Ok(())
        }
    }

    struct FailingAnnouncer;

    #[async_trait]
    impl Announcer for FailingAnnouncer {
        async fn speak(&self, _tone: &str, _text: &str) -> Result<(), DebateError> {
            Err(DebateError::Announcement("speaker offline".to_string()))
        }
    }

    struct CannedBrainstorm;

    #[async_trait]
    impl BrainstormProvider for CannedBrainstorm {
        async fn brainstorm(&self, _motion: &str, team: Team) -> Result<String, DebateError> {
            Ok(format!("{} notes", team.abbreviation()))
        }
    }

    struct FailingBrainstorm;

    #[async_trait]
    impl BrainstormProvider for FailingBrainstorm {
        async fn brainstorm(&self, _motion: &str, team: Team) -> Result<String, DebateError> {
            Err(DebateError::Brainstorm {
                team: team.display_name().to_string(),
                message: "provider unavailable".to_string(),
            })
        }
    }

    struct NoneCapture;

    #[async_trait]
    impl SpeechCapture for NoneCapture {
        async fn capture(&self, _role: Role, _sample_rate: u32) -> Option<CapturedAudio> {
            None
        }
    }

    /// Produces a real temp file so transcription failure paths can check
    /// that the take is removed afterwards.
    struct FileCapture(&'static str);

    #[async_trait]
    impl SpeechCapture for FileCapture {
        async fn capture(&self, _role: Role, _sample_rate: u32) -> Option<CapturedAudio> {
            let file = tempfile::Builder::new()
                .prefix(self.0)
                .suffix(".wav")
                .tempfile()
                .unwrap();
            Some(CapturedAudio::from_path(file.into_temp_path().keep().unwrap()))
        }
    }

    struct CannedTranscriber;

    #[async_trait]
    impl Transcriber for CannedTranscriber {
        async fn transcribe(&self, _audio_path: &std::path::Path) -> Result<String, DebateError> {
            Ok("a transcribed human speech".to_string())
        }
    }

    struct FailingTranscriber;

    #[async_trait]
    impl Transcriber for FailingTranscriber {
        async fn transcribe(&self, _audio_path: &std::path::Path) -> Result<String, DebateError> {
            Err(DebateError::Transcription("service down".to_string()))
        }
    }

    struct Harness {
        orchestrator: SessionOrchestrator,
        _dir: tempfile::TempDir,
        history_dir: std::path::PathBuf,
    }

    fn harness(
        content: Arc<dyn ContentGenerator>,
        announcer: Arc<dyn Announcer>,
        brainstorm: Arc<dyn BrainstormProvider>,
        capture: Arc<dyn SpeechCapture>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let history_dir = dir.path().join("history");
        let orchestrator = SessionOrchestrator::new(
            content,
            Chair::new(announcer, "formal"),
            transcriber,
            BrainstormCoordinator::new(brainstorm),
            capture,
            HistoryStore::open(&history_dir).unwrap(),
            16_000,
        );
        Harness {
            orchestrator,
            _dir: dir,
            history_dir,
        }
    }

    fn default_harness() -> Harness {
        harness(
            Arc::new(CannedContent),
            Arc::new(SilentAnnouncer),
            Arc::new(CannedBrainstorm),
            Arc::new(NoneCapture),
            Arc::new(CannedTranscriber),
        )
    }

    fn history_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(dir)
            .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_all_ai_session_completes_with_eight_speeches() {
        let h = default_harness();
        let session = h
            .orchestrator
            .run("This house would automate debates.", all_ai())
            .await
            .unwrap();

        assert_eq!(session.status, SessionStatus::Complete);
        assert_eq!(session.speech_log.len(), 8);
        assert_eq!(session.current_index, 8);
        for (i, speech) in session.speech_log.iter().enumerate() {
            assert_eq!(speech.role, Role::SPEAKING_ORDER[i]);
            assert_eq!(speech.sequence_index, i);
            assert_eq!(speech.speaker_label, "AI");
            assert!(speech.content.contains(&format!("after {i} others")));
        }
        // Each speech got its own team's notes.
        assert!(session.speech_log[0].content.contains("OG notes"));
        assert!(session.speech_log[1].content.contains("OO notes"));
        assert!(session.speech_log[4].content.contains("CG notes"));
        assert!(session.speech_log[7].content.contains("CO notes"));

        let files = history_files(&h.history_dir);
        assert_eq!(files.len(), 1);
        let record: HistoryRecord =
            serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(record.speech_log.len(), 8);
        let info = record.speaker_info.unwrap();
        assert_eq!(info.len(), 8);
        assert!(info.iter().all(|s| s.speaker == "AI"));
    }

    #[tokio::test]
    async fn test_human_turn_with_no_capture_yields_empty_speech() {
        let mut assignments = all_ai();
        assignments[1].1 = ParticipantKind::Human {
            nickname: "Alice".to_string(),
        };

        let h = default_harness();
        let session = h
            .orchestrator
            .run("This house would debate humans.", assignments)
            .await
            .unwrap();

        assert_eq!(session.status, SessionStatus::Complete);
        let human_speech = &session.speech_log[1];
        assert_eq!(human_speech.source, SpeechSource::Human);
        assert_eq!(human_speech.speaker_label, "Alice");
        assert!(human_speech.content.is_empty());

        let files = history_files(&h.history_dir);
        let record: HistoryRecord =
            serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(record.speaker_info.unwrap()[1].speaker, "Alice");
    }

    #[tokio::test]
    async fn test_transcription_failure_yields_empty_speech_and_removes_take() {
        let mut assignments = all_ai();
        assignments[2].1 = ParticipantKind::Human {
            nickname: "Bob".to_string(),
        };

        let h = harness(
            Arc::new(CannedContent),
            Arc::new(SilentAnnouncer),
            Arc::new(CannedBrainstorm),
            Arc::new(FileCapture("bpsim-failed-take-")),
            Arc::new(FailingTranscriber),
        );
        let session = h
            .orchestrator
            .run("This house would test failure paths.", assignments)
            .await
            .unwrap();

        assert_eq!(session.status, SessionStatus::Complete);
        assert!(session.speech_log[2].content.is_empty());

        let leftovers: Vec<_> = std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with("bpsim-failed-take-")
            })
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_human_transcription_success_is_recorded() {
        let mut assignments = all_ai();
        assignments[5].1 = ParticipantKind::Human {
            nickname: "Carol".to_string(),
        };

        let h = harness(
            Arc::new(CannedContent),
            Arc::new(SilentAnnouncer),
            Arc::new(CannedBrainstorm),
            Arc::new(FileCapture("bpsim-good-take-")),
            Arc::new(CannedTranscriber),
        );
        let session = h
            .orchestrator
            .run("This house would transcribe.", assignments)
            .await
            .unwrap();

        assert_eq!(
            session.speech_log[5].content,
            "a transcribed human speech"
        );
        assert_eq!(session.speech_log[5].speaker_label, "Carol");
    }

    #[tokio::test]
    async fn test_brainstorm_failure_abandons_session_without_history() {
        let h = harness(
            Arc::new(CannedContent),
            Arc::new(SilentAnnouncer),
            Arc::new(FailingBrainstorm),
            Arc::new(NoneCapture),
            Arc::new(CannedTranscriber),
        );
        let session = h
            .orchestrator
            .run("This house would fail to prepare.", all_ai())
            .await
            .unwrap();

        assert_eq!(session.status, SessionStatus::Failed);
        assert!(session.speech_log.is_empty());
        assert_eq!(session.current_index, 0);
        assert!(session.clue_set.is_none());
        assert!(history_files(&h.history_dir).is_empty());
    }

    #[tokio::test]
    async fn test_content_failure_aborts_with_error() {
        let h = harness(
            Arc::new(FailingContent),
            Arc::new(SilentAnnouncer),
            Arc::new(CannedBrainstorm),
            Arc::new(NoneCapture),
            Arc::new(CannedTranscriber),
        );
        let result = h
            .orchestrator
            .run("This house would fail mid-debate.", all_ai())
            .await;

        assert!(matches!(
            result,
            Err(DebateError::ContentGeneration { .. })
        ));
        assert!(history_files(&h.history_dir).is_empty());
    }

    #[tokio::test]
    async fn test_wrong_assignment_order_is_rejected() {
        let mut assignments = all_ai();
        assignments.swap(0, 1);

        let h = default_harness();
        let result = h
            .orchestrator
            .run("This house would order speakers.", assignments)
            .await;
        assert!(matches!(result, Err(DebateError::InvalidAssignments(_))));
    }

    #[tokio::test]
    async fn test_short_assignment_list_is_rejected() {
        let mut assignments = all_ai();
        assignments.pop();

        let h = default_harness();
        let result = h
            .orchestrator
            .run("This house would seat eight.", assignments)
            .await;
        assert!(matches!(result, Err(DebateError::InvalidAssignments(_))));
    }

    #[tokio::test]
    async fn test_failing_announcer_does_not_stop_session() {
        let h = harness(
            Arc::new(CannedContent),
            Arc::new(FailingAnnouncer),
            Arc::new(CannedBrainstorm),
            Arc::new(NoneCapture),
            Arc::new(CannedTranscriber),
        );
        let session = h
            .orchestrator
            .run("This house would debate in silence.", all_ai())
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Complete);
        assert_eq!(session.speech_log.len(), 8);
    }

    #[test]
    fn test_sanitize_speech_strips_reasoning_tags() {
        let input = "<thinking>Let me plan the speech...</thinking>Honourable members, we win.";
        assert_eq!(sanitize_speech(input), "Honourable members, we win.");
    }

    #[test]
    fn test_sanitize_speech_strips_markdown_and_orphan_tags() {
        let input = "We *must* act.</think> Now.";
        assert_eq!(sanitize_speech(input), "We must act. Now.");
    }

    #[test]
    fn test_sanitize_speech_collapses_whitespace() {
        let input = "First point.\n\n\nSecond   point.";
        assert_eq!(sanitize_speech(input), "First point. Second point.");
    }
}
