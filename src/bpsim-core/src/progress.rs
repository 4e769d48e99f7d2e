//! Retrospective analysis over stored session records.

use crate::error::DebateError;
use crate::history::{HistoryStore, StoredRecord};
use crate::role::Role;

use serde::Serialize;

/// Speeches shorter than this are flagged as underdeveloped.
const MIN_DEVELOPED_SPEECH_CHARS: usize = 500;

const FILLER_TOKENS: [&str; 2] = ["um", "uh"];

#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub total_sessions: usize,
    pub recent_motions: Vec<String>,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_analysis: Option<RoleAnalysis>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleAnalysis {
    pub role: String,
    pub sessions_participated: usize,
    pub recent_motions: Vec<String>,
    pub improvement_areas: Vec<String>,
}

pub struct ProgressAnalyzer<'a> {
    store: &'a HistoryStore,
}

impl<'a> ProgressAnalyzer<'a> {
    pub fn new(store: &'a HistoryStore) -> Self {
        Self { store }
    }

    pub fn analyze(&self, role: Option<Role>) -> Result<ProgressReport, DebateError> {
        let records = self.store.list(None)?;
        let total_sessions = records.len();

        let recent_motions: Vec<String> = records
            .iter()
            .take(3)
            .map(|r| r.record.motion.clone())
            .collect();

        let role_analysis = role.map(|role| analyze_role(&records, role));
        let recommendation = recommendation(total_sessions, role);

        Ok(ProgressReport {
            total_sessions,
            recent_motions,
            recommendation,
            role_analysis,
        })
    }
}

fn analyze_role(records: &[StoredRecord], role: Role) -> RoleAnalysis {
    let mut sessions_participated = 0;
    let mut recent_motions = Vec::new();
    let mut speeches = Vec::new();

    for stored in records {
        // Speeches are stored in speaking order, so a role's speech sits at
        // its fixed speaking index. A reordered or truncated log would be
        // silently misattributed here.
        if let Some(speech) = stored.record.speech_log.get(role.index()) {
            sessions_participated += 1;
            if recent_motions.len() < 3 {
                recent_motions.push(stored.record.motion.clone());
            }
            speeches.push(speech.as_str());
        }
    }

    RoleAnalysis {
        role: role.display_name().to_string(),
        sessions_participated,
        recent_motions,
        improvement_areas: improvement_areas(&speeches),
    }
}

fn improvement_areas(speeches: &[&str]) -> Vec<String> {
    let mut areas = Vec::new();

    if speeches.iter().any(|s| s.len() < MIN_DEVELOPED_SPEECH_CHARS) {
        areas.push("Speech development - some speeches appear too short".to_string());
    }

    if speeches.iter().any(|s| contains_filler(s)) {
        areas.push("Reduce filler words (um, uh)".to_string());
    }

    if areas.is_empty() {
        areas.push("Continue practicing structured arguments".to_string());
        areas.push("Work on rebuttal techniques".to_string());
    }

    areas
}

// Matches whole tokens only; words like "assumption" must not trigger.
fn contains_filler(speech: &str) -> bool {
    speech.split_whitespace().any(|word| {
        let token = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        FILLER_TOKENS.contains(&token.as_str())
    })
}

fn recommendation(total_sessions: usize, role: Option<Role>) -> String {
    match total_sessions {
        0 => "Complete your first debate to begin tracking progress".to_string(),
        1 => "Great start! Try debating the same motion from different positions".to_string(),
        2..=4 => {
            "Building experience - focus on structured arguments and evidence use".to_string()
        }
        _ => match role {
            Some(role) => {
                let name = role.display_name();
                if name.contains("Prime Minister") || name.contains("Leader") {
                    "As an opening speaker, work on setting strong frameworks".to_string()
                } else if name.contains("Whip") {
                    "As a closing speaker, practice effective summarization techniques"
                        .to_string()
                } else {
                    "Develop stronger rebuttal skills and engage more with opposing arguments"
                        .to_string()
                }
            }
            None => "Consider analyzing specific speeches to identify patterns and areas \
                     for improvement"
                .to_string(),
        },
    }
}
