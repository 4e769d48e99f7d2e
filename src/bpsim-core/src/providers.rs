//! Collaborator interfaces consumed by the session orchestrator.
//!
//! Content generation, speech synthesis, transcription, and team
//! brainstorming are external services; the orchestrator only depends on
//! these traits. `openai` provides API-backed implementations.

use crate::error::DebateError;
use crate::role::{Role, Team};

use async_trait::async_trait;
use std::path::Path;

/// Produces the full speech text for one AI-driven turn.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        motion: &str,
        role: Role,
        prior_speeches: &[String],
        clue: &str,
    ) -> Result<String, DebateError>;
}

/// Speech synthesis with audible playback as a side effect.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn speak(&self, tone: &str, text: &str) -> Result<(), DebateError>;
}

/// Speech-to-text over a recorded audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, DebateError>;
}

/// Prep-time analysis for one team.
#[async_trait]
pub trait BrainstormProvider: Send + Sync {
    async fn brainstorm(&self, motion: &str, team: Team) -> Result<String, DebateError>;
}
