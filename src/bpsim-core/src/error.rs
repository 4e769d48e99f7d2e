//! Error types for the debate system.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebateError {
    #[error("invalid role assignments: {0}")]
    InvalidAssignments(String),

    #[error("audio device failure: {0}")]
    Device(String),

    #[error("audio processing failure: {0}")]
    Processing(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("announcement failed: {0}")]
    Announcement(String),

    #[error("brainstorm failed for {team}: {message}")]
    Brainstorm { team: String, message: String },

    #[error("content generation failed for {role}: {message}")]
    ContentGeneration { role: String, message: String },

    #[error("failed to persist session history: {0}")]
    Persist(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("OpenAI API error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
