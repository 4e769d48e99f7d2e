//! BPSim Core Library
//!
//! Provides British Parliamentary debate session orchestration: role and
//! team definitions, prep-time brainstorming, speech generation, microphone
//! capture and transcription for human speakers, the chairperson, session
//! history and progress analysis.

pub mod audio;
pub mod brainstorm;
pub mod capture;
pub mod chair;
pub mod config;
pub mod error;
pub mod history;
pub mod openai;
pub mod orchestrator;
pub mod progress;
pub mod prompts;
pub mod providers;
pub mod role;

pub use brainstorm::{BrainstormCoordinator, ClueSet};
pub use capture::{AudioCaptureController, CapturedAudio, CpalInput, StdinGate};
pub use chair::Chair;
pub use config::{Config, default_config};
pub use error::DebateError;
pub use history::{HistoryRecord, HistoryStore, SpeakerInfo};
pub use openai::{
    ApiEndpoint, OpenAiAnnouncer, OpenAiBrainstormProvider, OpenAiContentGenerator,
    OpenAiTranscriber,
};
pub use orchestrator::{Session, SessionOrchestrator, SessionStatus, Speech, SpeechSource};
pub use progress::{ProgressAnalyzer, ProgressReport, RoleAnalysis};
pub use providers::{Announcer, BrainstormProvider, ContentGenerator, Transcriber};
pub use role::{ParticipantKind, Role, Team};
