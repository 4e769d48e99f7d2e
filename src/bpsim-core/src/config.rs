//! Configuration module for loading TOML config files.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DebateError;
use crate::role::{ParticipantKind, Role};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub chair: ChairConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Role display name to "AI" or "Human". Unlisted roles default to AI.
    #[serde(default)]
    pub party: BTreeMap<String, String>,
    /// Role display name to the nickname shown for a human speaker.
    #[serde(default)]
    pub nicknames: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_dir: default_history_dir(),
            sample_rate: default_sample_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChairConfig {
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_voice")]
    pub voice: String,
}

impl Default for ChairConfig {
    fn default() -> Self {
        Self {
            tone: default_tone(),
            voice: default_voice(),
        }
    }
}

/// One endpoint per concern, so a local model can serve chat while the
/// hosted API keeps handling audio.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "EndpointConfig::default_content")]
    pub content: EndpointConfig,
    #[serde(default = "EndpointConfig::default_brainstorm")]
    pub brainstorm: EndpointConfig,
    #[serde(default = "EndpointConfig::default_tts")]
    pub tts: EndpointConfig,
    #[serde(default = "EndpointConfig::default_stt")]
    pub stt: EndpointConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            content: EndpointConfig::default_content(),
            brainstorm: EndpointConfig::default_brainstorm(),
            tts: EndpointConfig::default_tts(),
            stt: EndpointConfig::default_stt(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    pub model: String,
}

impl EndpointConfig {
    fn with_model(model: &str) -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            model: model.to_string(),
        }
    }

    fn default_content() -> Self {
        Self::with_model("o1-mini")
    }

    fn default_brainstorm() -> Self {
        Self::with_model("o1-mini")
    }

    fn default_tts() -> Self {
        Self::with_model("gpt-4o-mini-tts")
    }

    fn default_stt() -> Self {
        Self::with_model("gpt-4o-mini-transcribe")
    }

    /// Resolves the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, DebateError> {
        env::var(&self.api_key_env).map_err(|_| {
            DebateError::Config(format!(
                "environment variable {} is not set",
                self.api_key_env
            ))
        })
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::default_content()
    }
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("debate_history")
}

fn default_sample_rate() -> u32 {
    16_000
}

fn default_tone() -> String {
    "Formal, measured and ceremonial, like the chairperson of a parliamentary debate."
        .to_string()
}

fn default_voice() -> String {
    "coral".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DebateError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DebateError::Config(format!("Failed to read config: {}", e)))?;
        Self::from_str(&content)
    }

    /// Load configuration from string content.
    pub fn from_str(content: &str) -> Result<Self, DebateError> {
        toml::from_str(content)
            .map_err(|e| DebateError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Resolves the `[party]` table into the full eight-seat assignment, in
    /// speaking order. Roles absent from the table are assigned to AI.
    pub fn role_assignments(&self) -> Result<Vec<(Role, ParticipantKind)>, DebateError> {
        for name in self.party.keys().chain(self.nicknames.keys()) {
            if Role::from_name(name).is_none() {
                return Err(DebateError::Config(format!("unknown role: {name}")));
            }
        }

        Role::SPEAKING_ORDER
            .iter()
            .map(|&role| {
                let kind = match self.party.get(role.display_name()).map(String::as_str) {
                    None => ParticipantKind::Ai,
                    Some(s) if s.eq_ignore_ascii_case("ai") => ParticipantKind::Ai,
                    Some(s) if s.eq_ignore_ascii_case("human") => {
                        let nickname = self
                            .nicknames
                            .get(role.display_name())
                            .cloned()
                            .unwrap_or_else(|| "Human".to_string());
                        ParticipantKind::Human { nickname }
                    }
                    Some(other) => {
                        return Err(DebateError::Config(format!(
                            "participant for {} must be \"AI\" or \"Human\", got {other:?}",
                            role.display_name()
                        )));
                    }
                };
                Ok((role, kind))
            })
            .collect()
    }
}

/// Default configuration embedded in the binary.
pub fn default_config() -> Config {
    Config::default()
}
