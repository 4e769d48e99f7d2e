//! OpenAI-compatible provider adapters for chat, speech and transcription.

use crate::audio::{downmix_mono, play_samples};
use crate::error::DebateError;
use crate::prompts::{brainstorm_prompt, speech_prompt};
use crate::providers::{Announcer, BrainstormProvider, ContentGenerator, Transcriber};
use crate::role::{Role, Team};

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde_json::json;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// One OpenAI-compatible endpoint plus the model served there.
#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

impl ApiEndpoint {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

fn http_client() -> Result<reqwest::Client, DebateError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| DebateError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Sends a single-user-message chat completion.
/// Retries transient failures with exponential backoff.
async fn chat_completion(endpoint: &ApiEndpoint, prompt: &str) -> Result<String, DebateError> {
    let config = OpenAIConfig::new()
        .with_api_key(&endpoint.api_key)
        .with_api_base(&endpoint.api_base);
    let client = Client::with_config(config).with_http_client(http_client()?);

    let request = CreateChatCompletionRequestArgs::default()
        .model(&endpoint.model)
        .messages(vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage {
                content: prompt.into(),
                name: None,
            },
        )])
        .build()?;

    let max_retries = 3;
    let mut last_error = None;

    for attempt in 0..max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s
            let delay = Duration::from_secs(1 << attempt);
            tokio::time::sleep(delay).await;
        }

        match client.chat().create(request.clone()).await {
            Ok(response) => {
                let content = response
                    .choices
                    .first()
                    .and_then(|c| c.message.content.clone())
                    .unwrap_or_default();
                return Ok(content);
            }
            Err(e) => {
                debug!("chat completion attempt {} failed: {e}", attempt + 1);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.map(DebateError::from).unwrap_or_else(|| {
        DebateError::Config("Unknown API error after retries".to_string())
    }))
}

/// Generates speeches for AI-held roles.
pub struct OpenAiContentGenerator {
    endpoint: ApiEndpoint,
}

impl OpenAiContentGenerator {
    pub fn new(endpoint: ApiEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl ContentGenerator for OpenAiContentGenerator {
    async fn generate(
        &self,
        motion: &str,
        role: Role,
        prior_speeches: &[String],
        clue: &str,
    ) -> Result<String, DebateError> {
        let prompt = speech_prompt(motion, role, prior_speeches, clue);
        let content = chat_completion(&self.endpoint, &prompt).await.map_err(|e| {
            DebateError::ContentGeneration {
                role: role.display_name().to_string(),
                message: e.to_string(),
            }
        })?;

        if content.trim().is_empty() {
            return Err(DebateError::ContentGeneration {
                role: role.display_name().to_string(),
                message: "model returned an empty speech".to_string(),
            });
        }
        Ok(content)
    }
}

/// Produces per-team strategy briefs during prep time.
pub struct OpenAiBrainstormProvider {
    endpoint: ApiEndpoint,
}

impl OpenAiBrainstormProvider {
    pub fn new(endpoint: ApiEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl BrainstormProvider for OpenAiBrainstormProvider {
    async fn brainstorm(&self, motion: &str, team: Team) -> Result<String, DebateError> {
        let prompt = brainstorm_prompt(motion, team);
        chat_completion(&self.endpoint, &prompt)
            .await
            .map_err(|e| DebateError::Brainstorm {
                team: team.display_name().to_string(),
                message: e.to_string(),
            })
    }
}

/// Speaks announcements through the speech endpoint and the default output
/// device. The audio endpoints are not covered by the chat client, so these
/// requests go straight through reqwest.
pub struct OpenAiAnnouncer {
    endpoint: ApiEndpoint,
    voice: String,
    http: reqwest::Client,
}

impl OpenAiAnnouncer {
    pub fn new(endpoint: ApiEndpoint, voice: impl Into<String>) -> Result<Self, DebateError> {
        Ok(Self {
            endpoint,
            voice: voice.into(),
            http: http_client()?,
        })
    }
}

#[async_trait]
impl Announcer for OpenAiAnnouncer {
    async fn speak(&self, tone: &str, text: &str) -> Result<(), DebateError> {
        let url = format!("{}/audio/speech", self.endpoint.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&json!({
                "model": self.endpoint.model,
                "voice": self.voice,
                "input": text,
                "instructions": tone,
                "response_format": "wav",
            }))
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        let (samples, sample_rate) = decode_wav(&bytes)?;

        tokio::task::spawn_blocking(move || play_samples(samples, sample_rate))
            .await
            .map_err(|e| DebateError::Announcement(format!("playback task failed: {e}")))??;
        Ok(())
    }
}

fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32), DebateError> {
    let reader = hound::WavReader::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| DebateError::Announcement(format!("invalid WAV payload: {e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .into_samples::<i16>()
            .filter_map(|s| s.ok())
            .map(|s| s as f32 / i16::MAX as f32)
            .collect(),
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .filter_map(|s| s.ok())
            .collect(),
    };

    Ok((downmix_mono(&samples, spec.channels), spec.sample_rate))
}

/// Turns captured WAV takes into text through the transcription endpoint.
pub struct OpenAiTranscriber {
    endpoint: ApiEndpoint,
    http: reqwest::Client,
}

impl OpenAiTranscriber {
    pub fn new(endpoint: ApiEndpoint) -> Result<Self, DebateError> {
        Ok(Self {
            endpoint,
            http: http_client()?,
        })
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, DebateError> {
        let bytes = tokio::fs::read(audio_path).await.map_err(|e| {
            DebateError::Transcription(format!("cannot read {}: {e}", audio_path.display()))
        })?;

        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("speech.wav")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| DebateError::Transcription(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.endpoint.model.clone())
            .text("response_format", "text");

        let url = format!("{}/audio/transcriptions", self.endpoint.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        let text = text.trim().to_string();
        if text.is_empty() {
            warn!("transcription returned no text for {}", audio_path.display());
        }
        Ok(text)
    }
}
