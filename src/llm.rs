//! Text-completion backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::StoryError;

/// Something that turns an instruction into free text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the completion for `prompt`, trimmed of surrounding whitespace.
    async fn complete(&self, prompt: &str) -> Result<String, StoryError>;
}

/// Talks to an Ollama server's `/api/generate` endpoint.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaClient {
    /// Builds a client, `timeout` of `None` waits on the server forever.
    pub fn new(base_url: &Url, model: &str, timeout: Option<Duration>) -> Result<Self, StoryError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| StoryError::InternalServerError(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.as_str().trim_end_matches('/')),
            model: model.to_string(),
        })
    }

    /// The model completions are requested from
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, StoryError> {
        debug!(model = %self.model, chars = prompt.len(), "Requesting completion");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|err| StoryError::TextGeneration(format!("request to Ollama failed: {err}")))?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|err| {
            StoryError::TextGeneration(format!("failed reading Ollama response: {err}"))
        })?;
        if !status.is_success() {
            return Err(StoryError::TextGeneration(format!(
                "Ollama returned {status}: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }

        let parsed: GenerateResponse = serde_json::from_slice(&bytes).map_err(|err| {
            StoryError::TextGeneration(format!("failed to parse Ollama response: {err}"))
        })?;
        if let Some(err) = parsed.error {
            return Err(StoryError::TextGeneration(format!("Ollama error: {err}")));
        }
        let text = parsed
            .response
            .ok_or_else(|| StoryError::TextGeneration("Ollama response had no text".to_string()))?;
        debug!(chars = text.len(), "Completion received");
        Ok(text.trim().to_string())
    }
}
