//! Server-side trigger calls.
//!
//! [`GenerationTrigger`] is the seam between the editor and the backend's
//! trigger endpoints; [`HttpTrigger`] is the real implementation, tests
//! substitute fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storyreel_core::target::GenerationTarget;
use storyreel_core::types::DbId;
use storyreel_db::models::status::StatusId;

/// Pass-through options for the trigger request body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TriggerOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// The accepted job, as returned by a trigger endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggeredJob {
    pub id: DbId,
    pub external_request_id: Option<String>,
    pub status_id: StatusId,
}

/// Errors surfaced to the editor when a trigger fails.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// The server refused the trigger (missing precondition, validation,
    /// auth). Carries the server's message for the UI.
    #[error("Generation request refused ({status}): {message}")]
    Refused { status: u16, message: String },

    /// The request never completed.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server's response did not match the expected envelope.
    #[error("Unexpected response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for TriggerError {
    fn from(err: reqwest::Error) -> Self {
        TriggerError::Transport(err.to_string())
    }
}

/// One call into the backend to start a generation.
#[async_trait]
pub trait GenerationTrigger: Send + Sync {
    async fn trigger(
        &self,
        target: GenerationTarget,
        options: &TriggerOptions,
    ) -> Result<TriggeredJob, TriggerError>;
}

/// Success envelope used by the backend API.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Error envelope used by the backend API.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// HTTP implementation against the backend's trigger endpoints.
pub struct HttpTrigger {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpTrigger {
    pub fn new(base_url: String, api_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_token,
        }
    }

    fn path_for(target: GenerationTarget) -> String {
        match target {
            GenerationTarget::ShotImage(id) => format!("/api/shots/{id}/generate-image"),
            GenerationTarget::ShotVideo(id) => format!("/api/shots/{id}/generate-video"),
            GenerationTarget::CharacterPortrait(id) => {
                format!("/api/characters/{id}/generate-portrait")
            }
            GenerationTarget::SceneDescription(id) => {
                format!("/api/scenes/{id}/generate-description")
            }
        }
    }
}

#[async_trait]
impl GenerationTrigger for HttpTrigger {
    async fn trigger(
        &self,
        target: GenerationTarget,
        options: &TriggerOptions,
    ) -> Result<TriggeredJob, TriggerError> {
        let url = format!("{}{}", self.base_url, Self::path_for(target));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(options)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(TriggerError::Refused {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: DataEnvelope<TriggeredJob> = response
            .json()
            .await
            .map_err(|e| TriggerError::Malformed(e.to_string()))?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_paths_match_the_api_routes() {
        assert_eq!(
            HttpTrigger::path_for(GenerationTarget::ShotImage(5)),
            "/api/shots/5/generate-image",
        );
        assert_eq!(
            HttpTrigger::path_for(GenerationTarget::ShotVideo(5)),
            "/api/shots/5/generate-video",
        );
        assert_eq!(
            HttpTrigger::path_for(GenerationTarget::CharacterPortrait(2)),
            "/api/characters/2/generate-portrait",
        );
        assert_eq!(
            HttpTrigger::path_for(GenerationTarget::SceneDescription(3)),
            "/api/scenes/3/generate-description",
        );
    }
}
