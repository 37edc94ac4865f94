//! REST client for the Flux image-generation API.
//!
//! Wraps the queue-style HTTP API (submit, status lookup) using
//! [`reqwest`], with explicit request/response schemas validated at this
//! boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapter::{
    error_from_response, GenerationRequest, Provider, ProviderError, ProviderId, ProviderJobState,
    ProviderJobStatus, Submission, WebhookNotice,
};

/// HTTP client for the Flux image service.
pub struct FluxClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

// ---- wire schemas ----

/// Body for `POST /v1/generate`.
#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// Response from `POST /v1/generate` after the request is queued.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
}

/// A produced image entry inside a status/webhook payload.
#[derive(Debug, Deserialize)]
struct ImageEntry {
    url: String,
}

/// Response from `GET /v1/requests/{id}` and the webhook payload body.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    request_id: Option<String>,
    status: String,
    #[serde(default)]
    images: Vec<ImageEntry>,
    error: Option<String>,
}

impl FluxClient {
    /// Create a client for the Flux API.
    ///
    /// * `base_url` - e.g. `https://queue.flux.dev`.
    /// * `api_key`  - bearer token for the `Authorization` header.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl Provider for FluxClient {
    fn id(&self) -> ProviderId {
        ProviderId::Flux
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        let body = SubmitBody {
            prompt: &request.prompt,
            image_url: request.reference_url.as_deref(),
            aspect_ratio: request.aspect_ratio.as_deref(),
            model: request.model.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/v1/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: SubmitResponse = response.json().await?;
        tracing::debug!(request_id = %parsed.request_id, "Flux request queued");
        Ok(Submission {
            external_request_id: parsed.request_id,
        })
    }

    async fn fetch_status(
        &self,
        external_request_id: &str,
    ) -> Result<ProviderJobStatus, ProviderError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/requests/{external_request_id}",
                self.base_url
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: StatusResponse = response.json().await?;
        map_status(&parsed)
            .map_err(|msg| ProviderError::Unavailable(format!("unexpected status payload: {msg}")))
    }
}

/// Map the Flux status vocabulary onto the shared enum.
fn map_state(status: &str) -> Option<ProviderJobState> {
    match status {
        "IN_QUEUE" => Some(ProviderJobState::Queued),
        "IN_PROGRESS" => Some(ProviderJobState::Generating),
        "COMPLETED" => Some(ProviderJobState::Completed),
        "FAILED" => Some(ProviderJobState::Failed),
        _ => None,
    }
}

/// Normalize a status payload. Errors with a description when the
/// vocabulary is unknown.
fn map_status(parsed: &StatusResponse) -> Result<ProviderJobStatus, String> {
    let state = map_state(&parsed.status)
        .ok_or_else(|| format!("unknown Flux status '{}'", parsed.status))?;
    Ok(ProviderJobStatus {
        state,
        result_ref: parsed.images.first().map(|i| i.url.clone()),
        failure_reason: parsed.error.clone(),
    })
}

/// Parse an inbound Flux webhook body into a normalized notice.
pub fn parse_webhook(body: &serde_json::Value) -> Result<WebhookNotice, ProviderError> {
    let parsed: StatusResponse = serde_json::from_value(body.clone())
        .map_err(|e| ProviderError::Malformed(format!("Flux webhook: {e}")))?;
    let external_request_id = parsed
        .request_id
        .clone()
        .ok_or_else(|| ProviderError::Malformed("Flux webhook: missing request_id".into()))?;
    let status = map_status(&parsed).map_err(ProviderError::Malformed)?;
    Ok(WebhookNotice {
        external_request_id,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_the_full_status_vocabulary() {
        assert_eq!(map_state("IN_QUEUE"), Some(ProviderJobState::Queued));
        assert_eq!(map_state("IN_PROGRESS"), Some(ProviderJobState::Generating));
        assert_eq!(map_state("COMPLETED"), Some(ProviderJobState::Completed));
        assert_eq!(map_state("FAILED"), Some(ProviderJobState::Failed));
        assert_eq!(map_state("PAUSED"), None);
    }

    #[test]
    fn parses_a_completed_webhook() {
        let body = serde_json::json!({
            "request_id": "abc123",
            "status": "COMPLETED",
            "images": [{"url": "https://cdn/x.png"}],
        });
        let notice = parse_webhook(&body).unwrap();
        assert_eq!(notice.external_request_id, "abc123");
        assert_eq!(notice.status.state, ProviderJobState::Completed);
        assert_eq!(notice.status.result_ref.as_deref(), Some("https://cdn/x.png"));
    }

    #[test]
    fn parses_a_failed_webhook() {
        let body = serde_json::json!({
            "request_id": "abc123",
            "status": "FAILED",
            "error": "nsfw content detected",
        });
        let notice = parse_webhook(&body).unwrap();
        assert_eq!(notice.status.state, ProviderJobState::Failed);
        assert_eq!(
            notice.status.failure_reason.as_deref(),
            Some("nsfw content detected"),
        );
    }

    #[test]
    fn webhook_without_request_id_is_malformed() {
        let body = serde_json::json!({"status": "COMPLETED"});
        assert!(matches!(
            parse_webhook(&body),
            Err(ProviderError::Malformed(_)),
        ));
    }
}
