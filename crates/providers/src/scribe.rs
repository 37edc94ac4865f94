//! REST client for the Scribe text-generation job API.
//!
//! Unlike the media providers, the terminal result is the generated text
//! itself rather than an asset URL; it rides in `result_ref` unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapter::{
    error_from_response, GenerationRequest, Provider, ProviderError, ProviderId, ProviderJobState,
    ProviderJobStatus, Submission, WebhookNotice,
};

/// HTTP client for the Scribe text service.
pub struct ScribeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

// ---- wire schemas ----

/// Body for `POST /v1/jobs`.
#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// Job resource returned by submission, status lookup, and the webhook
/// payload.
#[derive(Debug, Deserialize)]
struct JobResource {
    job_id: String,
    status: String,
    output: Option<String>,
    error: Option<String>,
}

impl ScribeClient {
    /// Create a client for the Scribe API.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl Provider for ScribeClient {
    fn id(&self) -> ProviderId {
        ProviderId::Scribe
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        let body = SubmitBody {
            prompt: &request.prompt,
            model: request.model.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/v1/jobs", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: JobResource = response.json().await?;
        tracing::debug!(job_id = %parsed.job_id, "Scribe job queued");
        Ok(Submission {
            external_request_id: parsed.job_id,
        })
    }

    async fn fetch_status(
        &self,
        external_request_id: &str,
    ) -> Result<ProviderJobStatus, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/jobs/{external_request_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: JobResource = response.json().await?;
        map_status(&parsed)
            .map_err(|msg| ProviderError::Unavailable(format!("unexpected status payload: {msg}")))
    }
}

/// Map the Scribe status vocabulary onto the shared enum.
fn map_state(status: &str) -> Option<ProviderJobState> {
    match status {
        "pending" => Some(ProviderJobState::Queued),
        "running" => Some(ProviderJobState::Generating),
        "succeeded" => Some(ProviderJobState::Completed),
        "errored" => Some(ProviderJobState::Failed),
        _ => None,
    }
}

fn map_status(parsed: &JobResource) -> Result<ProviderJobStatus, String> {
    let state = map_state(&parsed.status)
        .ok_or_else(|| format!("unknown Scribe status '{}'", parsed.status))?;
    Ok(ProviderJobStatus {
        state,
        result_ref: parsed.output.clone(),
        failure_reason: parsed.error.clone(),
    })
}

/// Parse an inbound Scribe webhook body into a normalized notice.
pub fn parse_webhook(body: &serde_json::Value) -> Result<WebhookNotice, ProviderError> {
    let parsed: JobResource = serde_json::from_value(body.clone())
        .map_err(|e| ProviderError::Malformed(format!("Scribe webhook: {e}")))?;
    let status = map_status(&parsed).map_err(ProviderError::Malformed)?;
    Ok(WebhookNotice {
        external_request_id: parsed.job_id,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_the_full_status_vocabulary() {
        assert_eq!(map_state("pending"), Some(ProviderJobState::Queued));
        assert_eq!(map_state("running"), Some(ProviderJobState::Generating));
        assert_eq!(map_state("succeeded"), Some(ProviderJobState::Completed));
        assert_eq!(map_state("errored"), Some(ProviderJobState::Failed));
        assert_eq!(map_state("cancelled"), None);
    }

    #[test]
    fn completed_webhook_carries_the_text_inline() {
        let body = serde_json::json!({
            "job_id": "scribe-7",
            "status": "succeeded",
            "output": "A lone cyclist crosses the dunes at dawn.",
        });
        let notice = parse_webhook(&body).unwrap();
        assert_eq!(notice.external_request_id, "scribe-7");
        assert_eq!(notice.status.state, ProviderJobState::Completed);
        assert_eq!(
            notice.status.result_ref.as_deref(),
            Some("A lone cyclist crosses the dunes at dawn."),
        );
    }

    #[test]
    fn errored_webhook_carries_the_reason() {
        let body = serde_json::json!({
            "job_id": "scribe-7",
            "status": "errored",
            "error": "context length exceeded",
        });
        let notice = parse_webhook(&body).unwrap();
        assert_eq!(notice.status.state, ProviderJobState::Failed);
        assert_eq!(
            notice.status.failure_reason.as_deref(),
            Some("context length exceeded"),
        );
    }
}
