//! REST client for the Luma video-generation API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapter::{
    error_from_response, GenerationRequest, Provider, ProviderError, ProviderId, ProviderJobState,
    ProviderJobStatus, Submission, WebhookNotice,
};

/// HTTP client for the Luma video service.
pub struct LumaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

// ---- wire schemas ----

/// Starting keyframe: the completed still the video is animated from.
#[derive(Debug, Serialize)]
struct Keyframe<'a> {
    r#type: &'static str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct Keyframes<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    frame0: Option<Keyframe<'a>>,
}

/// Body for `POST /dream-machine/v1/generations`.
#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    keyframes: Keyframes<'a>,
}

#[derive(Debug, Deserialize)]
struct Assets {
    video: Option<String>,
}

/// Generation resource returned by submission, status lookup, and the
/// webhook payload.
#[derive(Debug, Deserialize)]
struct GenerationResource {
    id: String,
    state: String,
    assets: Option<Assets>,
    failure_reason: Option<String>,
}

impl LumaClient {
    /// Create a client for the Luma API.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl Provider for LumaClient {
    fn id(&self) -> ProviderId {
        ProviderId::Luma
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        let body = SubmitBody {
            prompt: &request.prompt,
            aspect_ratio: request.aspect_ratio.as_deref(),
            model: request.model.as_deref(),
            keyframes: Keyframes {
                frame0: request.reference_url.as_deref().map(|url| Keyframe {
                    r#type: "image",
                    url,
                }),
            },
        };

        let response = self
            .client
            .post(format!("{}/dream-machine/v1/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: GenerationResource = response.json().await?;
        tracing::debug!(request_id = %parsed.id, "Luma generation queued");
        Ok(Submission {
            external_request_id: parsed.id,
        })
    }

    async fn fetch_status(
        &self,
        external_request_id: &str,
    ) -> Result<ProviderJobStatus, ProviderError> {
        let response = self
            .client
            .get(format!(
                "{}/dream-machine/v1/generations/{external_request_id}",
                self.base_url
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: GenerationResource = response.json().await?;
        map_status(&parsed)
            .map_err(|msg| ProviderError::Unavailable(format!("unexpected status payload: {msg}")))
    }
}

/// Map the Luma state vocabulary onto the shared enum.
fn map_state(state: &str) -> Option<ProviderJobState> {
    match state {
        "queued" => Some(ProviderJobState::Queued),
        "dreaming" => Some(ProviderJobState::Generating),
        "completed" => Some(ProviderJobState::Completed),
        "failed" => Some(ProviderJobState::Failed),
        _ => None,
    }
}

fn map_status(parsed: &GenerationResource) -> Result<ProviderJobStatus, String> {
    let state =
        map_state(&parsed.state).ok_or_else(|| format!("unknown Luma state '{}'", parsed.state))?;
    Ok(ProviderJobStatus {
        state,
        result_ref: parsed.assets.as_ref().and_then(|a| a.video.clone()),
        failure_reason: parsed.failure_reason.clone(),
    })
}

/// Parse an inbound Luma webhook body into a normalized notice.
pub fn parse_webhook(body: &serde_json::Value) -> Result<WebhookNotice, ProviderError> {
    let parsed: GenerationResource = serde_json::from_value(body.clone())
        .map_err(|e| ProviderError::Malformed(format!("Luma webhook: {e}")))?;
    let status = map_status(&parsed).map_err(ProviderError::Malformed)?;
    Ok(WebhookNotice {
        external_request_id: parsed.id,
        status,
    })
}
