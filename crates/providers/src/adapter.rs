//! The uniform submit/poll contract every provider adapter implements.

use async_trait::async_trait;
use storyreel_core::error::CoreError;

// ---------------------------------------------------------------------------
// Provider identity
// ---------------------------------------------------------------------------

/// The backing services. One per generation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderId {
    /// Image generation.
    Flux,
    /// Video generation.
    Luma,
    /// Text generation.
    Scribe,
}

impl ProviderId {
    /// Stable slug stored in `generations.provider` and used as the
    /// webhook path segment.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Flux => "flux",
            ProviderId::Luma => "luma",
            ProviderId::Scribe => "scribe",
        }
    }

    /// Parse a webhook path segment back into the enum.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "flux" => Ok(ProviderId::Flux),
            "luma" => Ok(ProviderId::Luma),
            "scribe" => Ok(ProviderId::Scribe),
            other => Err(CoreError::Validation(format!("Unknown provider '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// What the pipeline asks a provider to produce.
///
/// `aspect_ratio` and `model` are passed through opaquely; adapters must
/// not reinterpret them.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Upstream asset for derived generations (e.g. the completed image a
    /// video is animated from).
    pub reference_url: Option<String>,
    pub aspect_ratio: Option<String>,
    pub model: Option<String>,
}

/// Returned by a successful submission.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Identifier assigned by the external provider; all later status
    /// lookups and webhook notices reference this.
    pub external_request_id: String,
}

/// Provider-reported progress, normalized across services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderJobState {
    Queued,
    Generating,
    Completed,
    Failed,
}

impl ProviderJobState {
    /// Whether the provider considers the job finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProviderJobState::Completed | ProviderJobState::Failed)
    }
}

/// A normalized status snapshot for one external request.
#[derive(Debug, Clone)]
pub struct ProviderJobStatus {
    pub state: ProviderJobState,
    /// Asset reference on completion: a URL for media providers, the
    /// generated text itself for the text provider.
    pub result_ref: Option<String>,
    pub failure_reason: Option<String>,
}

/// A parsed out-of-band completion notice delivered to the webhook
/// receiver.
#[derive(Debug, Clone)]
pub struct WebhookNotice {
    pub external_request_id: String,
    pub status: ProviderJobStatus,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the provider adapter layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider refused the request (auth failure, malformed payload,
    /// rate limiting). The caller must not retry the same payload
    /// unchanged.
    #[error("Provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Transient network or provider-side error. The caller may retry
    /// with backoff.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider sent a payload the adapter's schema does not accept.
    #[error("Malformed provider payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // Transport-level failures (DNS, TLS, connect, body read) are
        // always retryable.
        ProviderError::Unavailable(err.to_string())
    }
}

/// Classify a non-success HTTP response: 4xx means the provider rejected
/// the request, everything else is treated as transient.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    tracing::warn!(status = status.as_u16(), body = %body, "provider returned an error response");
    if status.is_client_error() {
        ProviderError::Rejected {
            status: status.as_u16(),
            message: body,
        }
    } else {
        ProviderError::Unavailable(format!("HTTP {status}: {body}"))
    }
}

// ---------------------------------------------------------------------------
// The adapter trait
// ---------------------------------------------------------------------------

/// Uniform submit/poll contract over one external generation API.
///
/// Implementations perform exactly one outbound HTTP call per method and
/// have no other side effects.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Which backing service this adapter talks to.
    fn id(&self) -> ProviderId;

    /// Submit a generation request. Returns the provider-assigned request
    /// id on acceptance.
    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError>;

    /// Fetch the current status of a previously submitted request.
    async fn fetch_status(
        &self,
        external_request_id: &str,
    ) -> Result<ProviderJobStatus, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_round_trips() {
        for id in [ProviderId::Flux, ProviderId::Luma, ProviderId::Scribe] {
            assert_eq!(ProviderId::parse(id.as_str()).unwrap(), id);
        }
        assert!(ProviderId::parse("midjourney").is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(ProviderJobState::Completed.is_terminal());
        assert!(ProviderJobState::Failed.is_terminal());
        assert!(!ProviderJobState::Queued.is_terminal());
        assert!(!ProviderJobState::Generating.is_terminal());
    }
}
