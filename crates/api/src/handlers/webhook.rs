//! Inbound provider webhook receiver.
//!
//! `POST /api/webhooks/{provider}` takes out-of-band completion notices.
//! The raw body is HMAC-verified against the provider's shared secret
//! before any parsing; an unsigned or mis-signed request is rejected with
//! 401 and touches nothing.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use storyreel_core::signing::verify_webhook_hmac;
use storyreel_pipeline::{outcome_from_status, Applied};
use storyreel_providers::{set, ProviderId};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying the hex-encoded HMAC-SHA256 of the raw body.
const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Acknowledgement body for an accepted webhook delivery.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// What the notice changed: `job_and_entity`, `job_only`, `ignored`,
    /// or `not_terminal`.
    pub applied: &'static str,
}

/// POST /api/webhooks/{provider}
pub async fn receive(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<DataResponse<WebhookAck>>> {
    let provider = ProviderId::parse(&provider)?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".into()))?;

    let secret = state.config.providers.webhook_secret(provider);
    if !verify_webhook_hmac(secret, &body, signature) {
        tracing::warn!(provider = provider.as_str(), "Webhook signature mismatch");
        return Err(AppError::Unauthorized("Invalid webhook signature".into()));
    }

    let payload: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook body: {e}")))?;
    let notice = set::parse_webhook(provider, &payload)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let Some(outcome) = outcome_from_status(&notice.status) else {
        // Progress notices are acknowledged but carry nothing the poll
        // loop does not already track.
        tracing::debug!(
            provider = provider.as_str(),
            request_id = %notice.external_request_id,
            "Non-terminal webhook notice"
        );
        return Ok(Json(DataResponse {
            data: WebhookAck {
                applied: "not_terminal",
            },
        }));
    };

    let applied = state
        .orchestrator
        .apply_terminal(&notice.external_request_id, outcome)
        .await?;

    tracing::info!(
        provider = provider.as_str(),
        request_id = %notice.external_request_id,
        ?applied,
        "Webhook notice reconciled"
    );

    Ok(Json(DataResponse {
        data: WebhookAck {
            applied: match applied {
                Applied::JobAndEntity => "job_and_entity",
                Applied::JobOnly => "job_only",
                Applied::Ignored => "ignored",
            },
        },
    }))
}
