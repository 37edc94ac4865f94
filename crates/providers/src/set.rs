//! Exhaustive kind-to-adapter dispatch.

use std::sync::Arc;

use storyreel_core::generation::GenerationKind;

use crate::adapter::{Provider, ProviderError, ProviderId, WebhookNotice};
use crate::{flux, luma, scribe};

/// One adapter per generation kind.
///
/// Dispatch is by [`GenerationKind`], so adding a kind forces every call
/// site to handle it at compile time.
pub struct ProviderSet {
    image: Arc<dyn Provider>,
    video: Arc<dyn Provider>,
    text: Arc<dyn Provider>,
}

impl ProviderSet {
    /// Bundle concrete adapters. Tests substitute fakes here.
    pub fn new(image: Arc<dyn Provider>, video: Arc<dyn Provider>, text: Arc<dyn Provider>) -> Self {
        Self { image, video, text }
    }

    /// The adapter responsible for a generation kind.
    pub fn for_kind(&self, kind: GenerationKind) -> &dyn Provider {
        match kind {
            GenerationKind::Image => self.image.as_ref(),
            GenerationKind::Video => self.video.as_ref(),
            GenerationKind::Text => self.text.as_ref(),
        }
    }
}

/// Parse an inbound webhook body using the named provider's schema.
pub fn parse_webhook(
    provider: ProviderId,
    body: &serde_json::Value,
) -> Result<WebhookNotice, ProviderError> {
    match provider {
        ProviderId::Flux => flux::parse_webhook(body),
        ProviderId::Luma => luma::parse_webhook(body),
        ProviderId::Scribe => scribe::parse_webhook(body),
    }
}
