//! Provider adapters for the external generation services.
//!
//! Each adapter translates a [`GenerationRequest`](adapter::GenerationRequest)
//! into exactly one HTTP call against its provider and maps the provider's
//! status vocabulary onto the shared
//! [`ProviderJobState`](adapter::ProviderJobState). Adapters are pure: no
//! database access, no retries, no interpretation of pass-through fields
//! like aspect ratio or model identifiers.

pub mod adapter;
pub mod flux;
pub mod luma;
pub mod scribe;
pub mod set;

pub use adapter::{
    GenerationRequest, Provider, ProviderError, ProviderId, ProviderJobState, ProviderJobStatus,
    Submission, WebhookNotice,
};
pub use flux::FluxClient;
pub use luma::LumaClient;
pub use scribe::ScribeClient;
pub use set::ProviderSet;
