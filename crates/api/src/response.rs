//! Success envelope for API handlers.
//!
//! Every 2xx body is `{ "data": ... }` so clients can destructure
//! responses uniformly; error bodies are built in `crate::error` instead.

use serde::Serialize;

/// The `{ "data": T }` success envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
