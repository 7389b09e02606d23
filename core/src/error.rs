//! Error types for the fetch bridge.
//!
//! # Design
//! Faults surface at the operation that triggered them. A failed host send
//! rejects `fetch()` itself; a body that is not JSON rejects `json()` and
//! nothing else. An absent body and an unknown status code are not errors.

use thiserror::Error;

use crate::host::HostError;

#[derive(Error, Debug)]
pub enum FetchError {
    /// The host's send primitive reported a failure. Never retried here.
    #[error("host send failed: {0}")]
    Host(#[source] HostError),

    /// The body text could not be parsed as JSON.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    pub fn is_host(&self) -> bool {
        matches!(self, FetchError::Host(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Json(_))
    }
}
