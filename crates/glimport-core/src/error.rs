// ── Core error types ──
//
// Errors surfaced by the resolution engine. Transport details from
// `glimport_api` are flattened into `Remote` so callers only match on
// domain-level variants.

use thiserror::Error;

use crate::registry::ResourceKind;

/// Leading text of `Remote` messages for requests that hit the timeout.
pub const TIMEOUT_PREFIX: &str = "request timed out";

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Per-resource errors ──────────────────────────────────────────
    #[error("{kind}: cannot read {field}: {reason}")]
    Extraction {
        kind: ResourceKind,
        field: String,
        reason: String,
    },

    #[error("{kind} with path {path:?} not found under {parent_id} ({inspected} candidates inspected)")]
    NotFound {
        kind: ResourceKind,
        parent_id: i64,
        path: String,
        inspected: usize,
    },

    #[error("GitLab API error: {message}")]
    Remote {
        message: String,
        status: Option<u16>,
        request_id: Option<String>,
        transient: bool,
    },

    #[error("Annotation error: {message}")]
    Annotation { message: String },

    #[error("GitLab client unavailable: {reason}")]
    ClientUnavailable { reason: String },

    // ── Boundary errors ──────────────────────────────────────────────
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl CoreError {
    /// Whether the failure invalidates the whole pass rather than one resource.
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<glimport_api::Error> for CoreError {
    fn from(err: glimport_api::Error) -> Self {
        let message = match &err {
            glimport_api::Error::Transport(e) if e.is_timeout() => {
                format!("{TIMEOUT_PREFIX}: {err}")
            }
            _ => err.to_string(),
        };
        CoreError::Remote {
            status: err.status(),
            request_id: err.request_id().map(String::from),
            transient: err.is_transient(),
            message,
        }
    }
}
