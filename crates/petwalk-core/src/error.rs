// ── Core error types ──
//
// User-facing errors from petwalk-core. Consumers never see reqwest or
// serde errors directly: the `From<petwalk_api::Error>` impl translates
// transport-layer failures into domain variants.

use std::sync::Arc;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to door at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request to door timed out")]
    RequestTimeout,

    #[error("Refresh cycle exceeded its {timeout_ms}ms deadline")]
    CycleTimeout { timeout_ms: u64 },

    // ── Device errors ────────────────────────────────────────────────
    #[error("Door rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed payload from door: {message}")]
    MalformedPayload { message: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    /// The first refresh during `initialize()` failed. Nothing was committed.
    #[error("Door not ready: {cause}")]
    NotReady {
        #[source]
        cause: Arc<CoreError>,
    },

    #[error("Controller has not been initialized")]
    NotInitialized,

    #[error("Controller has been shut down")]
    ShutDown,

    /// A requested refresh cycle failed. The snapshot was left unchanged.
    #[error("Refresh failed: {cause}")]
    RefreshFailed {
        #[source]
        cause: Arc<CoreError>,
    },

    // ── Command errors ───────────────────────────────────────────────
    #[error("Unknown command key '{key}'")]
    InvalidCommand { key: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for failures talking to the door: network, HTTP
    /// status, auth, timeouts, and malformed payloads.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::AuthenticationFailed { .. }
                | Self::RequestTimeout
                | Self::CycleTimeout { .. }
                | Self::Rejected { .. }
                | Self::MalformedPayload { .. }
        )
    }

    /// Unwrap `NotReady` / `RefreshFailed` down to the underlying cause.
    pub fn root_cause(&self) -> &CoreError {
        match self {
            Self::NotReady { cause } | Self::RefreshFailed { cause } => cause.root_cause(),
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<petwalk_api::Error> for CoreError {
    fn from(err: petwalk_api::Error) -> Self {
        match err {
            petwalk_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            petwalk_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::RequestTimeout
                } else if e.is_decode() {
                    CoreError::MalformedPayload {
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            petwalk_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid door address: {e}"),
            },
            petwalk_api::Error::ClientBuild(message) => CoreError::Internal(message),
            petwalk_api::Error::Status { status, body } => CoreError::Rejected {
                status,
                message: body,
            },
            petwalk_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedPayload { message }
            }
            petwalk_api::Error::EmptyUpdate => CoreError::ValidationFailed {
                message: "state update must set door or system".into(),
            },
        }
    }
}
