//! Error types for call-control operations
//!
//! Failures fall into a small number of categories that callers usually
//! handle differently:
//!
//! - **Network Errors** - the platform could not complete the request
//! - **API Errors** - the service answered with a non-success status
//! - **Decode Errors** - the response body did not have the expected shape
//! - **State Errors** - the operation is not valid for the session right now
//! - **Configuration Errors** - invalid settings, fix before retrying
//!
//! Bootstrap (`CallControl::initialize`) never returns these: failures while
//! loading presence, extension info or devices are logged and absorbed.
//! Call-control operations on a [`Session`](crate::Session) return them to the
//! caller untouched. Nothing in this crate retries on its own.
//!
//! # Handling errors
//!
//! ```rust,no_run
//! # use call_control_core::{CallControlError, Session};
//! # use std::sync::Arc;
//! # async fn example(session: Arc<Session>) {
//! match session.hold().await {
//!     Ok(party) => println!("held: {:?}", party.status),
//!     Err(CallControlError::NoActiveParty { session_id }) => {
//!         println!("session {} has no party of ours yet", session_id);
//!     }
//!     Err(e) if e.is_recoverable() => {
//!         // Caller decides whether to try again
//!     }
//!     Err(e) => eprintln!("hold failed ({}): {}", e.category(), e),
//! }
//! # }
//! ```

use thiserror::Error;

/// Result type alias for call-control operations
pub type CallControlResult<T> = Result<T, CallControlError>;

/// Errors surfaced by call-control operations
#[derive(Error, Debug, Clone)]
pub enum CallControlError {
    /// Transport failure reported by the platform
    #[error("Network error: {reason}")]
    NetworkError { reason: String },

    /// The service answered with a non-success status
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },

    /// A party-scoped operation ran while the session has no party of ours
    #[error("No active party in session {session_id}")]
    NoActiveParty { session_id: String },

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },
}

impl CallControlError {
    /// Create a network error
    pub fn network_error(reason: impl Into<String>) -> Self {
        Self::NetworkError { reason: reason.into() }
    }

    /// Create an API error from a response status
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError { status, message: message.into() }
    }

    /// Create an invalid response error
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse { reason: reason.into() }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { field: field.into(), reason: reason.into() }
    }

    /// Check if retrying the same request could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            CallControlError::NetworkError { .. } => true,
            CallControlError::ApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            CallControlError::NetworkError { .. } => "network",
            CallControlError::ApiError { .. } | CallControlError::InvalidResponse { .. } => "api",
            CallControlError::NoActiveParty { .. } => "state",
            CallControlError::InvalidConfiguration { .. } => "configuration",
        }
    }
}

impl From<serde_json::Error> for CallControlError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_response(err.to_string())
    }
}
