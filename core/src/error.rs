//! Error types for the pod client.
//!
//! # Design
//! `NotFound` gets its own variant because the read path treats "resource
//! absent" differently from "server misbehaved" (the conditional update
//! turns it into an `If-None-Match: *` write). Every other unexpected status
//! lands in `Status` with the raw code and body for debugging. Failures to
//! complete an exchange at all are `Transport`.
//!
//! The fire-and-forget operations on `Pod` absorb all of these; only the
//! `try_*` forms surface them.

use thiserror::Error;

/// Errors produced while talking to a pod.
#[derive(Debug, Error)]
pub enum PodError {
    /// The server answered 404.
    #[error("resource not found")]
    NotFound,

    /// The exchange could not complete: connect failure, timeout, bad address.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The exchange completed with a status the operation does not accept.
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// A successful response body could not be read as UTF-8 text.
    #[error("undecodable response body: {message}")]
    Decode { message: String },

    /// A conditional update kept losing the race against other writers.
    #[error("update conflict persisted after {attempts} attempts")]
    Conflict { attempts: u32 },
}

impl PodError {
    pub fn transport(message: impl Into<String>) -> Self {
        PodError::Transport {
            message: message.into(),
        }
    }

    /// Whether the same call could succeed if issued again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            PodError::Transport { .. } | PodError::Conflict { .. } => true,
            PodError::Status { status, .. } => *status >= 500 || *status == 412,
            PodError::NotFound | PodError::Decode { .. } => false,
        }
    }
}

/// Errors produced while loading a `PodConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {name}")]
    MissingEnvVar { name: String },

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_server_errors_are_retryable() {
        assert!(PodError::transport("timed out").is_retryable());
        assert!(PodError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(PodError::Conflict { attempts: 5 }.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!PodError::NotFound.is_retryable());
        assert!(!PodError::Status {
            status: 403,
            body: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn display_includes_status() {
        let err = PodError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "unexpected HTTP status 500: boom");
    }
}
