//! Error types module
//!
//! This module provides the error taxonomy used throughout the Restora client.
//! All errors are unified under the `ClientError` enum: local validation,
//! transport/backend failures, the distinguished authorization rejection,
//! token decode failures, and token-storage errors.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Detected locally before any network call (missing file extension,
    /// malformed credentials).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Network-level failure: the request never produced an HTTP response.
    #[error("Request failed: {0}")]
    Transport(String),

    /// Non-2xx HTTP response. Carries the backend-provided message when one
    /// was parseable, otherwise a generic fallback.
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// Authorization rejection (missing, invalid, or expired credentials).
    /// Produced only by the shared request layer, which has already cleared
    /// the session by the time this surfaces.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Persisted token that could not be decoded. Handled as silent local
    /// recovery, never shown to the user.
    #[error("Invalid session token: {0}")]
    TokenDecode(String),

    /// Reading or writing the persisted token failed.
    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// True for the rejection status that must trigger the global logout and
    /// redirect rather than an inline error.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// Message suitable for direct presentation. Backend messages pass
    /// through untouched; everything else gets a stable phrasing.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Transport(_) => "Network error. Please try again.".to_string(),
            ClientError::Unauthorized(_) => "Your session has expired. Please sign in again.".to_string(),
            ClientError::TokenDecode(_) | ClientError::Storage(_) | ClientError::Config(_) => {
                self.to_string()
            }
        }
    }
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        ClientError::Storage(format!("IO error: {}", err))
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::Validation(format!("Validation error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_rejection_is_distinguished() {
        let err = ClientError::Unauthorized("token expired".to_string());
        assert!(err.is_auth_rejection());

        let err = ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_auth_rejection());
    }

    #[test]
    fn api_message_passes_through() {
        let err = ClientError::Api {
            status: 502,
            message: "upstream unavailable".to_string(),
        };
        assert_eq!(err.user_message(), "upstream unavailable");
    }

    #[test]
    fn transport_gets_generic_message() {
        let err = ClientError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(), "Network error. Please try again.");
    }

    #[test]
    fn validation_errors_convert() {
        use validator::Validate;

        #[derive(Validate)]
        struct Probe {
            #[validate(email)]
            email: String,
        }

        let probe = Probe {
            email: "not-an-email".to_string(),
        };
        let err: ClientError = probe.validate().unwrap_err().into();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
