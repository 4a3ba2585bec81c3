use doors_core::error::CoreError;

use crate::token_store::TokenStoreError;

/// Errors from the data access layer and session manager.
///
/// Transient and permanent failures are not distinguished. Callers log
/// the full error and show [`ClientError::user_message`] to the user.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend rejected the credentials or the bearer token (401/403).
    #[error("Unauthorized ({status}): {detail}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// `detail` field of the error body, or the raw body.
        detail: String,
    },

    /// The backend returned any other non-2xx status code.
    #[error("API error ({status}): {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `detail` field of the error body, or the raw body.
        detail: String,
    },

    /// An authenticated call was attempted without a session token.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// A 2xx response body did not match the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Input rejected before sending.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),
}

impl ClientError {
    /// True when the session token is missing or no longer accepted.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized { .. } | ClientError::NotAuthenticated
        )
    }

    /// HTTP status code, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } | ClientError::Unauthorized { status, .. } => {
                Some(*status)
            }
            ClientError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Generic one-line message suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { detail, .. } | ClientError::Unauthorized { detail, .. } => {
                format!("request failed ({detail})")
            }
            ClientError::NotAuthenticated => "not logged in".to_string(),
            ClientError::Core(e) => format!("invalid input ({e})"),
            ClientError::Request(e) if e.is_timeout() => "request failed (timed out)".to_string(),
            ClientError::Request(_) => "request failed (could not reach server)".to_string(),
            ClientError::Decode(_) => "request failed (unexpected response)".to_string(),
            ClientError::InvalidUrl(_) | ClientError::TokenStore(_) => "request failed".to_string(),
        }
    }
}
