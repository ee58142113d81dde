use crate::types::ExpiryReason;
use thiserror::Error;

/// Errors returned by the session core.
///
/// Messages are safe to hand to a request layer: they never contain token
/// values, authorization codes or downstream error text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid identity: {reason}")]
    InvalidIdentity { reason: String },

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid or malformed authorization code")]
    InvalidCode,

    #[error("Identity provider {provider} is unavailable")]
    ProviderUnavailable { provider: String },

    #[error("Session not found")]
    NotFound,

    #[error("Session expired ({reason})")]
    Expired { reason: ExpiryReason },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Whether retrying the same call later could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AuthError::ProviderUnavailable { .. })
    }

    /// Whether the error means "no usable session for this token".
    pub fn is_session_error(&self) -> bool {
        matches!(self, AuthError::NotFound | AuthError::Expired { .. })
    }
}

impl From<core_runtime::Error> for AuthError {
    fn from(err: core_runtime::Error) -> Self {
        AuthError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
