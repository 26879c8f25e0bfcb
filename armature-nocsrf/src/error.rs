//! Error types for CSRF token checks

use thiserror::Error;

/// Result type for CSRF operations
pub type Result<T> = std::result::Result<T, CsrfError>;

/// Result type for session store operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Reason a submitted token was rejected.
///
/// A check reports at most one of these to the caller: the first one detected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckFailure {
    /// No token stored in the session under the requested key
    #[error("Missing CSRF session token.")]
    MissingSessionToken,

    /// The submitted form carries no field for the requested key
    #[error("Missing CSRF form token.")]
    MissingFormToken,

    /// The token was issued to a different remote address / user agent
    #[error("Form origin does not match token origin.")]
    OriginMismatch,

    /// The submitted token differs from the stored one
    #[error("Invalid CSRF token.")]
    TokenMismatch,

    /// The token is older than the allowed maximum age
    #[error("CSRF token has expired.")]
    TokenExpired,
}

impl CheckFailure {
    /// Stable machine-readable name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSessionToken => "missing_session_token",
            Self::MissingFormToken => "missing_form_token",
            Self::OriginMismatch => "origin_mismatch",
            Self::TokenMismatch => "token_mismatch",
            Self::TokenExpired => "token_expired",
        }
    }
}

/// Session store errors.
///
/// These are upstream failures, never token rejections.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Backend unavailable or failed
    #[error("Session backend error: {0}")]
    Backend(String),
}

impl SessionError {
    /// Create a new backend error
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        Self::Backend(msg.into())
    }
}

#[derive(Error, Debug)]
pub enum CsrfError {
    /// Token rejected by one of the checks
    #[error(transparent)]
    Rejected(#[from] CheckFailure),

    /// Session store failure
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid form data: {0}")]
    Form(String),
}

impl CsrfError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// The rejection reason, if this error is a token rejection
    pub fn failure(&self) -> Option<CheckFailure> {
        match self {
            Self::Rejected(failure) => Some(*failure),
            _ => None,
        }
    }

    /// Check if this error is a token rejection rather than an upstream failure
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl From<serde_urlencoded::de::Error> for CsrfError {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        Self::Form(err.to_string())
    }
}

impl From<serde_json::Error> for CsrfError {
    fn from(err: serde_json::Error) -> Self {
        Self::Form(err.to_string())
    }
}
