// ================================================================
// File: jukebot-common/src/error.rs
// ================================================================

use thiserror::Error;

/// Why a URL could not be turned into playable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionReason {
    InvalidUrl,
    NoMatch,
    Unsupported,
    ProviderUnusable,
    LoadFailed,
    Provider,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No matches found for '{0}'")]
    NoMatch(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Provider '{0}' is currently unusable")]
    ProviderUnusable(String),

    #[error("Failed to load track: {0}")]
    LoadFailed(String),

    #[error("Catalog provider error: {0}")]
    Provider(String),

    #[error("No tracks were resolved.")]
    Empty,
}

impl ResolutionError {
    pub fn reason(&self) -> ResolutionReason {
        match self {
            ResolutionError::InvalidUrl(_) => ResolutionReason::InvalidUrl,
            ResolutionError::NoMatch(_) => ResolutionReason::NoMatch,
            ResolutionError::Unsupported(_) => ResolutionReason::Unsupported,
            ResolutionError::ProviderUnusable(_) => ResolutionReason::ProviderUnusable,
            ResolutionError::LoadFailed(_) => ResolutionReason::LoadFailed,
            ResolutionError::Provider(_) => ResolutionReason::Provider,
            ResolutionError::Empty => ResolutionReason::Empty,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A session was used before it was initialised. Always a bug.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Returns the resolution error if this is one, so command handlers can
    /// render it as a user-facing message.
    pub fn as_resolution(&self) -> Option<&ResolutionError> {
        match self {
            Error::Resolution(e) => Some(e),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}
