use std::fmt;

use thiserror::Error;

/// Which check an OAuth redirect failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Method(String),
    Host(String),
    Path(String),
    MissingState,
    StateMismatch,
    MissingCode,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(method) => write!(f, "unexpected method {method}"),
            Self::Host(host) => write!(f, "unexpected host {host}"),
            Self::Path(path) => write!(f, "unexpected path {path}"),
            Self::MissingState => f.write_str("missing state parameter"),
            Self::StateMismatch => f.write_str("state parameter does not match"),
            Self::MissingCode => f.write_str("missing code parameter"),
        }
    }
}

/// Authentication errors for the loopback OAuth flow.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No OAuth callback received after {attempts} attempts")]
    Timeout { attempts: u32 },
    #[error("Malformed OAuth callback: {0}")]
    Protocol(String),
    #[error("OAuth callback rejected: {0}")]
    Rejected(RejectReason),
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),
    #[error("Could not open browser: {0}")]
    BrowserLaunch(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<RejectReason> for AuthError {
    fn from(reason: RejectReason) -> Self {
        Self::Rejected(reason)
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
