//! Error handling for the CalorieTrack client

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// PostgREST code reported when a single-row read matched no rows.
pub const NOT_FOUND_CODE: &str = "PGRST116";

/// Error body returned by the PostgREST API
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Unified error type for the CalorieTrack client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Database query errors reported by PostgREST
    #[error("Database error: {details} (Status: {status})")]
    Database {
        details: ApiErrorDetails,
        status: reqwest::StatusCode,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before any request was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation needs a signed-in identity
    #[error("No signed-in user")]
    NoSession,

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new invalid input error
    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    /// Whether this is the "no rows" marker of a single-row read.
    ///
    /// A missing profile row is reported this way and is not a failure.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Database { details, .. } => details.code.as_deref() == Some(NOT_FOUND_CODE),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
