use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the relay for one provider call.
///
/// Mirrors the relay's error body: `{ "status": 429, "type": "rate_limit_error", "message": "..." }`.
/// A `status` of 0 means the relay itself could not be reached.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("provider error {status} ({kind}): {message}")]
pub struct ProviderError {
    #[serde(default)]
    pub status: u16,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, alias = "error")]
    pub message: String,
}

impl ProviderError {
    pub fn new(status: u16, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The relay could not be reached at all.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(0, "unknown_error", message)
    }
}

/// Everything that can go wrong between sending a turn and holding a completion string.
///
/// Only the message assembler consumes this; it maps every variant to a canned reply.
#[derive(Error, Debug)]
pub enum TurnError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("provider response contained no text block")]
    NoTextContent,

    #[error("invalid provider payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Errors from configuration loading and session persistence.
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {entity_type} '{id}'")]
    NotFound { entity_type: &'static str, id: String },
}

impl TutorError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn json(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }

    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }
}

impl From<toml::de::Error> for TutorError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}
