//! Error types for Platelife

use crate::types::Dimensions;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        expected: Dimensions,
        actual: Dimensions,
    },

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("tip capacity exceeded on channel {channel}: {required} uL > {capacity} uL")]
    TipCapacity {
        channel: usize,
        required: f64,
        capacity: f64,
    },

    #[error("hardware error: {command} - {message}")]
    Hardware { command: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn shape_mismatch(expected: Dimensions, actual: Dimensions) -> Self {
        Self::ShapeMismatch { expected, actual }
    }

    pub fn hardware(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hardware {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the error came from a device command rather than from planning or setup.
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware { .. })
    }
}
