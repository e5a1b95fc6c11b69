use thiserror::Error;

use crate::sensory::cache::SensorySlot;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("World unavailable: {0}")]
    WorldUnavailable(String),

    #[error("Effector call '{call}' failed: {reason}")]
    EffectorFailure { call: String, reason: String },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Sensory slot '{0}' was never written")]
    UninitializedSensorySlot(SensorySlot),

    #[error("Sensory slot '{slot}' holds a {found}, expected a {expected}")]
    SensoryTypeMismatch {
        slot: SensorySlot,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl AgentError {
    pub fn effector(call: impl Into<String>, reason: impl Into<String>) -> Self {
        AgentError::EffectorFailure {
            call: call.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
