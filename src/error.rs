// Error types shared across the crate

use thiserror::Error;

use crate::config::ConfigError;
use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum OrreryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Terminal or output stream failure inside a rendering backend
    #[error("rendering backend failed: {0}")]
    Backend(#[from] std::io::Error),

    #[error("failed to serialize frame: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

pub type Result<T, E = OrreryError> = std::result::Result<T, E>;
