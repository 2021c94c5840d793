// src/errors.rs

//! Crate-wide error type for everything around the engine: manifests,
//! registry files, IO. Engine failures themselves are
//! [`EngineError`](crate::engine::EngineError).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StepgraphError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Registry error: {0}")]
    RegistryError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, StepgraphError>;
