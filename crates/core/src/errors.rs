use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read document `{path}`: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse document `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("could not serialize document: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("could not write document `{path}`: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("document store lock is poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
    #[error("configuration failure: {0}")]
    Configuration(#[from] ConfigError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Persistence(_) => "storage",
            Self::Configuration(_) => "config_validation",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Persistence(_) => 4,
            Self::InvalidRequest(_) => 5,
        }
    }
}
