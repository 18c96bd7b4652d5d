use crate::analyzer::kubescore::{ConfigError, ParseError, RegistryError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KubeScoreError {
    #[error("failed to parse input:\n{0}")]
    Parse(#[from] ParseError),

    #[error("check registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KubeScoreError>;
