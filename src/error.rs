// src/error.rs
use std::{io, path::PathBuf};

/// Crate-wide error.
///
/// Transport problems are deliberately *not* here: a failed fetch is a value
/// (`net::FetchStatus`) that becomes an error record, never an early return.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("store write failed for {path}: {source}")]
    Persistence { path: PathBuf, source: io::Error },

    #[error("failed to serialize run summary: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Persistence { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
