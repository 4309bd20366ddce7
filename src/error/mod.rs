//! Error types for archive listing and rewriting

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Required metadata entry is missing from the archive
    #[error("Not found: {0}")]
    NotFound(String),
    /// JSON or tar structure could not be decoded
    #[error("Malformed input: {0}")]
    Malformed(String),
    /// A manifest repo tag carries more than one colon
    #[error("Invalid repo tag: {0}")]
    InvalidRepoTag(String),
    /// Bad configuration, e.g. an unparseable kubeadm version
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Underlying stream or file failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ArchiveError {
    fn from(err: serde_json::Error) -> Self {
        ArchiveError::Malformed(err.to_string())
    }
}

impl From<semver::Error> for ArchiveError {
    fn from(err: semver::Error) -> Self {
        ArchiveError::Configuration(format!("invalid version: {}", err))
    }
}
