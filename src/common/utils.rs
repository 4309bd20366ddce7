//! Common utilities and helper functions
//!
//! Stream sniffing, repo-tag splitting and CLI value validation shared across the crate.

use crate::error::{ArchiveError, Result};
use crate::logging::Logger;
use flate2::read::GzDecoder;
use std::io::{BufRead, BufReader, Read};
use std::time::{Duration, Instant};

/// Leading bytes of every gzip stream
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Timing utilities
pub struct Timer {
    start: Instant,
    description: String,
}

impl Timer {
    /// Start a new timer
    pub fn start(description: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            description: description.into(),
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Log elapsed time using provided logger
    pub fn log_elapsed(&self, logger: &Logger) {
        logger.detail(&format!(
            "{} completed in {}",
            self.description,
            logger.format_duration(self.elapsed())
        ));
    }
}

/// Archive stream utilities
pub struct ArchiveUtils;

impl ArchiveUtils {
    /// Check whether data starts with the gzip magic
    pub fn is_gzipped(data: &[u8]) -> bool {
        data.starts_with(&GZIP_MAGIC)
    }

    /// Wrap a reader in a gzip decoder when its first bytes are the gzip magic
    ///
    /// Peeks through a buffer, so nothing is consumed from the plain tar case.
    pub fn decompress_if_gzipped<'a, R: Read + 'a>(reader: R) -> Result<Box<dyn Read + 'a>> {
        let mut buffered = BufReader::new(reader);
        let gzipped = Self::is_gzipped(buffered.fill_buf()?);
        if gzipped {
            Ok(Box::new(GzDecoder::new(buffered)))
        } else {
            Ok(Box::new(buffered))
        }
    }
}

/// Repo tag helpers (`repository:tag`)
pub struct RepoTagUtils;

impl RepoTagUtils {
    /// Split a repo tag into repository and optional tag
    ///
    /// At most one colon is allowed, so `localhost:5000/foo:v1` is rejected.
    pub fn split(repo_tag: &str) -> Result<(&str, Option<&str>)> {
        let mut parts = repo_tag.splitn(3, ':');
        let repository = parts.next().unwrap_or_default();
        let tag = parts.next();
        if parts.next().is_some() {
            return Err(ArchiveError::InvalidRepoTag(repo_tag.to_string()));
        }
        Ok((repository, tag))
    }

    pub fn join(repository: &str, tag: Option<&str>) -> String {
        match tag {
            Some(tag) => format!("{}:{}", repository, tag),
            None => repository.to_string(),
        }
    }
}

/// Validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Parse a `FROM=TO` prefix replacement
    pub fn parse_replacement(value: &str) -> Result<(String, String)> {
        let (from, to) = value.split_once('=').ok_or_else(|| {
            ArchiveError::Configuration(format!(
                "replacement '{}' must have the form FROM=TO",
                value
            ))
        })?;
        Self::validate_repository_prefix(from)?;
        Self::validate_repository_prefix(to)?;
        Ok((from.to_string(), to.to_string()))
    }

    /// Validate a repository prefix used by an editor
    pub fn validate_repository_prefix(prefix: &str) -> Result<()> {
        if prefix.is_empty() {
            return Err(ArchiveError::Configuration(
                "Repository prefix cannot be empty".to_string(),
            ));
        }
        if prefix.contains(':') || prefix.contains('@') || prefix.chars().any(char::is_whitespace) {
            return Err(ArchiveError::Configuration(format!(
                "Repository prefix '{}' cannot contain a tag, digest or whitespace",
                prefix
            )));
        }
        Ok(())
    }
}
