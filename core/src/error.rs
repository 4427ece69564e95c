use std::path::PathBuf;
use thiserror::Error;

use crate::types::Ecosystem;

#[derive(Debug, Error)]
pub enum SynkaError {
    #[error("Offline database refresh failed: {message}")]
    Refresh { message: String },

    #[error("Offline database refresh timed out after {timeout_secs}s")]
    RefreshTimeout { timeout_secs: u64 },

    #[error("Snapshot transfer failed for '{path}': {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Watermark store error: {message}")]
    Watermark { message: String },

    #[error("Feed query failed for ecosystem '{ecosystem}': {message}")]
    Feed {
        ecosystem: Ecosystem,
        message: String,
    },

    #[error("Version catalog error for '{registry}': {source}")]
    Catalog {
        registry: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to resolve range '{expression}' for {ecosystem}:{package}: {message}")]
    Resolution {
        ecosystem: Ecosystem,
        package: String,
        expression: String,
        message: String,
    },

    #[error("Invalid version range '{expression}': {message}")]
    Range { expression: String, message: String },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Plugin error: {message}")]
    Plugin { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl SynkaError {
    /// Whether this error aborts a whole sync run.
    ///
    /// Refresh, snapshot and watermark failures are fatal; everything else is
    /// scoped to a single ecosystem or record and degrades the result
    /// instead of stopping the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SynkaError::Refresh { .. }
                | SynkaError::RefreshTimeout { .. }
                | SynkaError::Snapshot { .. }
                | SynkaError::Watermark { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SynkaError>;
