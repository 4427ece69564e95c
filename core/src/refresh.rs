use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, SynkaError};

/// Refreshes a local offline vulnerability database snapshot against the
/// remote authority.
///
/// Implementations must be cancel-safe: the orchestrator drops the future on
/// timeout and expects any external process to die with it.
#[async_trait]
pub trait OfflineRefresher: Send + Sync {
    async fn refresh(&self, data_dir: &Path) -> Result<()>;
}

/// Runs an external updater tool against the working directory.
///
/// The default contract is OWASP Dependency-Check's updater:
/// `dependency-check.sh --updateonly --data <dir>`.
pub struct CommandRefresher {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRefresher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec!["--updateonly".to_string()],
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

#[async_trait]
impl OfflineRefresher for CommandRefresher {
    async fn refresh(&self, data_dir: &Path) -> Result<()> {
        debug!(program = %self.program.display(), data_dir = %data_dir.display(), "refreshing offline database");

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--data")
            .arg(data_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // If the surrounding timeout drops this future, take the
            // external updater down with it.
            .kill_on_drop(true);

        let output = command.output().await.map_err(|e| SynkaError::Refresh {
            message: format!("failed to run '{}': {}", self.program.display(), e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SynkaError::Refresh {
                message: format!(
                    "'{}' exited with {}: {}",
                    self.program.display(),
                    output.status,
                    stderr.trim()
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_program_is_a_refresh_error() {
        let dir = TempDir::new().unwrap();
        let refresher = CommandRefresher::new("/nonexistent/updater");

        let err = refresher.refresh(dir.path()).await.unwrap_err();
        assert!(matches!(err, SynkaError::Refresh { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_failing_program_surfaces_exit_status() {
        let dir = TempDir::new().unwrap();
        // `false` ignores its arguments and exits non-zero.
        let refresher = CommandRefresher::new("false").with_args(Vec::new());

        let err = refresher.refresh(dir.path()).await.unwrap_err();
        assert!(matches!(err, SynkaError::Refresh { .. }));
    }

    #[tokio::test]
    async fn test_succeeding_program() {
        let dir = TempDir::new().unwrap();
        let refresher = CommandRefresher::new("true").with_args(Vec::new());

        refresher.refresh(dir.path()).await.unwrap();
    }
}
