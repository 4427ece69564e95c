use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use walkdir::WalkDir;

use crate::error::{Result, SynkaError};
use crate::plugin::AnalysisStore;
use crate::types::Ecosystem;

/// Persistent home of the sync watermark and the offline database blob.
///
/// The watermark is monotonically non-decreasing and owned exclusively by the
/// store; `advance_watermark` is the only mutual-exclusion point of a sync
/// run, and implementations must serialize overlapping advances so two runs
/// never observe the same previous value.
#[async_trait]
pub trait VulnDbStore: Send + Sync {
    /// Current watermark; the epoch if no sync has completed yet.
    async fn read_watermark(&self) -> Result<DateTime<Utc>>;

    /// Bumps the watermark to now and returns the *previous* value.
    async fn advance_watermark(&self) -> Result<DateTime<Utc>>;

    /// Copies the stored offline database snapshot into `dir`, if one exists.
    async fn retrieve_snapshot(&self, dir: &Path) -> Result<()>;

    /// Replaces the stored snapshot with the contents of `dir`.
    async fn store_snapshot(&self, dir: &Path) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct WatermarkFile {
    last_sync: DateTime<Utc>,
}

/// Directory-backed [`VulnDbStore`]: `watermark.json` plus a `snapshot/`
/// subdirectory for the offline database.
pub struct FileVulnDbStore {
    root: PathBuf,
    advance_lock: Mutex<()>,
}

impl FileVulnDbStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            advance_lock: Mutex::new(()),
        }
    }

    fn watermark_path(&self) -> PathBuf {
        self.root.join("watermark.json")
    }

    fn snapshot_root(&self) -> PathBuf {
        self.root.join("snapshot")
    }

    fn read_watermark_file(&self) -> Result<DateTime<Utc>> {
        let path = self.watermark_path();
        if !path.exists() {
            return Ok(DateTime::UNIX_EPOCH);
        }

        let content = fs::read_to_string(&path).map_err(|e| SynkaError::Watermark {
            message: format!("read {}: {}", path.display(), e),
        })?;
        let file: WatermarkFile =
            serde_json::from_str(&content).map_err(|e| SynkaError::Watermark {
                message: format!("parse {}: {}", path.display(), e),
            })?;
        Ok(file.last_sync)
    }

    fn write_watermark_file(&self, value: DateTime<Utc>) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| SynkaError::Watermark {
            message: format!("create {}: {}", self.root.display(), e),
        })?;

        let content = serde_json::to_string_pretty(&WatermarkFile { last_sync: value })
            .map_err(|e| SynkaError::Watermark {
                message: format!("serialize watermark: {}", e),
            })?;

        // Write-then-rename so a crashed sync never leaves a torn file.
        let tmp = tempfile::NamedTempFile::new_in(&self.root).map_err(|e| {
            SynkaError::Watermark {
                message: format!("create temp file in {}: {}", self.root.display(), e),
            }
        })?;
        fs::write(tmp.path(), content).map_err(|e| SynkaError::Watermark {
            message: format!("write watermark: {}", e),
        })?;
        tmp.persist(self.watermark_path())
            .map_err(|e| SynkaError::Watermark {
                message: format!("persist watermark: {}", e),
            })?;
        Ok(())
    }
}

#[async_trait]
impl VulnDbStore for FileVulnDbStore {
    async fn read_watermark(&self) -> Result<DateTime<Utc>> {
        self.read_watermark_file()
    }

    async fn advance_watermark(&self) -> Result<DateTime<Utc>> {
        let _guard = self.advance_lock.lock().await;
        let previous = self.read_watermark_file()?;
        self.write_watermark_file(Utc::now())?;
        Ok(previous)
    }

    async fn retrieve_snapshot(&self, dir: &Path) -> Result<()> {
        let source = self.snapshot_root();
        if !source.exists() {
            // Nothing stored yet; the refresher starts from scratch.
            return Ok(());
        }
        copy_tree(&source, dir)
    }

    async fn store_snapshot(&self, dir: &Path) -> Result<()> {
        let target = self.snapshot_root();
        if target.exists() {
            fs::remove_dir_all(&target).map_err(|e| SynkaError::Snapshot {
                path: target.clone(),
                source: e,
            })?;
        }
        copy_tree(dir, &target)
    }
}

fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| SynkaError::Snapshot {
            path: source.to_path_buf(),
            source: e.into(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .expect("walkdir yields paths under its root");
        let destination = target.join(relative);

        let result = if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)
        } else {
            fs::copy(entry.path(), &destination).map(|_| ())
        };
        result.map_err(|e| SynkaError::Snapshot {
            path: destination.clone(),
            source: e,
        })?;
    }
    Ok(())
}

/// In-memory [`VulnDbStore`]. The store is an injected dependency exactly so
/// tests (and dry runs) can swap this in for the file-backed one.
pub struct MemoryVulnDbStore {
    watermark: Mutex<DateTime<Utc>>,
}

impl MemoryVulnDbStore {
    pub fn new() -> Self {
        Self::with_watermark(DateTime::UNIX_EPOCH)
    }

    pub fn with_watermark(value: DateTime<Utc>) -> Self {
        Self {
            watermark: Mutex::new(value),
        }
    }
}

impl Default for MemoryVulnDbStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VulnDbStore for MemoryVulnDbStore {
    async fn read_watermark(&self) -> Result<DateTime<Utc>> {
        Ok(*self.watermark.lock().await)
    }

    async fn advance_watermark(&self) -> Result<DateTime<Utc>> {
        let mut watermark = self.watermark.lock().await;
        let previous = *watermark;
        *watermark = Utc::now();
        Ok(previous)
    }

    async fn retrieve_snapshot(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    async fn store_snapshot(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }
}

fn analysis_key(ecosystem: &Ecosystem, package: &str, version: &str) -> String {
    format!("{}/{}/{}", ecosystem, package, version)
}

/// [`AnalysisStore`] backed by a JSON map file
/// (`{"npm/left-pad/1.0.0": 2, ...}`). A missing file means no package has
/// been analyzed yet.
pub struct FileAnalysisStore {
    counts: HashMap<String, u64>,
}

impl FileAnalysisStore {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                counts: HashMap::new(),
            });
        }
        let content = fs::read_to_string(path)?;
        let counts = serde_json::from_str(&content).map_err(|e| SynkaError::Cache {
            message: format!("parse {}: {}", path.display(), e),
        })?;
        Ok(Self { counts })
    }
}

#[async_trait]
impl AnalysisStore for FileAnalysisStore {
    async fn analysis_count(
        &self,
        ecosystem: &Ecosystem,
        package: &str,
        version: &str,
    ) -> Result<u64> {
        Ok(self
            .counts
            .get(&analysis_key(ecosystem, package, version))
            .copied()
            .unwrap_or(0))
    }
}

/// In-memory [`AnalysisStore`] for tests and manual seeding.
#[derive(Default)]
pub struct MemoryAnalysisStore {
    counts: HashMap<String, u64>,
}

impl MemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, ecosystem: &Ecosystem, package: &str, version: &str, count: u64) {
        self.counts
            .insert(analysis_key(ecosystem, package, version), count);
    }
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn analysis_count(
        &self,
        ecosystem: &Ecosystem,
        package: &str,
        version: &str,
    ) -> Result<u64> {
        Ok(self
            .counts
            .get(&analysis_key(ecosystem, package, version))
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_watermark_reads_as_epoch() {
        let dir = TempDir::new().unwrap();
        let store = FileVulnDbStore::new(dir.path());
        assert_eq!(store.read_watermark().await.unwrap(), DateTime::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn test_advance_returns_previous_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = FileVulnDbStore::new(dir.path());

        let first_previous = store.advance_watermark().await.unwrap();
        assert_eq!(first_previous, DateTime::UNIX_EPOCH);

        let after_first = store.read_watermark().await.unwrap();
        assert!(after_first > DateTime::UNIX_EPOCH);

        // A fresh handle over the same directory sees the persisted value.
        let reopened = FileVulnDbStore::new(dir.path());
        let second_previous = reopened.advance_watermark().await.unwrap();
        assert_eq!(second_previous, after_first);
        assert!(reopened.read_watermark().await.unwrap() >= second_previous);
    }

    #[tokio::test]
    async fn test_watermark_monotonic_over_runs() {
        let dir = TempDir::new().unwrap();
        let store = FileVulnDbStore::new(dir.path());

        let mut last = store.read_watermark().await.unwrap();
        for _ in 0..3 {
            store.advance_watermark().await.unwrap();
            let current = store.read_watermark().await.unwrap();
            assert!(current >= last);
            last = current;
        }
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let store_dir = TempDir::new().unwrap();
        let store = FileVulnDbStore::new(store_dir.path());

        let work = TempDir::new().unwrap();
        fs::create_dir_all(work.path().join("data")).unwrap();
        fs::write(work.path().join("data/odc.mv.db"), b"snapshot-bytes").unwrap();
        store.store_snapshot(work.path()).await.unwrap();

        let restored = TempDir::new().unwrap();
        store.retrieve_snapshot(restored.path()).await.unwrap();
        let bytes = fs::read(restored.path().join("data/odc.mv.db")).unwrap();
        assert_eq!(bytes, b"snapshot-bytes");
    }

    #[tokio::test]
    async fn test_retrieve_without_stored_snapshot_is_a_noop() {
        let store_dir = TempDir::new().unwrap();
        let store = FileVulnDbStore::new(store_dir.path());

        let target = TempDir::new().unwrap();
        store.retrieve_snapshot(target.path()).await.unwrap();
        assert!(fs::read_dir(target.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_file_analysis_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analyses.json");
        fs::write(&path, r#"{"npm/left-pad/1.0.0": 2}"#).unwrap();

        let store = FileAnalysisStore::load(&path).unwrap();
        assert_eq!(
            store
                .analysis_count(&Ecosystem::npm(), "left-pad", "1.0.0")
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .analysis_count(&Ecosystem::npm(), "left-pad", "1.2.0")
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_file_analysis_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileAnalysisStore::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(
            store
                .analysis_count(&Ecosystem::npm(), "anything", "1.0.0")
                .await
                .unwrap(),
            0
        );
    }
}
