use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::DateTime;
use tracing::{debug, info, warn};

use crate::error::{Result, SynkaError};
use crate::plugin::{AnalysisStore, PluginRegistry};
use crate::refresh::OfflineRefresher;
use crate::report::{EcosystemSyncResult, SyncReport};
use crate::resolver::VersionRangeResolver;
use crate::store::VulnDbStore;
use crate::types::ResolvedTarget;

const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Knobs for one sync cycle.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Restrict output to versions with at least one prior analysis.
    pub only_already_scanned: bool,
    /// Query the feed from the epoch instead of the previous watermark.
    /// The persisted watermark still advances normally.
    pub ignore_modification_time: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            only_already_scanned: true,
            ignore_modification_time: false,
        }
    }
}

/// Drives one incremental sync cycle.
///
/// Pipeline: refresh the offline database (fail-hard), advance the watermark
/// and keep the previous value (fail-hard), then query the feed per
/// registered ecosystem and resolve every changed record's ranges into
/// concrete versions (fail-soft per ecosystem and per expression).
///
/// The watermark is advanced *before* the feed queries run, so a record that
/// changes mid-run falls into the next window instead of being lost.
pub struct SyncOrchestrator {
    registry: PluginRegistry,
    store: Arc<dyn VulnDbStore>,
    refresher: Box<dyn OfflineRefresher>,
    analyses: Arc<dyn AnalysisStore>,
    refresh_timeout: Duration,
}

impl SyncOrchestrator {
    pub fn new(
        registry: PluginRegistry,
        store: Arc<dyn VulnDbStore>,
        refresher: Box<dyn OfflineRefresher>,
        analyses: Arc<dyn AnalysisStore>,
    ) -> Self {
        Self {
            registry,
            store,
            refresher,
            analyses,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub async fn run(&self, options: SyncOptions) -> Result<SyncReport> {
        let started = Instant::now();
        info!(
            only_already_scanned = options.only_already_scanned,
            ignore_modification_time = options.ignore_modification_time,
            "starting vulnerability sync"
        );

        self.refresh_offline_database().await?;

        let previous_sync = self.store.advance_watermark().await?;
        let window_start = if options.ignore_modification_time {
            DateTime::UNIX_EPOCH
        } else {
            previous_sync
        };

        let mut report = SyncReport::new(previous_sync, window_start);
        let resolver = VersionRangeResolver::new(&self.registry, self.analyses.as_ref());
        let mut targets: HashSet<ResolvedTarget> = HashSet::new();

        for ecosystem in self.registry.ecosystems() {
            let client = match self.registry.feed_client(&ecosystem) {
                Some(c) => c,
                None => continue,
            };

            debug!(ecosystem = %ecosystem, since = %window_start, "querying feed");
            let records = match client.modified_since(window_start).await {
                Ok(records) => records,
                Err(e) => {
                    // Skip-and-log: the other ecosystems' results stand, and
                    // the same window can be retried per-ecosystem later.
                    warn!(ecosystem = %ecosystem, error = %e, "feed query failed, skipping ecosystem");
                    report
                        .warnings
                        .push(format!("skipped ecosystem '{}': {}", ecosystem, e));
                    continue;
                }
            };

            let mut result = EcosystemSyncResult::new(ecosystem.clone());
            for record in &records {
                result.records_considered += 1;

                let mut affected: HashSet<String> = HashSet::new();
                for expression in record.range_expressions() {
                    match resolver
                        .resolve(
                            &ecosystem,
                            &record.name,
                            expression,
                            options.only_already_scanned,
                        )
                        .await
                    {
                        Ok(versions) => affected.extend(versions),
                        Err(e) => {
                            warn!(
                                ecosystem = %ecosystem,
                                package = %record.name,
                                expression,
                                error = %e,
                                "range resolution failed"
                            );
                            result.expressions_failed += 1;
                            result.errors.push(e.to_string());
                        }
                    }
                }

                for version in affected {
                    let target = ResolvedTarget::new(ecosystem.clone(), &record.name, version);
                    if targets.insert(target) {
                        result.targets += 1;
                    }
                }
            }

            report.add_ecosystem_result(result);
        }

        report.modified = targets.into_iter().collect();
        report.elapsed = started.elapsed().as_millis() as u64;

        debug!(
            targets = report.modified.len(),
            records = report.records_considered,
            failed_expressions = report.expressions_failed,
            "components to be {}scanned for vulnerabilities",
            if options.only_already_scanned { "re-" } else { "" }
        );

        Ok(report)
    }

    /// Pulls the stored snapshot into a scoped working directory, runs the
    /// external updater under a timeout and stores the result back. The
    /// working directory is released on every exit path.
    async fn refresh_offline_database(&self) -> Result<()> {
        let workdir = tempfile::TempDir::new().map_err(|e| SynkaError::Refresh {
            message: format!("failed to create working directory: {}", e),
        })?;

        self.store.retrieve_snapshot(workdir.path()).await?;

        match tokio::time::timeout(self.refresh_timeout, self.refresher.refresh(workdir.path()))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(SynkaError::RefreshTimeout {
                    timeout_secs: self.refresh_timeout.as_secs(),
                })
            }
        }

        self.store.store_snapshot(workdir.path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{FeedClient, VersionSolver};
    use crate::store::{MemoryAnalysisStore, MemoryVulnDbStore};
    use crate::types::{Advisory, Ecosystem, VulnerabilityRecord};
    use crate::version::RangeSpec;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::path::Path;
    use std::sync::Mutex;

    struct NoopRefresher;

    #[async_trait]
    impl OfflineRefresher for NoopRefresher {
        async fn refresh(&self, _data_dir: &Path) -> Result<()> {
            Ok(())
        }
    }

    struct FailingRefresher;

    #[async_trait]
    impl OfflineRefresher for FailingRefresher {
        async fn refresh(&self, _data_dir: &Path) -> Result<()> {
            Err(SynkaError::Refresh {
                message: "updater exited with 1".to_string(),
            })
        }
    }

    struct HangingRefresher;

    #[async_trait]
    impl OfflineRefresher for HangingRefresher {
        async fn refresh(&self, _data_dir: &Path) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    /// Serves canned records and captures every `since` it was queried with.
    struct StubFeed {
        ecosystem: Ecosystem,
        records: Vec<VulnerabilityRecord>,
        fail: bool,
        seen_since: Arc<Mutex<Vec<DateTime<Utc>>>>,
    }

    impl StubFeed {
        fn new(ecosystem: Ecosystem, records: Vec<VulnerabilityRecord>) -> Self {
            Self {
                ecosystem,
                records,
                fail: false,
                seen_since: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn failing(ecosystem: Ecosystem) -> Self {
            Self {
                fail: true,
                ..Self::new(ecosystem, Vec::new())
            }
        }

        fn since_log(&self) -> Arc<Mutex<Vec<DateTime<Utc>>>> {
            Arc::clone(&self.seen_since)
        }
    }

    #[async_trait]
    impl FeedClient for StubFeed {
        fn ecosystem(&self) -> Ecosystem {
            self.ecosystem.clone()
        }

        async fn modified_since(
            &self,
            since: DateTime<Utc>,
        ) -> Result<Vec<VulnerabilityRecord>> {
            self.seen_since.lock().unwrap().push(since);
            if self.fail {
                return Err(SynkaError::Feed {
                    ecosystem: self.ecosystem.clone(),
                    message: "503 from feed".to_string(),
                });
            }
            Ok(self.records.clone())
        }
    }

    struct CatalogSolver {
        ecosystem: Ecosystem,
        versions: Vec<String>,
    }

    impl CatalogSolver {
        fn new(ecosystem: Ecosystem, versions: &[&str]) -> Self {
            Self {
                ecosystem,
                versions: versions.iter().map(|v| v.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl VersionSolver for CatalogSolver {
        fn ecosystem(&self) -> Ecosystem {
            self.ecosystem.clone()
        }

        async fn solve(&self, _package: &str, range: &str) -> Result<Vec<String>> {
            let range = RangeSpec::parse(range)?;
            Ok(self
                .versions
                .iter()
                .filter(|v| range.matches_str(v))
                .cloned()
                .collect())
        }
    }

    fn record(name: &str, expressions: &[&str]) -> VulnerabilityRecord {
        VulnerabilityRecord {
            name: name.to_string(),
            advisories: vec![Advisory {
                id: format!("OSSINDEX-{}", name),
                title: None,
                versions: expressions.iter().map(|e| e.to_string()).collect(),
            }],
            updated_at: Utc::now(),
        }
    }

    fn left_pad_orchestrator(
        store: Arc<dyn VulnDbStore>,
    ) -> (SyncOrchestrator, Arc<Mutex<Vec<DateTime<Utc>>>>) {
        let mut registry = PluginRegistry::new();
        let feed = StubFeed::new(
            Ecosystem::npm(),
            vec![record("left-pad", &["<1.1.0 | 1.2.0"])],
        );
        let since_log = feed.since_log();
        registry.register_feed_client(Box::new(feed));
        registry.register_version_solver(Box::new(CatalogSolver::new(
            Ecosystem::npm(),
            &["1.0.0", "1.1.0", "1.2.0"],
        )));

        let mut analyses = MemoryAnalysisStore::new();
        analyses.record(&Ecosystem::npm(), "left-pad", "1.0.0", 2);
        analyses.record(&Ecosystem::npm(), "left-pad", "1.2.0", 0);

        let orchestrator = SyncOrchestrator::new(
            registry,
            store,
            Box::new(NoopRefresher),
            Arc::new(analyses),
        );
        (orchestrator, since_log)
    }

    #[tokio::test]
    async fn test_left_pad_only_already_scanned() {
        let store = Arc::new(MemoryVulnDbStore::new());
        let (orchestrator, _) = left_pad_orchestrator(store);

        let report = orchestrator.run(SyncOptions::default()).await.unwrap();

        assert_eq!(
            report.modified,
            vec![ResolvedTarget::new(Ecosystem::npm(), "left-pad", "1.0.0")]
        );
        assert_eq!(report.records_considered, 1);
        assert_eq!(report.expressions_failed, 0);
    }

    #[tokio::test]
    async fn test_left_pad_all_versions() {
        let store = Arc::new(MemoryVulnDbStore::new());
        let (orchestrator, _) = left_pad_orchestrator(store);

        let report = orchestrator
            .run(SyncOptions {
                only_already_scanned: false,
                ..SyncOptions::default()
            })
            .await
            .unwrap();

        let versions: HashSet<&str> = report.modified.iter().map(|t| t.version.as_str()).collect();
        assert_eq!(versions, HashSet::from(["1.0.0", "1.2.0"]));
    }

    #[tokio::test]
    async fn test_watermark_advances_and_feeds_query_from_previous() {
        let store = Arc::new(MemoryVulnDbStore::new());
        let (orchestrator, since_log) = left_pad_orchestrator(Arc::clone(&store) as Arc<dyn VulnDbStore>);

        orchestrator.run(SyncOptions::default()).await.unwrap();
        let after_first = store.read_watermark().await.unwrap();
        assert!(after_first > DateTime::UNIX_EPOCH);

        orchestrator.run(SyncOptions::default()).await.unwrap();
        let after_second = store.read_watermark().await.unwrap();
        assert!(after_second >= after_first);

        let queried = since_log.lock().unwrap().clone();
        assert_eq!(queried[0], DateTime::UNIX_EPOCH);
        // The second run queries from the first run's persisted watermark.
        assert_eq!(queried[1], after_first);
    }

    #[tokio::test]
    async fn test_ignore_modification_time_queries_epoch_but_still_advances() {
        let seeded = Utc::now();
        let store = Arc::new(MemoryVulnDbStore::with_watermark(seeded));
        let (orchestrator, since_log) = left_pad_orchestrator(Arc::clone(&store) as Arc<dyn VulnDbStore>);

        let report = orchestrator
            .run(SyncOptions {
                ignore_modification_time: true,
                ..SyncOptions::default()
            })
            .await
            .unwrap();

        assert_eq!(report.previous_sync, seeded);
        assert_eq!(report.window_start, DateTime::UNIX_EPOCH);
        assert_eq!(since_log.lock().unwrap()[0], DateTime::UNIX_EPOCH);
        // The persisted watermark advanced exactly as in a normal run.
        assert!(store.read_watermark().await.unwrap() >= seeded);
    }

    #[tokio::test]
    async fn test_duplicate_resolutions_collapse() {
        let mut registry = PluginRegistry::new();
        // Two records for the same package whose ranges overlap on 1.0.0.
        let feed = StubFeed::new(
            Ecosystem::npm(),
            vec![
                record("left-pad", &["<1.1.0"]),
                record("left-pad", &["<=1.0.0"]),
            ],
        );
        registry.register_feed_client(Box::new(feed));
        registry.register_version_solver(Box::new(CatalogSolver::new(
            Ecosystem::npm(),
            &["1.0.0"],
        )));

        let orchestrator = SyncOrchestrator::new(
            registry,
            Arc::new(MemoryVulnDbStore::new()),
            Box::new(NoopRefresher),
            Arc::new(MemoryAnalysisStore::new()),
        );

        let report = orchestrator
            .run(SyncOptions {
                only_already_scanned: false,
                ..SyncOptions::default()
            })
            .await
            .unwrap();

        assert_eq!(
            report.modified,
            vec![ResolvedTarget::new(Ecosystem::npm(), "left-pad", "1.0.0")]
        );
    }

    #[tokio::test]
    async fn test_malformed_expression_does_not_poison_the_run() {
        let mut registry = PluginRegistry::new();
        let feed = StubFeed::new(
            Ecosystem::npm(),
            vec![
                record("broken", &["garbage range"]),
                record("left-pad", &["<1.1.0"]),
            ],
        );
        registry.register_feed_client(Box::new(feed));
        registry.register_version_solver(Box::new(CatalogSolver::new(
            Ecosystem::npm(),
            &["1.0.0"],
        )));

        let orchestrator = SyncOrchestrator::new(
            registry,
            Arc::new(MemoryVulnDbStore::new()),
            Box::new(NoopRefresher),
            Arc::new(MemoryAnalysisStore::new()),
        );

        let report = orchestrator
            .run(SyncOptions {
                only_already_scanned: false,
                ..SyncOptions::default()
            })
            .await
            .unwrap();

        assert_eq!(report.expressions_failed, 1);
        assert!(report.is_degraded());
        assert_eq!(
            report.modified,
            vec![ResolvedTarget::new(Ecosystem::npm(), "left-pad", "1.0.0")]
        );
    }

    #[tokio::test]
    async fn test_feed_failure_skips_ecosystem_only() {
        let mut registry = PluginRegistry::new();
        registry.register_feed_client(Box::new(StubFeed::failing(Ecosystem::nuget())));
        registry.register_feed_client(Box::new(StubFeed::new(
            Ecosystem::npm(),
            vec![record("left-pad", &["<1.1.0"])],
        )));
        registry.register_version_solver(Box::new(CatalogSolver::new(
            Ecosystem::npm(),
            &["1.0.0"],
        )));

        let orchestrator = SyncOrchestrator::new(
            registry,
            Arc::new(MemoryVulnDbStore::new()),
            Box::new(NoopRefresher),
            Arc::new(MemoryAnalysisStore::new()),
        );

        let report = orchestrator
            .run(SyncOptions {
                only_already_scanned: false,
                ..SyncOptions::default()
            })
            .await
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("nuget"));
        assert_eq!(
            report.modified,
            vec![ResolvedTarget::new(Ecosystem::npm(), "left-pad", "1.0.0")]
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_is_fatal_and_leaves_watermark_alone() {
        let store = Arc::new(MemoryVulnDbStore::new());
        let orchestrator = SyncOrchestrator::new(
            PluginRegistry::new(),
            Arc::clone(&store) as Arc<dyn VulnDbStore>,
            Box::new(FailingRefresher),
            Arc::new(MemoryAnalysisStore::new()),
        );

        let err = orchestrator.run(SyncOptions::default()).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(store.read_watermark().await.unwrap(), DateTime::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn test_refresh_timeout_is_fatal() {
        let orchestrator = SyncOrchestrator::new(
            PluginRegistry::new(),
            Arc::new(MemoryVulnDbStore::new()),
            Box::new(HangingRefresher),
            Arc::new(MemoryAnalysisStore::new()),
        )
        .with_refresh_timeout(Duration::from_millis(20));

        let err = orchestrator.run(SyncOptions::default()).await.unwrap_err();
        assert!(matches!(err, SynkaError::RefreshTimeout { .. }));
    }
}
