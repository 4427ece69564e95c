use crate::error::Result;
use crate::types::{Ecosystem, VulnerabilityRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Queries the vulnerability feed for one ecosystem.
///
/// A query is finite and restartable: calling `modified_since` again with the
/// same timestamp re-yields the same window.
#[async_trait]
pub trait FeedClient: Send + Sync {
    fn ecosystem(&self) -> Ecosystem;

    /// Records whose last-modified time is at or after `since`.
    async fn modified_since(&self, since: DateTime<Utc>) -> Result<Vec<VulnerabilityRecord>>;
}

/// Solves a version-range expression against an ecosystem's full catalog of
/// known versions.
#[async_trait]
pub trait VersionSolver: Send + Sync {
    fn ecosystem(&self) -> Ecosystem;

    /// Every known version of `package` satisfying `range`.
    ///
    /// `range` is already in the ecosystem's canonical grammar; callers
    /// normalize non-standard separators first. May fail for malformed
    /// ranges or unknown packages.
    async fn solve(&self, package: &str, range: &str) -> Result<Vec<String>>;
}

/// Reports how many prior analyses exist for a package version.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn analysis_count(
        &self,
        ecosystem: &Ecosystem,
        package: &str,
        version: &str,
    ) -> Result<u64>;
}

/// An ecosystem integration: the feed client and version solver pair the
/// sync engine dispatches to.
pub trait SyncPlugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn ecosystem(&self) -> Ecosystem;

    fn create_feed_client(&self) -> Option<Box<dyn FeedClient>> {
        None
    }
    fn create_version_solver(&self) -> Option<Box<dyn VersionSolver>> {
        None
    }
}

/// Capability lookup by ecosystem tag.
///
/// Supporting a new ecosystem means registering another plugin; nothing in
/// the engine matches on concrete ecosystems.
pub struct PluginRegistry {
    feed_clients: Vec<(Ecosystem, Box<dyn FeedClient>)>,
    version_solvers: Vec<(Ecosystem, Box<dyn VersionSolver>)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            feed_clients: Vec::new(),
            version_solvers: Vec::new(),
        }
    }

    pub fn register_feed_client(&mut self, client: Box<dyn FeedClient>) {
        self.feed_clients.push((client.ecosystem(), client));
    }

    pub fn register_version_solver(&mut self, solver: Box<dyn VersionSolver>) {
        self.version_solvers.push((solver.ecosystem(), solver));
    }

    pub fn register_plugin<P: SyncPlugin + 'static>(&mut self, plugin: P) {
        if let Some(client) = plugin.create_feed_client() {
            self.register_feed_client(client);
        }
        if let Some(solver) = plugin.create_version_solver() {
            self.register_version_solver(solver);
        }
    }

    pub fn feed_client(&self, ecosystem: &Ecosystem) -> Option<&dyn FeedClient> {
        self.feed_clients
            .iter()
            .find(|(e, _)| e == ecosystem)
            .map(|(_, c)| c.as_ref())
    }

    pub fn version_solver(&self, ecosystem: &Ecosystem) -> Option<&dyn VersionSolver> {
        self.version_solvers
            .iter()
            .find(|(e, _)| e == ecosystem)
            .map(|(_, s)| s.as_ref())
    }

    /// Ecosystems with a registered feed client, in registration order.
    pub fn ecosystems(&self) -> Vec<Ecosystem> {
        self.feed_clients.iter().map(|(e, _)| e.clone()).collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
