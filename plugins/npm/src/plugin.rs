use synka_core::types::Ecosystem;

use crate::feed::NpmFeedClient;
use crate::registry::NpmRegistryClient;
use crate::solver::NpmVersionSolver;

pub struct NpmPlugin {
    cache: Option<synka_core::CacheManager>,
}

impl NpmPlugin {
    pub fn new() -> Self {
        Self { cache: None }
    }

    pub fn with_cache(cache: synka_core::CacheManager) -> Self {
        Self { cache: Some(cache) }
    }
}

impl Default for NpmPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl synka_core::SyncPlugin for NpmPlugin {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::npm()
    }

    fn create_feed_client(&self) -> Option<Box<dyn synka_core::FeedClient>> {
        let client = match &self.cache {
            Some(cache) => NpmFeedClient::new().with_cache(cache.clone()),
            None => NpmFeedClient::new(),
        };
        Some(Box::new(client))
    }

    fn create_version_solver(&self) -> Option<Box<dyn synka_core::VersionSolver>> {
        let registry = match &self.cache {
            Some(cache) => NpmRegistryClient::new().with_cache(cache.clone()),
            None => NpmRegistryClient::new(),
        };
        Some(Box::new(NpmVersionSolver::with_registry(registry)))
    }
}
