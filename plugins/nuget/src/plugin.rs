use synka_core::types::Ecosystem;

use crate::feed::NuGetFeedClient;
use crate::registry::NuGetCatalogClient;
use crate::solver::NuGetVersionSolver;

pub struct NuGetPlugin {
    cache: Option<synka_core::CacheManager>,
}

impl NuGetPlugin {
    pub fn new() -> Self {
        Self { cache: None }
    }

    pub fn with_cache(cache: synka_core::CacheManager) -> Self {
        Self { cache: Some(cache) }
    }
}

impl Default for NuGetPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl synka_core::SyncPlugin for NuGetPlugin {
    fn name(&self) -> &'static str {
        "nuget"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::nuget()
    }

    fn create_feed_client(&self) -> Option<Box<dyn synka_core::FeedClient>> {
        let client = match &self.cache {
            Some(cache) => NuGetFeedClient::new().with_cache(cache.clone()),
            None => NuGetFeedClient::new(),
        };
        Some(Box::new(client))
    }

    fn create_version_solver(&self) -> Option<Box<dyn synka_core::VersionSolver>> {
        let catalog = match &self.cache {
            Some(cache) => NuGetCatalogClient::new().with_cache(cache.clone()),
            None => NuGetCatalogClient::new(),
        };
        Some(Box::new(NuGetVersionSolver::with_catalog(catalog)))
    }
}
