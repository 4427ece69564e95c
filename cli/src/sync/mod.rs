use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use synka_core::{
    CommandRefresher, FileAnalysisStore, FileVulnDbStore, PluginRegistry, SyncOptions,
    SyncOrchestrator, SyncReport,
};

#[cfg(feature = "npm")]
use synka_plugin_npm::NpmPlugin;

#[cfg(feature = "nuget")]
use synka_plugin_nuget::NuGetPlugin;

pub async fn run_sync(
    db_dir: PathBuf,
    depcheck: PathBuf,
    options: SyncOptions,
) -> Result<SyncReport> {
    let mut registry = PluginRegistry::new();
    let cache = synka_core::cache::create_cache_manager_from_env();

    #[cfg(feature = "npm")]
    {
        match &cache {
            Some(cache) => registry.register_plugin(NpmPlugin::with_cache(cache.clone())),
            None => registry.register_plugin(NpmPlugin::new()),
        }
    }

    #[cfg(feature = "nuget")]
    {
        match &cache {
            Some(cache) => registry.register_plugin(NuGetPlugin::with_cache(cache.clone())),
            None => registry.register_plugin(NuGetPlugin::new()),
        }
    }

    let store = Arc::new(FileVulnDbStore::new(&db_dir));
    let analyses = Arc::new(FileAnalysisStore::load(&db_dir.join("analyses.json"))?);
    let refresher = Box::new(CommandRefresher::new(depcheck));

    let orchestrator = SyncOrchestrator::new(registry, store, refresher, analyses);
    let report = orchestrator.run(options).await?;
    Ok(report)
}
