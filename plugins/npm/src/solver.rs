use async_trait::async_trait;
use synka_core::plugin::VersionSolver;
use synka_core::types::Ecosystem;
use synka_core::{RangeSpec, Result};

use crate::registry::NpmRegistryClient;

/// Solves npm range expressions against the package's published versions.
pub struct NpmVersionSolver {
    registry: NpmRegistryClient,
}

impl NpmVersionSolver {
    pub fn new() -> Self {
        Self {
            registry: NpmRegistryClient::new(),
        }
    }

    pub fn with_registry(registry: NpmRegistryClient) -> Self {
        Self { registry }
    }
}

impl Default for NpmVersionSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionSolver for NpmVersionSolver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::npm()
    }

    async fn solve(&self, package: &str, range: &str) -> Result<Vec<String>> {
        let range = RangeSpec::parse(range)?;
        let versions = self.registry.all_versions(package).await?;
        Ok(matching_versions(versions, &range))
    }
}

fn matching_versions(versions: Vec<String>, range: &RangeSpec) -> Vec<String> {
    versions
        .into_iter()
        .filter(|v| range.matches_str(v))
        .collect()
}
