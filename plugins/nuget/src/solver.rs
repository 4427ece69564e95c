use async_trait::async_trait;
use synka_core::plugin::VersionSolver;
use synka_core::types::Ecosystem;
use synka_core::{RangeSpec, Result};

use crate::registry::NuGetCatalogClient;

/// Solves range expressions against a package's published NuGet versions.
///
/// The feed attaches npm-grammar ranges to nuget records as well, so the
/// shared [`RangeSpec`] grammar applies here too. Four-part legacy versions
/// do not parse as semver and therefore never match.
pub struct NuGetVersionSolver {
    catalog: NuGetCatalogClient,
}

impl NuGetVersionSolver {
    pub fn new() -> Self {
        Self {
            catalog: NuGetCatalogClient::new(),
        }
    }

    pub fn with_catalog(catalog: NuGetCatalogClient) -> Self {
        Self { catalog }
    }
}

impl Default for NuGetVersionSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionSolver for NuGetVersionSolver {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::nuget()
    }

    async fn solve(&self, package: &str, range: &str) -> Result<Vec<String>> {
        let range = RangeSpec::parse(range)?;
        let versions = self.catalog.all_versions(package).await?;
        Ok(versions
            .into_iter()
            .filter(|v| range.matches_str(v))
            .collect())
    }
}
