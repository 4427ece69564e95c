use serde::{Deserialize, Serialize};
use synka_core::Result;

/// Version-catalog client for the NuGet flat-container API.
///
/// `api.nuget.org/v3-flatcontainer/{id}/index.json` lists every published
/// version of a package; package ids are lowercased in the URL.
pub struct NuGetCatalogClient {
    client: synka_core::HttpClient,
    base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FlatContainerIndex {
    #[serde(default)]
    versions: Vec<String>,
}

impl NuGetCatalogClient {
    pub fn new() -> Self {
        Self {
            client: synka_core::HttpClient::new(),
            base_url: "https://api.nuget.org".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_cache(mut self, cache: synka_core::CacheManager) -> Self {
        self.client = synka_core::HttpClient::with_cache(self.client, cache);
        self
    }

    /// All published versions of `package`, in registration order.
    pub async fn all_versions(&self, package: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/v3-flatcontainer/{}/index.json",
            self.base_url,
            package.to_lowercase()
        );

        let index: FlatContainerIndex = self.client.get(&url).await?;
        Ok(index.versions)
    }
}

impl Default for NuGetCatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_container_index_parse() {
        let index: FlatContainerIndex = serde_json::from_str(
            r#"{"versions": ["12.0.1", "12.0.2", "13.0.1"]}"#,
        )
        .unwrap();
        assert_eq!(index.versions, vec!["12.0.1", "12.0.2", "13.0.1"]);
    }

    #[test]
    fn test_flat_container_index_defaults_to_empty() {
        let index: FlatContainerIndex = serde_json::from_str("{}").unwrap();
        assert!(index.versions.is_empty());
    }
}
