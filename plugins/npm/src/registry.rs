use semver::Version;
use synka_core::version::parse_version;
use synka_core::Result;

/// Version-catalog client for the npm registry.
///
/// `registry.npmjs.org/{package}` returns the package document whose
/// `versions` object holds every published version.
pub struct NpmRegistryClient {
    client: synka_core::HttpClient,
    base_url: String,
}

impl NpmRegistryClient {
    pub fn new() -> Self {
        Self {
            client: synka_core::HttpClient::new(),
            base_url: "https://registry.npmjs.org".to_string(),
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

    /// All published versions of `package`, oldest first.
    pub async fn all_versions(&self, package: &str) -> Result<Vec<String>> {
        // Scoped packages keep their `@scope/` prefix but the slash must be
        // escaped in the registry URL.
        let url = format!("{}/{}", self.base_url, package.replace('/', "%2F"));

        let document: serde_json::Value = self.client.get(&url).await?;
        Ok(versions_from_document(&document))
    }
}

impl Default for NpmRegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

fn versions_from_document(document: &serde_json::Value) -> Vec<String> {
    let mut versions: Vec<String> = document
        .get("versions")
        .and_then(|v| v.as_object())
        .map(|versions| versions.keys().cloned().collect())
        .unwrap_or_default();

    versions.sort_by(|a, b| match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => Version::cmp(&va, &vb),
        _ => a.cmp(b),
    });
    versions
}
