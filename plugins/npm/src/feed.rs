use async_trait::async_trait;
use chrono::{DateTime, Utc};
use synka_core::plugin::FeedClient;
use synka_core::types::{Ecosystem, VulnerabilityRecord};
use synka_core::{OssIndexClient, Result};

const DEFAULT_FEED_URL: &str = "https://ossindex.sonatype.org";

/// Feed client for npm records.
pub struct NpmFeedClient {
    client: OssIndexClient,
}

impl NpmFeedClient {
    pub fn new() -> Self {
        Self {
            client: OssIndexClient::new(DEFAULT_FEED_URL),
        }
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: OssIndexClient::new(base_url),
        }
    }

    pub fn with_cache(self, cache: synka_core::CacheManager) -> Self {
        Self {
            client: self.client.with_cache(cache),
        }
    }
}

impl Default for NpmFeedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedClient for NpmFeedClient {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::npm()
    }

    async fn modified_since(&self, since: DateTime<Utc>) -> Result<Vec<VulnerabilityRecord>> {
        self.client.packages_since(&Ecosystem::npm(), since).await
    }
}
