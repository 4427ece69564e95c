use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynkaError};
use crate::types::{Advisory, Ecosystem, VulnerabilityRecord};
use crate::HttpClient;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Client for the vulnerability feed's "packages modified since" API.
///
/// One client serves every ecosystem; plugins wrap it with their own tag and
/// base URL. Pages are fetched eagerly until the feed reports a short page,
/// so a query is finite and restartable by re-issuing it with the same
/// timestamp.
#[derive(Debug, Clone)]
pub struct OssIndexClient {
    client: HttpClient,
    base_url: String,
    page_size: usize,
}

impl OssIndexClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_cache(mut self, cache: crate::CacheManager) -> Self {
        self.client = HttpClient::with_cache(self.client, cache);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// All records for `ecosystem` modified at or after `since`.
    pub async fn packages_since(
        &self,
        ecosystem: &Ecosystem,
        since: DateTime<Utc>,
    ) -> Result<Vec<VulnerabilityRecord>> {
        let mut records = Vec::new();
        let mut page = 0usize;

        loop {
            let url = format!(
                "{}/v2.0/package/{}/since/{}?page={}&size={}",
                self.base_url,
                ecosystem,
                since.timestamp_millis(),
                page,
                self.page_size
            );

            let batch: Vec<OssPackage> =
                self.client.get(&url).await.map_err(|e| SynkaError::Feed {
                    ecosystem: ecosystem.clone(),
                    message: e.to_string(),
                })?;

            let batch_len = batch.len();
            records.extend(batch.into_iter().map(OssPackage::into_record));

            if batch_len < self.page_size {
                return Ok(records);
            }
            page += 1;
        }
    }
}

/// Wire shape of one feed package. Arrays the feed omits deserialize as
/// empty rather than failing the whole page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OssPackage {
    pub name: String,
    #[serde(default)]
    pub vulnerabilities: Vec<OssAdvisory>,
    /// Last-modified time in epoch milliseconds.
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OssAdvisory {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl OssPackage {
    pub fn into_record(self) -> VulnerabilityRecord {
        VulnerabilityRecord {
            name: self.name,
            advisories: self
                .vulnerabilities
                .into_iter()
                .map(|v| Advisory {
                    id: v.id,
                    title: v.title,
                    versions: v.versions,
                })
                .collect(),
            updated_at: DateTime::from_timestamp_millis(self.updated_at)
                .unwrap_or(DateTime::UNIX_EPOCH),
        }
    }
}
