use crate::cache::CacheManager;
use crate::error::{Result, SynkaError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin reqwest wrapper shared by the feed and version-catalog clients:
/// bounded retries with exponential backoff, a request timeout, and an
/// optional file-backed response cache.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retries: u32,
    cache: Option<CacheManager>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            retries: DEFAULT_RETRIES,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: CacheManager) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    async fn fetch<T>(&self, url: &str) -> Result<T>
    where
        T: for<'a> Deserialize<'a>,
    {
        for attempt in 0..=self.retries {
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    return response.json().await.map_err(|e| SynkaError::Catalog {
                        registry: url.to_string(),
                        source: e,
                    });
                }
                Ok(response) => {
                    if attempt == self.retries {
                        if let Err(e) = response.error_for_status() {
                            return Err(SynkaError::Catalog {
                                registry: url.to_string(),
                                source: e,
                            });
                        }
                    } else {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(_e) if attempt < self.retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(SynkaError::Catalog {
                        registry: url.to_string(),
                        source: e,
                    });
                }
            }
        }
        unreachable!()
    }

    pub async fn get<T>(&self, url: &str) -> Result<T>
    where
        T: for<'a> Deserialize<'a> + Clone + Serialize,
    {
        if let Some(ref cache) = self.cache {
            let key = crate::cache::sanitize_cache_key(url);

            if let Some(entry) = cache.get::<T>("api", &key).ok().flatten() {
                return Ok(entry.data().clone());
            }

            let result = self.fetch::<T>(url).await?;

            if let Err(e) = cache.set("api", &key, &result) {
                warn!(url, error = %e, "failed to cache API response");
            }

            Ok(result)
        } else {
            self.fetch::<T>(url).await
        }
    }
}
