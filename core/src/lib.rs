//! Synka Core Library
//!
//! Incremental vulnerability-feed synchronization: figures out which
//! (ecosystem, package, version) tuples need (re-)scanning because
//! vulnerability records changed since the last sync.

pub mod types;
pub mod plugin;
pub mod error;
pub mod http;
pub mod cache;
pub mod ossindex;
pub mod version;
pub mod resolver;
pub mod store;
pub mod refresh;
pub mod report;
pub mod sync;

pub use types::*;
pub use error::{Result, SynkaError};
pub use plugin::{AnalysisStore, FeedClient, PluginRegistry, SyncPlugin, VersionSolver};
pub use report::{EcosystemSyncResult, SyncReport};
pub use sync::{SyncOptions, SyncOrchestrator};
pub use resolver::VersionRangeResolver;
pub use store::{FileAnalysisStore, FileVulnDbStore, MemoryAnalysisStore, MemoryVulnDbStore, VulnDbStore};
pub use refresh::{CommandRefresher, OfflineRefresher};
pub use http::HttpClient;
pub use cache::{CacheEntry, CacheManager};
pub use ossindex::OssIndexClient;
pub use version::RangeSpec;
