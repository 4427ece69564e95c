use crate::types::{Ecosystem, ResolvedTarget};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of one incremental sync cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub timestamp: DateTime<Utc>,

    /// Watermark value before this run advanced it.
    pub previous_sync: DateTime<Utc>,

    /// Start of the feed query window; the epoch when modification times
    /// were ignored.
    pub window_start: DateTime<Utc>,

    pub elapsed: u64,

    /// Deduplicated (ecosystem, package, version) tuples needing analysis.
    pub modified: Vec<ResolvedTarget>,

    pub records_considered: usize,

    pub expressions_failed: usize,

    pub ecosystem_results: HashMap<Ecosystem, EcosystemSyncResult>,

    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcosystemSyncResult {
    pub ecosystem: Ecosystem,
    pub records_considered: usize,
    pub expressions_failed: usize,
    pub targets: usize,
    pub errors: Vec<String>,
}

impl EcosystemSyncResult {
    pub fn new(ecosystem: Ecosystem) -> Self {
        Self {
            ecosystem,
            records_considered: 0,
            expressions_failed: 0,
            targets: 0,
            errors: Vec::new(),
        }
    }
}

impl SyncReport {
    pub fn new(previous_sync: DateTime<Utc>, window_start: DateTime<Utc>) -> Self {
        Self {
            timestamp: Utc::now(),
            previous_sync,
            window_start,
            elapsed: 0,
            modified: Vec::new(),
            records_considered: 0,
            expressions_failed: 0,
            ecosystem_results: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_ecosystem_result(&mut self, result: EcosystemSyncResult) {
        self.records_considered += result.records_considered;
        self.expressions_failed += result.expressions_failed;
        self.ecosystem_results
            .insert(result.ecosystem.clone(), result);
    }

    /// True when any ecosystem was skipped or any expression failed; the
    /// `modified` list is then a lower bound, not the complete set.
    pub fn is_degraded(&self) -> bool {
        self.expressions_failed > 0 || !self.warnings.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
