use serde::{Deserialize, Serialize};

use super::ecosystem::Ecosystem;

/// One (ecosystem, package, version) tuple that needs (re-)analysis.
///
/// Uniqueness within a sync run is enforced by collecting targets into a
/// `HashSet`; no ordering is guaranteed across ecosystems or packages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub version: String,
}

impl ResolvedTarget {
    pub fn new(
        ecosystem: Ecosystem,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            ecosystem,
            name: name.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.ecosystem, self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_display_triple() {
        let target = ResolvedTarget::new(Ecosystem::npm(), "left-pad", "1.0.0");
        assert_eq!(target.to_string(), "npm:left-pad:1.0.0");
    }

    #[test]
    fn test_dedup_in_set() {
        let mut set = HashSet::new();
        set.insert(ResolvedTarget::new(Ecosystem::npm(), "left-pad", "1.0.0"));
        set.insert(ResolvedTarget::new(Ecosystem::npm(), "left-pad", "1.0.0"));
        set.insert(ResolvedTarget::new(Ecosystem::nuget(), "left-pad", "1.0.0"));
        assert_eq!(set.len(), 2);
    }
}
