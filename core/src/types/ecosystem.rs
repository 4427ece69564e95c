use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Package ecosystem tag.
///
/// Kept open-ended on purpose: which ecosystems are actually supported is
/// decided by what gets registered in the [`PluginRegistry`], not by this
/// type. Tags are normalized to lowercase so `"NPM"` and `"npm"` compare
/// equal everywhere.
///
/// [`PluginRegistry`]: crate::plugin::PluginRegistry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ecosystem(String);

impl Ecosystem {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_lowercase())
    }

    pub fn npm() -> Self {
        Self::new("npm")
    }

    pub fn nuget() -> Self {
        Self::new("nuget")
    }

    pub fn maven() -> Self {
        Self::new("maven")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ecosystem {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Ecosystem {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}
