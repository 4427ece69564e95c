use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vulnerability record for one package, as reported by the feed.
///
/// Records are immutable once constructed; the engine never writes them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    /// Package name in the ecosystem's namespace.
    pub name: String,
    /// Advisories currently attached to the package.
    #[serde(default)]
    pub advisories: Vec<Advisory>,
    /// When the feed last modified this record.
    pub updated_at: DateTime<Utc>,
}

/// A single advisory with the raw version-range expressions it affects.
///
/// The range expressions are free-form strings in the ecosystem's native
/// constraint grammar and stay raw here; normalization happens at
/// resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl VulnerabilityRecord {
    /// All raw range expressions across the record's advisories.
    pub fn range_expressions(&self) -> impl Iterator<Item = &str> {
        self.advisories
            .iter()
            .flat_map(|a| a.versions.iter())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_expressions_flatten_advisories() {
        let record = VulnerabilityRecord {
            name: "left-pad".to_string(),
            advisories: vec![
                Advisory {
                    id: "OSSINDEX-1".to_string(),
                    title: None,
                    versions: vec!["<1.1.0".to_string()],
                },
                Advisory {
                    id: "OSSINDEX-2".to_string(),
                    title: Some("prototype pollution".to_string()),
                    versions: vec!["1.2.0".to_string(), ">=2.0.0 <2.1.0".to_string()],
                },
            ],
            updated_at: Utc::now(),
        };

        let expressions: Vec<&str> = record.range_expressions().collect();
        assert_eq!(expressions, vec!["<1.1.0", "1.2.0", ">=2.0.0 <2.1.0"]);
    }

    #[test]
    fn test_deserialize_missing_advisories() {
        let record: VulnerabilityRecord = serde_json::from_str(
            r#"{"name": "lodash", "updated_at": "2024-03-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(record.advisories.is_empty());
    }
}
