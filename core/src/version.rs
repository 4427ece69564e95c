use semver::{Version, VersionReq};

use crate::error::{Result, SynkaError};

/// A parsed version-range expression: a disjunction of comparator clauses.
///
/// The grammar is the npm constraint syntax, which is also what the feed
/// attaches to nuget records: `||` separates alternatives, whitespace inside
/// an alternative means "and", hyphen ranges (`1.2.3 - 2.0.0`) and wildcards
/// (`*`, `1.x`) are accepted. A bare version is an exact match, not a caret
/// requirement.
///
/// Expressions must already be in canonical form; the `" | "` work-around
/// separator is normalized away by the resolver before parsing.
#[derive(Debug, Clone)]
pub struct RangeSpec {
    clauses: Vec<VersionReq>,
}

impl RangeSpec {
    pub fn parse(expression: &str) -> Result<Self> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(SynkaError::Range {
                expression: expression.to_string(),
                message: "empty range expression".to_string(),
            });
        }

        let mut clauses = Vec::new();
        for alternative in expression.split("||") {
            let alternative = alternative.trim();
            if alternative.is_empty() {
                return Err(SynkaError::Range {
                    expression: expression.to_string(),
                    message: "empty alternative in disjunction".to_string(),
                });
            }

            let translated = translate_clause(alternative)?;
            let req = VersionReq::parse(&translated).map_err(|e| SynkaError::Range {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;
            clauses.push(req);
        }

        Ok(Self { clauses })
    }

    /// True if any alternative of the disjunction matches.
    pub fn matches(&self, version: &Version) -> bool {
        self.clauses.iter().any(|req| req.matches(version))
    }

    /// Lenient variant for raw catalog strings: pads partial versions and
    /// strips a `v` prefix. An unparseable version never matches.
    pub fn matches_str(&self, version: &str) -> bool {
        match parse_version(version) {
            Some(v) => self.matches(&v),
            None => false,
        }
    }
}

/// Rewrites one npm-style alternative into the comma-separated comparator
/// list `semver::VersionReq` understands.
fn translate_clause(clause: &str) -> Result<String> {
    // Hyphen range: inclusive on both ends.
    if let Some((low, high)) = clause.split_once(" - ") {
        let low = strip_v(low.trim());
        let high = strip_v(high.trim());
        if low.is_empty() || high.is_empty() {
            return Err(SynkaError::Range {
                expression: clause.to_string(),
                message: "incomplete hyphen range".to_string(),
            });
        }
        return Ok(format!(">={}, <={}", low, high));
    }

    let tokens = merge_detached_operators(clause);
    let mut comparators = Vec::with_capacity(tokens.len());
    for token in tokens {
        comparators.push(translate_token(&token)?);
    }
    Ok(comparators.join(", "))
}

/// npm allows a space between the operator and its version (`>= 1.0.0`);
/// rejoin those so every token is self-contained.
fn merge_detached_operators(clause: &str) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for part in clause.split_whitespace() {
        match merged.last() {
            Some(last) if is_operator(last) => {
                let last = merged.pop().unwrap();
                merged.push(format!("{}{}", last, part));
            }
            _ => merged.push(part.to_string()),
        }
    }
    merged
}

fn is_operator(token: &str) -> bool {
    matches!(token, "<" | "<=" | ">" | ">=" | "=" | "^" | "~")
}

fn translate_token(token: &str) -> Result<String> {
    let (operator, version) = split_operator(token);
    let version = strip_v(version);

    if version.is_empty() {
        return Err(SynkaError::Range {
            expression: token.to_string(),
            message: "operator without version".to_string(),
        });
    }

    // Wildcards pass through; semver accepts `*`, `1.x` and `1.2.x`.
    if version == "*" || version.split('.').any(|p| p == "x" || p == "X" || p == "*") {
        return Ok(format!("{}{}", operator, version));
    }

    // A bare version is an exact requirement in this grammar. `=1.2` keeps
    // npm's partial-version meaning (any 1.2.z) under semver's `=` rules.
    if operator.is_empty() {
        return Ok(format!("={}", version));
    }

    Ok(format!("{}{}", operator, version))
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in ["<=", ">=", "<", ">", "=", "^", "~"] {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest.trim());
        }
    }
    ("", token)
}

fn strip_v(version: &str) -> &str {
    match version.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => version,
    }
}

fn pad_version(version: &str) -> String {
    let parts: Vec<&str> = version.split('.').collect();
    match parts.len() {
        1 => format!("{}.0.0", version),
        2 => format!("{}.0", version),
        _ => version.to_string(),
    }
}

/// Parses a concrete version string, tolerating `v` prefixes and partial
/// versions like `1` or `5.0`.
pub fn parse_version(version: &str) -> Option<Version> {
    let normalized = pad_version(strip_v(version.trim()));
    Version::parse(&normalized).ok()
}
