use std::collections::HashSet;

use tracing::debug;

use crate::error::{Result, SynkaError};
use crate::plugin::{AnalysisStore, PluginRegistry};
use crate::types::Ecosystem;

/// Resolves a raw version-range expression to the concrete versions it
/// covers, optionally restricted to versions that have been analyzed before.
///
/// Purely a query: delegates solving to the ecosystem's registered
/// [`VersionSolver`] and filtering to the injected [`AnalysisStore`].
///
/// [`VersionSolver`]: crate::plugin::VersionSolver
pub struct VersionRangeResolver<'a> {
    registry: &'a PluginRegistry,
    analyses: &'a dyn AnalysisStore,
}

impl<'a> VersionRangeResolver<'a> {
    pub fn new(registry: &'a PluginRegistry, analyses: &'a dyn AnalysisStore) -> Self {
        Self { registry, analyses }
    }

    /// Resolves one range expression for one package.
    ///
    /// Any failure — malformed range, unknown package, solver error, analysis
    /// lookup error — comes back as [`SynkaError::Resolution`] carrying the
    /// ecosystem, package and raw expression. Callers are expected to log it
    /// and keep aggregating; a bad expression never aborts a run.
    pub async fn resolve(
        &self,
        ecosystem: &Ecosystem,
        package: &str,
        expression: &str,
        only_already_scanned: bool,
    ) -> Result<HashSet<String>> {
        let normalized = normalize_disjunctions(expression);

        let solver = self.registry.version_solver(ecosystem).ok_or_else(|| {
            resolution_error(ecosystem, package, expression, "no version solver registered")
        })?;

        let solved = solver
            .solve(package, &normalized)
            .await
            .map_err(|e| resolution_error(ecosystem, package, expression, &e.to_string()))?;

        debug!(
            ecosystem = %ecosystem,
            package,
            expression,
            solved = solved.len(),
            "range solved"
        );

        if !only_already_scanned {
            return Ok(solved.into_iter().collect());
        }

        let mut scanned = HashSet::new();
        for version in solved {
            let count = self
                .analyses
                .analysis_count(ecosystem, package, &version)
                .await
                .map_err(|e| resolution_error(ecosystem, package, expression, &e.to_string()))?;
            if count > 0 {
                scanned.insert(version);
            }
        }
        Ok(scanned)
    }
}

/// Canonicalizes the feed's non-standard `" | "` disjunction separator into
/// the grammar's `" || "` before the expression reaches a solver.
pub fn normalize_disjunctions(expression: &str) -> String {
    expression.replace(" | ", " || ")
}

fn resolution_error(
    ecosystem: &Ecosystem,
    package: &str,
    expression: &str,
    message: &str,
) -> SynkaError {
    SynkaError::Resolution {
        ecosystem: ecosystem.clone(),
        package: package.to_string(),
        expression: expression.to_string(),
        message: message.to_string(),
    }
}
