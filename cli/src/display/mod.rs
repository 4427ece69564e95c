use colored::Colorize;
use synka_core::SyncReport;

pub fn print_report(report: &SyncReport) {
    println!("\n{}", "=".repeat(60));
    println!("Synka Sync Report");
    println!("{}", "=".repeat(60));
    println!("Previous sync: {}", report.previous_sync);
    println!("Query window from: {}", report.window_start);
    println!("Duration: {}ms", report.elapsed);
    println!();

    println!("Summary:");
    println!("  Records considered: {}", report.records_considered);
    println!("  Failed expressions: {}", report.expressions_failed);
    println!("  Versions to (re-)scan: {}", report.modified.len());
    println!();

    if !report.ecosystem_results.is_empty() {
        println!("Per ecosystem:");
        for (ecosystem, result) in &report.ecosystem_results {
            println!(
                "  {}: {} records, {} targets",
                ecosystem, result.records_considered, result.targets
            );
            for error in &result.errors {
                println!("    {}", error.red());
            }
        }
        println!();
    }

    if !report.modified.is_empty() {
        println!("Components to scan:");
        for target in &report.modified {
            println!("  - {}", target);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("{}", "Warnings:".yellow());
        for warning in &report.warnings {
            println!("  - {}", warning.yellow());
        }
        println!();
    }

    if report.is_degraded() {
        println!("{}", "⚠️  Incomplete coverage, see warnings above".yellow());
    }
}

pub fn print_json(report: &SyncReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
