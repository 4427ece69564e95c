use clap::Parser;
use std::path::PathBuf;

use synka_core::SyncOptions;

#[derive(Parser)]
pub struct Sync {
    #[arg(long, help = "Store directory for the watermark and offline database")]
    db_dir: Option<PathBuf>,

    #[arg(
        long,
        help = "Path to the offline database updater (defaults to $SYNKA_DEPCHECK_PATH)"
    )]
    depcheck: Option<PathBuf>,

    #[arg(
        long,
        help = "Emit every matching version, not only already-analyzed ones"
    )]
    all_versions: bool,

    #[arg(long, help = "Query the feed from the beginning of time")]
    full: bool,

    #[arg(long, help = "Output in JSON format")]
    json: bool,
}

impl Sync {
    pub async fn run(&self) -> anyhow::Result<()> {
        let db_dir = self.db_dir.clone().unwrap_or_else(|| PathBuf::from(".synka"));

        let depcheck = self
            .depcheck
            .clone()
            .or_else(|| std::env::var_os("SYNKA_DEPCHECK_PATH").map(PathBuf::from));
        let depcheck = match depcheck {
            Some(path) => path,
            None => anyhow::bail!(
                "no offline database updater configured: pass --depcheck or set SYNKA_DEPCHECK_PATH"
            ),
        };

        let options = SyncOptions {
            only_already_scanned: !self.all_versions,
            ignore_modification_time: self.full,
        };

        let report = super::sync::run_sync(db_dir, depcheck, options).await?;

        if self.json {
            println!("{}", super::display::print_json(&report)?);
        } else {
            super::display::print_report(&report);
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct Ecosystems;

impl Ecosystems {
    pub fn run(&self) {
        println!("Supported ecosystems:");
        #[cfg(feature = "npm")]
        println!("  - npm");
        #[cfg(feature = "nuget")]
        println!("  - nuget");
        println!("  - maven (coming soon)");
    }
}
