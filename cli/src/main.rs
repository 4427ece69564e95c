mod commands;
mod sync;
mod display;

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "synka")]
#[command(about = "Incremental vulnerability re-scan scheduler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    #[command(about = "Run one incremental sync cycle")]
    Sync(commands::Sync),

    #[command(about = "List supported ecosystems")]
    Ecosystems(commands::Ecosystems),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync(cmd) => {
            cmd.run().await?;
        }
        Commands::Ecosystems(cmd) => {
            cmd.run();
        }
    }

    Ok(())
}
