use clap::Parser;

mod commands;
mod progress;

use commands::Commands;

#[derive(Parser)]
#[command(name = "reprodex")]
#[command(about = "Reproducible-build fixers for Android release artifacts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
