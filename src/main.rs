use anyhow::{Context, Result};
use clap::Parser;

use hydromap::app::{Cli, run};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let start = std::time::Instant::now();
    let report = run(&cli)?;

    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &report).context("CLI: Failed to write report")?;
    println!();

    tracing::info!("Finished in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
