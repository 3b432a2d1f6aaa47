//! Adaptive FX CLI
//!
//! Command-line interface for the adaptive-fx controller.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use adaptive_fx::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Adaptive FX v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Curve {
            device,
            step,
            hysteresis,
        } => commands::curve(device, step, hysteresis, cli.json)?,
        Commands::Simulate {
            device,
            config,
            from,
            to,
            step,
            dwell_ms,
        } => commands::simulate(
            device,
            config.as_deref(),
            from,
            to,
            step,
            dwell_ms,
            cli.json,
        )?,
    }
    Ok(())
}
