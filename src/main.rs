//! CK Script Runner - runs the configured fixed script and prints its result.

use anyhow::{Context, Result};
use ck_script_runner::{Runner, RunnerConfig};
use tracing_subscriber::EnvFilter;

fn init_tracing(debug: bool) {
    let default_directive = if debug {
        "ck_script_runner=debug"
    } else {
        "ck_script_runner=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let config = RunnerConfig::from_env().context("failed to load runner configuration")?;
    init_tracing(config.debug);

    let runner = Runner::new(config)?;
    let report = runner.run()?;

    println!("{}", report.value);
    Ok(())
}
