//! Admit CLI binary.
//!
//! This is the entry point for the `admit` command-line tool. It loads the
//! global configuration, initializes logging via `tracing`, parses arguments
//! with `clap`, and dispatches to the appropriate command handler.

mod cli;
mod commands;

use admit_core::config::GlobalConfig;
use miette::Result;
use tracing_subscriber::EnvFilter;

const VERBOSE_FILTER: &str = "admit_cli=debug,admit_ops=debug,admit_queue=debug";

fn main() -> Result<()> {
    let args = cli::parse();

    let (config, config_err) = match GlobalConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (GlobalConfig::default(), Some(e)),
    };

    let filter = if args.verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log.level))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = config_err {
        tracing::warn!("Failed to load global config, using defaults: {e}");
    }

    commands::dispatch(args, &config)
}
