//! CLI argument definitions for Admit.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use admit_core::config::OutputFormat;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "admit",
    version,
    about = "Replay and inspect module activation plans",
    long_about = "Admit feeds the modules of an activation plan (Admit.toml) through an \
                  incremental dependency-acceptance queue and reports which modules are \
                  accepted, in which order, and what is still waiting."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the activation plan (defaults to the nearest Admit.toml)
    #[arg(long, global = true)]
    pub plan: Option<PathBuf>,

    /// Output format: text or json (defaults to the configured format)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the plan's script step by step and show what each step changed
    Replay,

    /// Offer every module and show accepted and pending modules
    Status,

    /// Offer every module and show the activation tree
    Tree {
        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,
        /// Show the modules relying on this module instead
        #[arg(short, long)]
        invert: Option<String>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
