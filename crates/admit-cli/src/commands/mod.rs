//! Command dispatch and handler modules.

mod replay;
mod status;
mod tree;

use std::path::PathBuf;

use admit_core::config::GlobalConfig;
use admit_util::errors::AdmitError;
use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli, config: &GlobalConfig) -> Result<()> {
    let format = cli.format.unwrap_or(config.output.format);
    let plan = plan_path(cli.plan)?;
    tracing::debug!(plan = %plan.display(), %format, "resolved plan");

    match cli.command {
        Command::Replay => replay::exec(&plan, format),
        Command::Status => status::exec(&plan, format),
        Command::Tree { depth, invert } => tree::exec(&plan, depth, invert, format),
    }
}

fn plan_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(AdmitError::Io)?;
    admit_ops::locate_plan(explicit.as_deref(), &cwd)
}
