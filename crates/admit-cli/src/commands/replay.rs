//! Handler for `admit replay`.

use std::path::Path;

use admit_core::config::OutputFormat;
use miette::Result;

pub fn exec(plan: &Path, format: OutputFormat) -> Result<()> {
    admit_ops::ops_replay::run(plan, format)
}
