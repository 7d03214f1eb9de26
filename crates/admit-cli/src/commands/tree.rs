//! Handler for `admit tree`.

use std::path::Path;

use admit_core::config::OutputFormat;
use miette::Result;

use admit_ops::ops_tree::{self, TreeOptions};

pub fn exec(
    plan: &Path,
    depth: Option<usize>,
    invert: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let opts = TreeOptions { depth, invert };
    ops_tree::run(plan, &opts, format)
}
