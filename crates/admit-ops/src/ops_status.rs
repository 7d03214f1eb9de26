//! Operation: offer every module and report what is accepted and what is
//! still waiting, and on which keys.

use std::path::Path;

use admit_core::config::OutputFormat;
use admit_core::plan::Plan;
use serde::Serialize;

use crate::{offer_all, to_json};

/// A module that could not be accepted.
#[derive(Debug, Clone, Serialize)]
pub struct PendingModule {
    pub name: String,
    /// Keys with no accepted provider.
    pub unresolved: Vec<String>,
    /// Unresolved keys that no declared module provides at all.
    pub unprovided: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub accepted: Vec<String>,
    pub pending: Vec<PendingModule>,
}

pub fn status(plan: &Plan) -> StatusReport {
    let queue = offer_all(plan);
    let pending = queue
        .pending()
        .into_iter()
        .map(|name| {
            let unresolved = queue.unresolved(&name);
            let unprovided = unresolved
                .iter()
                .filter(|key| queue.providers_of(key).is_empty())
                .cloned()
                .collect();
            PendingModule {
                name,
                unresolved,
                unprovided,
            }
        })
        .collect();
    StatusReport {
        accepted: queue.accepted(),
        pending,
    }
}

pub fn render_text(report: &StatusReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("Accepted ({}):\n", report.accepted.len()));
    for name in &report.accepted {
        output.push_str(&format!("  {name}\n"));
    }
    if report.pending.is_empty() {
        return output;
    }
    output.push_str(&format!("Pending ({}):\n", report.pending.len()));
    for module in &report.pending {
        let waiting: Vec<String> = module
            .unresolved
            .iter()
            .map(|key| {
                if module.unprovided.contains(key) {
                    format!("{key} (no provider)")
                } else {
                    key.clone()
                }
            })
            .collect();
        output.push_str(&format!("  {} waiting on: {}\n", module.name, waiting.join(", ")));
    }
    output
}

/// Load the plan at `plan_path` and print its acceptance status.
pub fn run(plan_path: &Path, format: OutputFormat) -> miette::Result<()> {
    let plan = Plan::from_path(plan_path)?;
    let report = status(&plan);
    match format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", to_json(&report)?),
    }
    if !report.pending.is_empty() {
        admit_util::progress::status_warn(
            "Pending",
            &format!("{} of {} modules", report.pending.len(), plan.modules.len()),
        );
    }
    Ok(())
}
