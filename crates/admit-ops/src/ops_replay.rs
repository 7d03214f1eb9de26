//! Operation: replay a plan's script through the queue step by step.

use std::path::Path;

use admit_core::config::OutputFormat;
use admit_core::plan::{Plan, Step};
use serde::Serialize;

use crate::{offer_module, ModuleQueue};

/// What a single script step changed.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: &'static str,
    pub module: String,
    /// Newly accepted modules, in acceptance order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accepted: Vec<String>,
    /// Deaccepted modules, dependents first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub retracted: Vec<String>,
}

/// The result of replaying a whole script.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepOutcome>,
    /// Modules accepted once the script has finished, in registration order.
    pub accepted: Vec<String>,
    /// Modules still pending once the script has finished.
    pub pending: Vec<String>,
}

/// Run every step of the plan's script against a fresh queue.
pub fn replay(plan: &Plan) -> ReplayReport {
    let queue = ModuleQueue::new();
    let mut steps = Vec::new();

    for step in plan.script() {
        let outcome = match &step {
            Step::Offer(name) => {
                let accepted = match plan.module(name) {
                    Some(module) => offer_module(&queue, module),
                    None => Vec::new(),
                };
                StepOutcome {
                    step: step.verb(),
                    module: name.clone(),
                    accepted,
                    retracted: Vec::new(),
                }
            }
            Step::Retract(name) => StepOutcome {
                step: step.verb(),
                module: name.clone(),
                accepted: Vec::new(),
                retracted: queue.retract(name),
            },
        };
        tracing::info!(
            step = outcome.step,
            module = %outcome.module,
            accepted = outcome.accepted.len(),
            retracted = outcome.retracted.len(),
            "replayed step"
        );
        steps.push(outcome);
    }

    ReplayReport {
        steps,
        accepted: queue.accepted(),
        pending: queue.pending(),
    }
}

/// Render a replay report as plain text.
pub fn render_text(report: &ReplayReport) -> String {
    let mut output = String::new();
    for outcome in &report.steps {
        output.push_str(&format!("{} {}\n", outcome.step, outcome.module));
        if outcome.accepted.is_empty() && outcome.retracted.is_empty() {
            output.push_str("  (no change)\n");
        }
        for name in &outcome.accepted {
            output.push_str(&format!("  + {name}\n"));
        }
        for name in &outcome.retracted {
            output.push_str(&format!("  - {name}\n"));
        }
    }
    output
}

/// Load the plan at `plan_path`, replay it and print the result.
pub fn run(plan_path: &Path, format: OutputFormat) -> miette::Result<()> {
    let plan = Plan::from_path(plan_path)?;
    admit_util::progress::status("Replaying", &plan_path.display().to_string());

    let report = replay(&plan);
    match format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", crate::to_json(&report)?),
    }

    admit_util::progress::status_info(
        "Finished",
        &format!(
            "{} steps, {} accepted, {} pending",
            report.steps.len(),
            report.accepted.len(),
            report.pending.len()
        ),
    );
    Ok(())
}
