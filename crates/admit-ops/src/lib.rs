//! High-level operations wiring CLI commands to the plan loader and the
//! dependency queue.

pub mod ops_replay;
pub mod ops_status;
pub mod ops_tree;

use std::path::{Path, PathBuf};

use admit_core::plan::{ModuleDecl, Plan, PLAN_FILE};
use admit_queue::DependencyQueue;
use admit_util::errors::AdmitError;
use serde::Serialize;

/// The queue as driven by activation plans: module names keyed by capability names.
pub type ModuleQueue = DependencyQueue<String, String>;

/// Resolve the plan to load: `explicit` if given, otherwise the nearest
/// `Admit.toml` in `cwd` or its ancestors.
pub fn locate_plan(explicit: Option<&Path>, cwd: &Path) -> miette::Result<PathBuf> {
    if let Some(path) = explicit {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        if !path.is_file() {
            return Err(AdmitError::Plan {
                message: format!("No plan file at {}", path.display()),
            }
            .into());
        }
        return Ok(path);
    }
    Plan::discover(cwd).ok_or_else(|| {
        AdmitError::Plan {
            message: format!("Could not find {PLAN_FILE} in this directory or any parent"),
        }
        .into()
    })
}

/// Offer a declared module to the queue.
pub fn offer_module(queue: &ModuleQueue, module: &ModuleDecl) -> Vec<String> {
    queue.offer(
        module.name.clone(),
        module.provides.iter().cloned(),
        module.requires.iter().cloned(),
        module.needs.iter().cloned(),
    )
}

/// A queue with every module of the plan offered in declaration order.
pub fn offer_all(plan: &Plan) -> ModuleQueue {
    let queue = ModuleQueue::new();
    for module in &plan.modules {
        offer_module(&queue, module);
    }
    queue
}

/// Pretty-printed JSON for a report.
pub(crate) fn to_json<T: Serialize>(value: &T) -> miette::Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        AdmitError::Generic {
            message: format!("Failed to serialize report: {e}"),
        }
        .into()
    })
}
