//! Operation: display the activation tree.

use std::path::Path;

use admit_core::config::OutputFormat;
use admit_core::plan::Plan;
use admit_queue::{ActivationGraph, EdgeKind};
use serde::Serialize;

use crate::offer_all;

/// Options for `admit tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show dependents instead of dependencies for a single module.
    pub invert: Option<String>,
}

/// One accepted module and the providers it relies on.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub module: String,
    pub dependencies: Vec<TreeLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeLink {
    pub module: String,
    pub key: String,
    pub kind: &'static str,
}

fn kind_name(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Require => "require",
        EdgeKind::Need => "need",
    }
}

/// Build the activation graph for a plan with every module offered.
pub fn activation_graph(plan: &Plan) -> ActivationGraph<String, String> {
    ActivationGraph::from_snapshot(&offer_all(plan).snapshot())
}

/// Flatten the graph into serializable nodes, in registration order.
pub fn nodes(plan: &Plan) -> Vec<TreeNode> {
    let queue = offer_all(plan);
    let graph = ActivationGraph::from_snapshot(&queue.snapshot());
    queue
        .accepted()
        .into_iter()
        .map(|module| {
            let dependencies = graph
                .dependencies_of(&module)
                .into_iter()
                .map(|(provider, edge)| TreeLink {
                    module: provider.clone(),
                    key: edge.key.clone(),
                    kind: kind_name(edge.kind),
                })
                .collect();
            TreeNode {
                module,
                dependencies,
            }
        })
        .collect()
}

/// Modules relying on an accepted module.
#[derive(Debug, Clone, Serialize)]
pub struct InvertedNode {
    pub module: String,
    pub accepted: bool,
    pub dependents: Vec<TreeLink>,
}

/// Modules relying on `module`, with the key they rely on it for.
pub fn dependents(plan: &Plan, module: &str) -> InvertedNode {
    let graph = activation_graph(plan);
    let target = module.to_string();
    let dependents = graph
        .dependents_of(&target)
        .into_iter()
        .map(|(dependent, edge)| TreeLink {
            module: dependent.clone(),
            key: edge.key.clone(),
            kind: kind_name(edge.kind),
        })
        .collect();
    InvertedNode {
        accepted: graph.contains(&target),
        module: target,
        dependents,
    }
}

/// Render [`dependents`] as a one-level tree.
pub fn render_inverted(node: &InvertedNode) -> String {
    if !node.accepted {
        return format!("Module '{}' is not accepted.\n", node.module);
    }
    let mut output = format!("{}\n", node.module);
    let count = node.dependents.len();
    for (i, link) in node.dependents.iter().enumerate() {
        let connector = if i == count - 1 { "└── " } else { "├── " };
        let label = if link.kind == "need" {
            format!("needs {}", link.key)
        } else {
            link.key.clone()
        };
        output.push_str(&format!("{connector}{} ({label})\n", link.module));
    }
    output
}

/// Load the plan at `plan_path` and print its activation tree.
pub fn run(plan_path: &Path, opts: &TreeOptions, format: OutputFormat) -> miette::Result<()> {
    let plan = Plan::from_path(plan_path)?;

    if let Some(ref module) = opts.invert {
        let node = dependents(&plan, module);
        match format {
            OutputFormat::Text => print!("{}", render_inverted(&node)),
            OutputFormat::Json => println!("{}", crate::to_json(&node)?),
        }
        return Ok(());
    }

    match format {
        OutputFormat::Text => {
            let graph = activation_graph(&plan);
            if graph.is_empty() {
                println!("No modules accepted.");
            } else {
                print!("{}", graph.print_tree(opts.depth));
            }
        }
        OutputFormat::Json => println!("{}", crate::to_json(&nodes(&plan))?),
    }
    Ok(())
}
