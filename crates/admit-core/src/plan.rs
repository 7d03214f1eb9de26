use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use admit_util::errors::AdmitError;

/// File name of an activation plan.
pub const PLAN_FILE: &str = "Admit.toml";

/// The parsed representation of an `Admit.toml` file.
///
/// Modules declare what they provide, require and need; steps are an ordered
/// script of offers and retractions to feed through the queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleDecl>,

    #[serde(default, rename = "step")]
    pub steps: Vec<StepDecl>,
}

/// A module declaration from a `[[module]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub needs: Vec<String>,
}

/// A raw `[[step]]` table. Exactly one of the fields must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retract: Option<String>,
}

/// A validated script step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Offer(String),
    Retract(String),
}

impl Step {
    pub fn module(&self) -> &str {
        match self {
            Step::Offer(name) | Step::Retract(name) => name,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Step::Offer(_) => "offer",
            Step::Retract(_) => "retract",
        }
    }
}

impl Plan {
    /// Load, parse and validate an `Admit.toml` file.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AdmitError::Plan {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_str(&content)
    }

    /// Parse and validate an `Admit.toml` from a string.
    pub fn from_str(content: &str) -> miette::Result<Self> {
        let plan: Plan = toml::from_str(content).map_err(|e| AdmitError::Plan {
            message: format!("Failed to parse {PLAN_FILE}: {e}"),
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Locate `Admit.toml` in `start` or any of its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(PLAN_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Check module names are present and unique and every step names a
    /// declared module with exactly one action.
    pub fn validate(&self) -> Result<(), AdmitError> {
        let mut names = HashSet::new();
        for (i, module) in self.modules.iter().enumerate() {
            if module.name.trim().is_empty() {
                return Err(AdmitError::Plan {
                    message: format!("module #{} has an empty name", i + 1),
                });
            }
            if !names.insert(module.name.as_str()) {
                return Err(AdmitError::Plan {
                    message: format!("module '{}' is declared more than once", module.name),
                });
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            let name = match (&step.offer, &step.retract) {
                (Some(name), None) | (None, Some(name)) => name,
                _ => {
                    return Err(AdmitError::Plan {
                        message: format!(
                            "step #{} must set exactly one of `offer` or `retract`",
                            i + 1
                        ),
                    })
                }
            };
            if !names.contains(name.as_str()) {
                return Err(AdmitError::Plan {
                    message: format!("step #{} refers to undeclared module '{name}'", i + 1),
                });
            }
        }
        Ok(())
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDecl> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// The script to run: the declared steps, or one offer per module in
    /// declaration order when no steps are declared.
    pub fn script(&self) -> Vec<Step> {
        if self.steps.is_empty() {
            return self
                .modules
                .iter()
                .map(|m| Step::Offer(m.name.clone()))
                .collect();
        }
        self.steps
            .iter()
            .filter_map(|step| match (&step.offer, &step.retract) {
                (Some(name), _) => Some(Step::Offer(name.clone())),
                (None, Some(name)) => Some(Step::Retract(name.clone())),
                (None, None) => None,
            })
            .collect()
    }
}
