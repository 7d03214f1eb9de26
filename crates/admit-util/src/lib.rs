//! Shared utilities for Admit.
//!
//! Cross-cutting concerns used by the other Admit crates: the unified error
//! type and terminal status lines.

pub mod errors;
pub mod progress;
