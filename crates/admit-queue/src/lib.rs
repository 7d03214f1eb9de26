//! Incremental dependency-acceptance queue.
//!
//! Values are offered one at a time with the keys they provide, require and
//! need; the queue answers which values become accepted (or stop being
//! accepted) as a result, in dependency order. Keys and values are opaque.
//!
//! This crate is intentionally free of I/O.

pub mod graph;
pub mod queue;

pub use graph::{ActivationEdge, ActivationGraph, EdgeKind};
pub use queue::{DependencyQueue, Descriptor, OfferOutcome, QueueSnapshot, SnapshotEntry};
