//! Core data types for Admit.
//!
//! Activation plans (`Admit.toml`) describing modules and the script of
//! offers and retractions to run, and the global user configuration.
//!
//! This crate is intentionally free of queue logic.

pub mod config;
pub mod plan;
