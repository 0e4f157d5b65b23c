// src/cli/handlers/mod.rs

// This module contains the logic for each CLI action.

/// `check`: validates the configuration.
pub mod check;
/// Helpers shared by the handlers.
pub mod commons;
/// `list`: prints the catalog tree.
pub mod list;
/// `run`: executes chains.
pub mod run;
/// `types`: lists command types.
pub mod types;
