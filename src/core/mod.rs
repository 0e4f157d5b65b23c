// src/core/mod.rs

/// Named collections of chains.
pub mod catalog;
pub mod chain;
pub mod chain_manager;
pub mod command;
/// Declarative step descriptions.
pub mod command_config;
pub mod config_loader;
/// Per-execution attribute store.
pub mod context;
/// Text rendering of the catalog tree.
pub mod graph_display;
/// Locating configuration files on disk.
pub mod paths;
/// Step and chain outcomes.
pub mod result;

#[cfg(test)]
pub(crate) mod test_support;
