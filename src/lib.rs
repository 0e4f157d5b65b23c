//! # cmdchain
//!
//! A configurable chain-of-command engine. Chains are ordered lists of steps grouped into
//! catalogs; each step runs a command (looked up by type name in a [`CommandRegistry`]) or
//! another chain. Commands steer execution through the [`ChainResult`] they return:
//! continue, fail, abort, restart the chain, redo the step, or jump to another step.
//!
//! ```no_run
//! use cmdchain::ChainManager;
//!
//! # fn main() -> Result<(), cmdchain::ConfigError> {
//! let mut builder = ChainManager::builder();
//! builder.load_paths("chain_config.toml")?;
//! let manager = builder.build()?;
//!
//! let mut context = manager.create_context();
//! context.set_attribute("answer", 1);
//! let result = manager.execute_chain("Math/Calc", &mut context);
//! println!("{} -> {:?}", result, context.get_attribute("answer"));
//! # Ok(())
//! # }
//! ```

/// Command-line interface of the `cmdchain` binary.
pub mod cli;
pub mod commands;
/// File names, environment variables and key names.
pub mod constants;
/// The engine: results, commands, chains, catalogs and the manager.
pub mod core;
/// Serde models of the configuration file.
pub mod models;

pub use crate::core::{
    catalog::Catalog,
    chain::{Chain, StepError},
    chain_manager::{ChainManager, EngineOptions},
    command::{Command, CommandError, CommandFactory, CommandProperties, CommandRegistry},
    command_config::{CommandConfig, StepKind},
    config_loader::{ChainManagerBuilder, ConfigError, ConfigFormat},
    context::ChainContext,
    result::{ChainResult, ResultCode},
};
