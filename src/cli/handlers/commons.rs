// src/cli/handlers/commons.rs

// Shared helpers for the handlers.

use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use serde_json::Value;

use crate::core::{
    chain_manager::{ChainManager, EngineOptions},
    context::ChainContext,
    result::ResultCode,
};

/// Loads the configuration (explicit list, environment, or default file) and builds the manager.
pub fn load_manager(config: Option<&str>, options: EngineOptions) -> Result<ChainManager> {
    let mut builder = ChainManager::builder().with_options(options);
    builder
        .load_default(config)
        .context("Failed to load the chain configuration")?;
    builder
        .build()
        .context("The chain configuration is invalid")
}

/// Parses a `key=value` pair. The value is read as JSON when possible (`10`, `true`,
/// `[1,2]`), otherwise it is kept as plain text.
pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid assignment '{}'. Expected KEY=VALUE.", raw.yellow()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("Invalid assignment '{}'. The key is empty.", raw.yellow()));
    }
    let value = serde_json::from_str(value.trim()).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// A fresh context holding the given attributes.
pub fn seeded_context(manager: &ChainManager, seed: &[(String, Value)]) -> ChainContext {
    let mut context = manager.create_context();
    for (key, value) in seed {
        context.set_attribute(key.as_str(), value.clone());
    }
    context
}

/// Process exit code for a chain outcome: 0 for success, 1 for `FAIL`, 2 for `ABORT`.
pub fn exit_code_for(code: ResultCode) -> i32 {
    match code {
        ResultCode::Fail => 1,
        ResultCode::Abort => 2,
        _ => 0,
    }
}

/// Colors a result code for terminal output.
pub fn paint_code(code: ResultCode) -> colored::ColoredString {
    match code {
        ResultCode::Success => code.as_str().green().bold(),
        ResultCode::Fail => code.as_str().red().bold(),
        ResultCode::Abort => code.as_str().yellow().bold(),
        _ => code.as_str().cyan(),
    }
}
