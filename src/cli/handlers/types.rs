use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::{cli::GlobalArgs, core::command::CommandRegistry};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Lists the command types available to chains.")]
struct TypesArgs {}

/// Prints every registered command type, one per line.
pub fn handle(args: Vec<String>, _global: &GlobalArgs) -> Result<i32> {
    TypesArgs::try_parse_from(&args)?;
    let registry = CommandRegistry::with_builtins();
    println!("{}", "Registered command types:".bold());
    for name in registry.type_names() {
        println!("  {}", name.cyan());
    }
    Ok(0)
}
