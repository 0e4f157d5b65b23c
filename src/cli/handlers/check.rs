use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::{GlobalArgs, handlers::commons},
    core::{chain_manager::EngineOptions, config_loader},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Validates the configuration and reports references that would fail at run time."
)]
struct CheckArgs {
    /// Configuration file(s) or directories, comma separated.
    #[arg(long, short)]
    config: Option<String>,

    /// Treat warnings as errors.
    #[arg(long)]
    strict: bool,
}

/// Entry point for the `check` action. With `--strict`, warnings exit with 1.
pub fn handle(args: Vec<String>, global: &GlobalArgs) -> Result<i32> {
    let check_args = CheckArgs::try_parse_from(&args)?;
    let config = check_args.config.as_deref().or(global.config.as_deref());

    // Structural errors (cycles, unknown bases, bad steps) already fail here.
    let manager = commons::load_manager(config, EngineOptions::default())?;

    let catalogs = manager.catalogs();
    let chains: usize = catalogs.iter().map(|c| c.len()).sum();
    let steps: usize = catalogs
        .iter()
        .flat_map(|c| c.chains())
        .map(|chain| chain.len())
        .sum();

    let warnings = config_loader::lint(&manager);
    for warning in &warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }

    println!(
        "{} {} catalog(s), {} chain(s), {} step(s).",
        "OK".green().bold(),
        catalogs.len(),
        chains,
        steps
    );

    if check_args.strict && !warnings.is_empty() {
        return Ok(1);
    }
    Ok(0)
}
