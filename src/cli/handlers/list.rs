use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::{GlobalArgs, handlers::commons},
    core::{
        chain_manager::EngineOptions,
        graph_display::{self, DisplayOptions},
    },
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Displays catalogs and their chains as a tree.")]
struct ListArgs {
    /// Only show this catalog.
    catalog: Option<String>,

    /// Configuration file(s) or directories, comma separated.
    #[arg(long, short)]
    config: Option<String>,

    /// Also show the steps of every chain.
    #[arg(long, short)]
    steps: bool,
}

/// Entry point for the `list` action.
pub fn handle(args: Vec<String>, global: &GlobalArgs) -> Result<i32> {
    let list_args = ListArgs::try_parse_from(&args)?;
    let config = list_args.config.as_deref().or(global.config.as_deref());
    let manager = commons::load_manager(config, EngineOptions::default())?;

    let options = DisplayOptions {
        show_steps: list_args.steps,
    };
    let tree = graph_display::render_catalog_tree(&manager, list_args.catalog.as_deref(), options)
        .ok_or_else(|| {
            anyhow!(
                "Catalog '{}' not found.",
                list_args.catalog.as_deref().unwrap_or_default().cyan()
            )
        })?;

    print!("{}", tree);
    Ok(0)
}
