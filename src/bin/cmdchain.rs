// src/bin/cmdchain.rs

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser};
use cmdchain::{
    cli::{Cli, GlobalArgs, handlers, log_level_for},
    constants::CHAIN_REF_SEPARATOR,
};
use colored::*;

// --- Command Definition and Registry ---

/// An action, its aliases, and its handler. Handlers return the process exit code.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &GlobalArgs) -> Result<i32>,
}

/// Every action the binary understands. Add an entry here to add an action.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "check",
        aliases: &["validate"],
        handler: handlers::check::handle,
    },
    CommandDefinition {
        name: "list",
        aliases: &["ls", "tree"],
        handler: handlers::list::handle,
    },
    CommandDefinition {
        name: "run",
        aliases: &[],
        handler: handlers::run::handle,
    },
    CommandDefinition {
        name: "types",
        aliases: &[],
        handler: handlers::types::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Sets up logging, dispatches to the handler and turns errors into a red message and exit code 1.
fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level_for(cli.verbose)))
        .init();

    match run_cli(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // clap errors (including --help) know how to print themselves.
            if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
                clap_err.exit();
            }
            eprintln!("\n{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Routes `cmdchain <action> [args...]`, and `cmdchain <CATALOG/CHAIN> [args...]` as a
/// shortcut for `run`.
fn run_cli(cli: Cli) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);
    let global = GlobalArgs::from(&cli);

    let Some(action) = cli.action else {
        Cli::command().print_help()?;
        println!();
        return Ok(0);
    };

    if let Some(command) = find_command(&action) {
        return (command.handler)(cli.args, &global);
    }

    if action.contains(CHAIN_REF_SEPARATOR) {
        let mut run_args = vec![action];
        run_args.extend(cli.args);
        return handlers::run::handle(run_args, &global);
    }

    Err(anyhow!(
        "Unknown action '{}'. Expected one of: {}.",
        action.yellow(),
        COMMAND_REGISTRY
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    ))
}
