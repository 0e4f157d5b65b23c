use clap::{ArgAction, Parser};

/// One handler per action.
pub mod handlers;

/// cmdchain: runs configurable chains of commands.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    after_help = "Actions:\n  run <CATALOG/CHAIN>...   Run chains (a bare CATALOG/CHAIN is a shortcut for run)\n  list [CATALOG]           Show catalogs, chains and steps\n  check                    Validate the configuration\n  types                    List registered command types\n\nUse `cmdchain <action> --help` for the options of an action.",
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
#[command(trailing_var_arg = true)]
pub struct Cli {
    /// Configuration file(s) or directories, comma separated. Defaults to
    /// $CHAIN_CONFIG_FILE_NAME, then ./chain_config.toml.
    #[arg(long, short)]
    pub config: Option<String>,

    /// Increases log output (-v: info, -vv: debug, -vvv: trace). RUST_LOG overrides it.
    #[arg(long, short, action = ArgAction::Count)]
    pub verbose: u8,

    /// The action to perform, or a CATALOG/CHAIN to run.
    pub action: Option<String>,

    /// Arguments for the action.
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Options given before the action, visible to every handler.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    /// `--config` given before the action.
    pub config: Option<String>,
}

impl From<&Cli> for GlobalArgs {
    fn from(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
        }
    }
}

/// The default log filter for a `-v` count.
pub fn log_level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
