use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{
    cli::{GlobalArgs, handlers::commons},
    core::{
        chain_manager::{ChainManager, EngineOptions},
        context::ChainContext,
        result::ChainResult,
    },
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Runs one or more chains.")]
struct RunArgs {
    /// The chains to run, as CatalogID/ChainID.
    #[arg(required = true)]
    chains: Vec<String>,

    /// Configuration file(s) or directories, comma separated.
    #[arg(long, short)]
    config: Option<String>,

    /// Seeds a context attribute (e.g. "a=10"). Values are parsed as JSON, falling back to text.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Stops a chain with FAIL after this many step visits.
    #[arg(long)]
    max_steps: Option<u64>,

    /// Stops with FAIL when sub-chains nest deeper than this.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Runs every chain at the same time, each with its own context.
    #[arg(long)]
    parallel: bool,

    /// Prints the results as JSON.
    #[arg(long)]
    json: bool,
}

/// What one chain execution produced.
#[derive(Serialize, Debug)]
struct RunReport {
    chain: String,
    result: ChainResult,
    attributes: BTreeMap<String, Value>,
}

impl RunReport {
    fn new(chain: &str, result: ChainResult, context: &ChainContext) -> Self {
        Self {
            chain: chain.to_string(),
            result,
            attributes: context.attributes().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }
}

///
/// Main entry point for the 'run' command.
///
/// Sequential runs share one context, so later chains see what earlier ones left behind,
/// and stop at the first `FAIL` or `ABORT`. Parallel runs each get their own seeded context.
///
pub fn handle(args: Vec<String>, global: &GlobalArgs) -> Result<i32> {
    // 1. Parse this handler's specific arguments.
    let run_args = RunArgs::try_parse_from(&args)?;
    let seed = run_args
        .set
        .iter()
        .map(|raw| commons::parse_assignment(raw))
        .collect::<Result<Vec<_>>>()?;

    // 2. Build the engine.
    let options = EngineOptions {
        max_steps: run_args.max_steps,
        max_depth: run_args.max_depth,
    };
    let config = run_args.config.as_deref().or(global.config.as_deref());
    let manager = commons::load_manager(config, options)?;

    // 3. Execute.
    let reports = if run_args.parallel {
        run_parallel(&manager, &run_args.chains, &seed)
    } else {
        run_sequential(&manager, &run_args.chains, &seed)
    };

    // 4. Report.
    if run_args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    Ok(reports
        .iter()
        .map(|r| commons::exit_code_for(r.result.code()))
        .max()
        .unwrap_or(0))
}

fn run_sequential(manager: &ChainManager, chains: &[String], seed: &[(String, Value)]) -> Vec<RunReport> {
    let mut context = commons::seeded_context(manager, seed);
    let mut reports = Vec::with_capacity(chains.len());
    for chain_ref in chains {
        let result = manager.execute_chain(chain_ref, &mut context);
        let stop = result.is_terminal();
        reports.push(RunReport::new(chain_ref, result, &context));
        if stop {
            log::warn!("Stopping after '{}'; remaining chains were not run.", chain_ref);
            break;
        }
    }
    reports
}

fn run_parallel(manager: &ChainManager, chains: &[String], seed: &[(String, Value)]) -> Vec<RunReport> {
    log::info!("Running {} chain(s) in parallel.", chains.len());
    chains
        .par_iter()
        .map(|chain_ref| {
            let mut context = commons::seeded_context(manager, seed);
            let result = manager.execute_chain(chain_ref, &mut context);
            RunReport::new(chain_ref, result, &context)
        })
        .collect()
}

fn print_report(report: &RunReport) {
    let code = report.result.code();
    print!("{} {}", report.chain.cyan().bold(), commons::paint_code(code));
    if !report.result.extra_info().is_empty() {
        print!(" ({})", report.result.extra_info());
    }
    println!();

    // Engine bookkeeping is noise for a human reader.
    for (key, value) in report.attributes.iter().filter(|(k, _)| !is_engine_key(k)) {
        println!("  {} = {}", key, value);
    }
}

fn is_engine_key(key: &str) -> bool {
    key.ends_with(crate::constants::EXECUTION_INDEX_KEY)
}
