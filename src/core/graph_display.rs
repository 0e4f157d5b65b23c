// src/core/graph_display.rs

use crate::core::catalog::Catalog;
use crate::core::chain::Chain;
use crate::core::chain_manager::ChainManager;
use std::fmt::Write;

/// What [`render_catalog_tree`] includes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    /// Also print the steps of every chain.
    pub show_steps: bool,
}

/// Renders an ASCII tree of catalogs, their chains and (optionally) their steps.
///
/// With `only` set, just that catalog is rendered. Returns `None` if it does not exist.
pub fn render_catalog_tree(manager: &ChainManager, only: Option<&str>, options: DisplayOptions) -> Option<String> {
    let catalogs: Vec<&Catalog> = match only {
        Some(id) => vec![manager.find_catalog(id)?],
        None => manager.catalogs(),
    };

    let mut out = String::new();
    if catalogs.is_empty() {
        out.push_str("No catalogs configured.\n");
        return Some(out);
    }

    for catalog in catalogs {
        let inherited = catalog
            .extends()
            .map(|base| format!(" (extends {})", base))
            .unwrap_or_default();
        let _ = writeln!(out, "{}{}", catalog.id(), inherited);

        let chains: Vec<&Chain> = catalog.chains().collect();
        for (i, chain) in chains.iter().enumerate() {
            let is_last = i + 1 == chains.len();
            render_chain(&mut out, chain, is_last, options);
        }
    }
    Some(out)
}

fn render_chain(out: &mut String, chain: &Chain, is_last: bool, options: DisplayOptions) {
    let connector = if is_last { "└─" } else { "├─" };
    let inherited = chain
        .extends()
        .map(|base| format!(", extends {}", base))
        .unwrap_or_default();
    let plural = if chain.len() == 1 { "" } else { "s" };
    let _ = writeln!(
        out,
        "{} {} ({} step{}{})",
        connector,
        chain.id(),
        chain.len(),
        plural,
        inherited
    );

    if !options.show_steps {
        return;
    }

    // Children of this node line up under its name.
    let prefix = if is_last { "   " } else { "│  " };
    for (i, step) in chain.steps().iter().enumerate() {
        let step_connector = if i + 1 == chain.len() { "└─" } else { "├─" };
        let _ = writeln!(out, "{}{} #{} {}", prefix, step_connector, i, step);
    }
}
