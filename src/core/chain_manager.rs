//! # Chain Manager
//!
//! The entry point of the engine. A `ChainManager` owns the resolved catalogs and the
//! command registry, hands out contexts, and runs chains by `"catalogId/chainId"` reference.
//! It is built once (see [`ChainManagerBuilder`]) and is read-only afterwards, so a single
//! instance can be shared by reference across threads.

use crate::constants::CHAIN_REF_SEPARATOR;
use crate::core::catalog::Catalog;
use crate::core::chain::Chain;
use crate::core::command::CommandRegistry;
use crate::core::config_loader::ChainManagerBuilder;
use crate::core::context::ChainContext;
use crate::core::result::ChainResult;
use std::collections::HashMap;

/// Opt-in safety bounds. Both default to `None`: chains run unbounded unless told otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum number of step visits in a single chain execution.
    pub max_steps: Option<u64>,
    /// Maximum nesting of sub-chain calls on one context.
    pub max_depth: Option<usize>,
}

/// The resolved, immutable set of catalogs plus the registry used to build commands.
#[derive(Debug, Clone)]
pub struct ChainManager {
    catalogs: HashMap<String, Catalog>,
    registry: CommandRegistry,
    options: EngineOptions,
}

impl ChainManager {
    /// Creates a manager from already-resolved catalogs.
    ///
    /// Catalogs sharing an id replace earlier ones. Use [`ChainManager::builder`] to load
    /// catalogs from configuration files with inheritance resolved.
    pub fn new(catalogs: impl IntoIterator<Item = Catalog>, registry: CommandRegistry) -> Self {
        let mut map = HashMap::new();
        for catalog in catalogs {
            if let Some(old) = map.insert(catalog.id().to_string(), catalog) {
                log::warn!("Catalog '{}' defined more than once. The last definition wins.", old.id());
            }
        }
        Self {
            catalogs: map,
            registry,
            options: EngineOptions::default(),
        }
    }

    /// Starts a builder preloaded with the built-in command types.
    pub fn builder() -> ChainManagerBuilder {
        ChainManagerBuilder::new()
    }

    /// Replaces the engine limits.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// The limits every execution runs with.
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// The registry every leaf step is built from.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// A fresh, empty context.
    pub fn create_context(&self) -> ChainContext {
        ChainContext::new()
    }

    /// Looks up a catalog by id.
    pub fn find_catalog(&self, catalog_id: &str) -> Option<&Catalog> {
        self.catalogs.get(catalog_id)
    }

    /// Looks up a chain by its `"catalogId/chainId"` reference.
    pub fn find_chain(&self, chain_ref: &str) -> Option<&Chain> {
        let (catalog_id, chain_id) = split_chain_ref(chain_ref)?;
        self.find_catalog(catalog_id)?.find_chain(chain_id)
    }

    /// All catalogs, sorted by id.
    pub fn catalogs(&self) -> Vec<&Catalog> {
        let mut catalogs: Vec<&Catalog> = self.catalogs.values().collect();
        catalogs.sort_by(|a, b| a.id().cmp(b.id()));
        catalogs
    }

    /// Runs the chain named by `chain_ref` and stores its result in `context`.
    ///
    /// Never panics and never returns an error: a malformed reference, an unknown catalog or
    /// chain, or a nesting limit hit all end as a `FAIL` result in the context. The same
    /// result is returned for convenience.
    pub fn execute_chain(&self, chain_ref: &str, context: &mut ChainContext) -> ChainResult {
        log::info!("Getting ready to execute chain '{}' (context {}).", chain_ref, context.id());

        let Some((catalog_id, chain_id)) = split_chain_ref(chain_ref) else {
            log::error!(
                "Chain execution failed because '{}' is not in the form CatalogID/ChainID.",
                chain_ref
            );
            return store(context, ChainResult::fail("MalformedChainRef"));
        };

        if let Some(limit) = self.options.max_depth
            && context.depth() >= limit
        {
            log::error!(
                "Chain '{}' not started: nesting limit of {} reached.",
                chain_ref,
                limit
            );
            return store(context, ChainResult::fail("DepthLimitExceeded"));
        }

        context.set_location(catalog_id, chain_id);

        let Some(catalog) = self.find_catalog(catalog_id) else {
            log::error!("Chain execution failed because catalog '{}' could not be found.", catalog_id);
            return store(context, ChainResult::fail("CatalogNotFound"));
        };
        let Some(chain) = catalog.find_chain(chain_id) else {
            log::error!(
                "Chain execution failed because chain '{}' could not be found in catalog '{}'.",
                chain_id,
                catalog_id
            );
            return store(context, ChainResult::fail("ChainNotFound"));
        };

        log::debug!("Beginning chain '{}' with {} step(s)...", chain_ref, chain.len());
        context.enter_chain();
        let result = chain.execute(self, context);
        context.leave_chain();
        log::info!("Chain '{}' complete: {}", chain_ref, result);

        store(context, result)
    }
}

fn store(context: &mut ChainContext, result: ChainResult) -> ChainResult {
    context.set_result(result.clone());
    result
}

/// Splits `"catalogId/chainId"` into its two parts.
///
/// Returns `None` unless there is exactly one separator with a non-empty id on each side.
pub fn split_chain_ref(chain_ref: &str) -> Option<(&str, &str)> {
    let (catalog_id, chain_id) = chain_ref.split_once(CHAIN_REF_SEPARATOR)?;
    let catalog_id = catalog_id.trim();
    let chain_id = chain_id.trim();
    if catalog_id.is_empty() || chain_id.is_empty() || chain_id.contains(CHAIN_REF_SEPARATOR) {
        return None;
    }
    Some((catalog_id, chain_id))
}
