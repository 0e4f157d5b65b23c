// src/core/catalog.rs

use crate::core::chain::Chain;
use std::collections::BTreeMap;

/// A named collection of chains.
///
/// A catalog that extends another starts from deep copies of the base's chains; chains
/// added afterwards replace inherited ones with the same id and never reach the base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    id: String,
    extends: Option<String>,
    chains: BTreeMap<String, Chain>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extends: None,
            chains: BTreeMap::new(),
        }
    }

    /// Creates a catalog holding independent copies of every chain in `base`.
    pub fn derived(id: impl Into<String>, base: &Self) -> Self {
        let chains = base
            .chains
            .iter()
            .map(|(chain_id, chain)| (chain_id.clone(), chain.cloned_as(chain_id)))
            .collect();
        Self {
            id: id.into(),
            extends: Some(base.id.clone()),
            chains,
        }
    }

    /// Adds a chain, returning the chain it replaced, if any.
    pub fn add_chain(&mut self, chain: Chain) -> Option<Chain> {
        let replaced = self.chains.insert(chain.id().to_string(), chain);
        if let Some(old) = &replaced {
            log::debug!("Catalog '{}': chain '{}' overridden.", self.id, old.id());
        }
        replaced
    }

    /// Looks up a chain by its id within this catalog.
    pub fn find_chain(&self, chain_id: &str) -> Option<&Chain> {
        self.chains.get(chain_id)
    }

    /// The catalog id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the catalog this one was derived from.
    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    /// The chains of this catalog, sorted by id.
    pub fn chains(&self) -> impl Iterator<Item = &Chain> {
        self.chains.values()
    }

    /// Number of chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// `true` if the catalog has no chains.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
