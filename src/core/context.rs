// src/core/context.rs

use crate::constants::EXECUTION_INDEX_KEY;
use crate::core::result::ChainResult;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The attribute prefix of a chain's engine keys.
///
/// Ids may contain `_`, so two chains can map to the same prefix. The config loader
/// refuses such configurations.
pub fn namespace_prefix_for(catalog_id: &str, chain_id: &str) -> String {
    format!("{}_{}_", catalog_id, chain_id)
}

/// Per-execution state shared by every step of a chain and its sub-chains.
///
/// The context is owned by the caller. The engine only borrows it for the duration of
/// `ChainManager::execute_chain`, so one context must not be shared between concurrent
/// executions. Attribute values are JSON values; commands coerce them as they need.
///
/// Keys the engine writes itself are namespaced as `"<catalogId>_<chainId>_<name>"` so that
/// nested chains using the same local names (loop counters, the cursor) never collide.
#[derive(Debug, Clone)]
pub struct ChainContext {
    id: Uuid,
    attributes: BTreeMap<String, Value>,
    catalog_id: String,
    chain_id: String,
    result: Option<ChainResult>,
    depth: usize,
}

impl ChainContext {
    /// An empty context with a fresh id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            attributes: BTreeMap::new(),
            catalog_id: String::new(),
            chain_id: String::new(),
            result: None,
            depth: 0,
        }
    }

    /// A unique id for this context, used to correlate log lines of one execution.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Reads an attribute.
    pub fn get_attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Stores an attribute, returning the previous value if there was one.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(key.into(), value.into())
    }

    /// Removes an attribute, returning its value.
    pub fn remove_attribute(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Reads an attribute as a signed integer. Strings holding an integer are accepted too.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// All attributes, sorted by key.
    pub fn attributes(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }

    /// Catalog of the chain currently executing.
    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    /// Id of the chain currently executing.
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// The result of the last chain executed with this context.
    pub fn result(&self) -> Option<&ChainResult> {
        self.result.as_ref()
    }

    /// Records the result of a finished chain.
    pub fn set_result(&mut self, result: ChainResult) {
        self.result = Some(result);
    }

    /// The `"<catalogId>_<chainId>_"` prefix of the chain currently executing.
    pub fn namespace_prefix(&self) -> String {
        namespace_prefix_for(&self.catalog_id, &self.chain_id)
    }

    /// Builds the namespaced key for a local name in the chain currently executing.
    pub fn namespaced_key(&self, local_name: &str) -> String {
        format!("{}{}", self.namespace_prefix(), local_name)
    }

    /// Position of the step currently executing in the current chain.
    ///
    /// The value is published by the interpreter before every step. Writing the key has no
    /// effect on control flow; commands move the cursor by returning a jump result.
    pub fn execution_index(&self) -> Option<usize> {
        let index = self.get_i64(&self.namespaced_key(EXECUTION_INDEX_KEY))?;
        usize::try_from(index).ok()
    }

    pub(crate) fn publish_execution_index(&mut self, index: usize) {
        let key = self.namespaced_key(EXECUTION_INDEX_KEY);
        self.attributes.insert(key, Value::from(index));
    }

    pub(crate) fn set_location(&mut self, catalog_id: &str, chain_id: &str) {
        catalog_id.clone_into(&mut self.catalog_id);
        chain_id.clone_into(&mut self.chain_id);
    }

    /// Number of chains currently running on this context (1 inside a top-level chain).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn enter_chain(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn leave_chain(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl Default for ChainContext {
    fn default() -> Self {
        Self::new()
    }
}
