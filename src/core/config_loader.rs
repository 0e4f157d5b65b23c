//! # Config Loader
//!
//! This module provides the `ChainManagerBuilder`, which reads configuration documents
//! (TOML or JSON), validates them, and flattens every `extends` relation into plain,
//! self-contained catalogs and chains before handing them to a `ChainManager`.
//!
//! Inheritance is resolved as a graph, once, at build time:
//!
//! 1. **Merge:** documents are merged by catalog id; a later definition replaces an earlier one.
//! 2. **Catalog lineage:** every `catalog.extends` is checked for unknown bases and cycles.
//! 3. **Chain resolution:** each chain is resolved recursively and memoized. A chain starts
//!    from a deep copy of its base chain (which may live in any catalog, declared earlier or
//!    later), then applies its own steps. Chain cycles are reported with their full path.
//! 4. **Catalog assembly:** a derived catalog starts from a deep copy of its resolved base and
//!    then receives its own chains, which replace inherited chains with the same id.
//!
//! Nothing is shared between the resulting entities, so a derived chain can never alter its base.

use crate::constants::CHAIN_REF_SEPARATOR;
use crate::core::catalog::Catalog;
use crate::core::chain::{Chain, StepError, qualify_chain_ref};
use crate::core::chain_manager::{ChainManager, EngineOptions, split_chain_ref};
use crate::core::command::CommandRegistry;
use crate::core::command_config::{CommandConfig, StepKind};
use crate::core::context::namespace_prefix_for;
use crate::core::paths::{self, PathError};
use crate::models::{CatalogDef, ChainConfigFile, ChainDef, CommandDef};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;

lazy_static! {
    // Ids are single path segments: no separator, no whitespace.
    static ref ID_RE: Regex = Regex::new(r"^[^/\s]+$").expect("static id pattern is valid");
}

/// Errors that make a configuration unusable. All of them are fatal at build time.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration path could not be resolved.
    #[error(transparent)]
    Path(#[from] PathError),
    /// A configuration file could not be read.
    #[error("Could not read '{path}': {source}")]
    Io {
        /// The file being read.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// A TOML document is malformed or does not match the expected layout.
    #[error("Invalid TOML in '{origin}': {source}")]
    TomlParse {
        /// Where the document came from.
        origin: String,
        /// The parser error.
        #[source]
        source: toml::de::Error,
    },
    /// A JSON document is malformed or does not match the expected layout.
    #[error("Invalid JSON in '{origin}': {source}")]
    JsonParse {
        /// Where the document came from.
        origin: String,
        /// The parser error.
        #[source]
        source: serde_json::Error,
    },
    /// An id is empty, contains whitespace, or contains the reference separator.
    #[error("Invalid {kind} id '{id}'. Ids must be non-empty and may not contain '/' or whitespace.")]
    InvalidId {
        /// `"catalog"`, `"chain"` or `"command"`.
        kind: &'static str,
        /// The offending id.
        id: String,
    },
    /// A step sets both `class` and `chain`, or neither.
    #[error("Step '{step_id}' in chain '{chain_ref}' must set exactly one of 'class' or 'chain'.")]
    InvalidStep {
        /// The owning chain as `"catalogId/chainId"`.
        chain_ref: String,
        /// The offending step.
        step_id: String,
    },
    /// A chain reference is not of the form `"catalogId/chainId"` or `"chainId"`.
    #[error("Chain '{chain_ref}' uses the malformed reference '{reference}'.")]
    MalformedChainRef {
        /// The chain holding the reference.
        chain_ref: String,
        /// The reference as written.
        reference: String,
    },
    /// `catalog.extends` names a catalog that does not exist.
    #[error("Catalog '{catalog_id}' extends unknown catalog '{base_id}'.")]
    UnknownBaseCatalog {
        /// The derived catalog.
        catalog_id: String,
        /// The missing base.
        base_id: String,
    },
    /// `chain.extends` names a chain that does not exist.
    #[error("Chain '{chain_ref}' extends unknown chain '{base_ref}'.")]
    UnknownBaseChain {
        /// The derived chain as `"catalogId/chainId"`.
        chain_ref: String,
        /// The missing base as `"catalogId/chainId"`.
        base_ref: String,
    },
    /// An `extends` relation loops back on itself.
    #[error("Circular inheritance detected: {cycle_path}")]
    CircularInheritance {
        /// The loop, e.g. `"A -> B -> A"`.
        cycle_path: String,
    },
    /// Two chains would write their engine keys under the same `"<catalog>_<chain>_"` prefix.
    #[error("Chains '{first}' and '{second}' share the attribute prefix '{prefix}'. Rename one of them.")]
    NamespaceCollision {
        /// The chain seen first, as `"catalogId/chainId"`.
        first: String,
        /// The clashing chain, as `"catalogId/chainId"`.
        second: String,
        /// The shared prefix.
        prefix: String,
    },
    /// A step could not be added to its chain.
    #[error(transparent)]
    Step(#[from] StepError),
}

/// The syntax of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML, the default.
    Toml,
    /// JSON, picked for `.json` files.
    Json,
}

impl ConfigFormat {
    /// Picks the format from the file extension. Anything but `.json` is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Parses one document without validating it.
pub fn parse_document(content: &str, format: ConfigFormat, origin: &str) -> Result<ChainConfigFile, ConfigError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| ConfigError::TomlParse {
            origin: origin.to_string(),
            source: e,
        }),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| ConfigError::JsonParse {
            origin: origin.to_string(),
            source: e,
        }),
    }
}

/// Collects configuration documents and builds an immutable [`ChainManager`] from them.
#[derive(Debug)]
pub struct ChainManagerBuilder {
    documents: Vec<(String, ChainConfigFile)>,
    registry: CommandRegistry,
    options: EngineOptions,
}

impl Default for ChainManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainManagerBuilder {
    /// A builder with the built-in command types registered and no documents.
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            registry: CommandRegistry::with_builtins(),
            options: EngineOptions::default(),
        }
    }

    /// Replaces the command registry.
    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Gives access to the registry, e.g. to register application commands.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Sets the limits the built manager runs with.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Loads a file, or every `*.toml` / `*.json` file below a directory, in sorted order.
    pub fn load_path(&mut self, path: &Path) -> Result<&mut Self, ConfigError> {
        for file in paths::collect_config_files(path)? {
            log::debug!("Loading chain configuration from {}", file.display());
            let content = fs::read_to_string(&file).map_err(|e| ConfigError::Io {
                path: file.display().to_string(),
                source: e,
            })?;
            let origin = file.display().to_string();
            self.load_str(&content, ConfigFormat::from_path(&file), &origin)?;
        }
        Ok(self)
    }

    /// Loads a comma-separated list of files or directories.
    pub fn load_paths(&mut self, list: &str) -> Result<&mut Self, ConfigError> {
        for path in paths::resolve_path_list(list)? {
            self.load_path(&path)?;
        }
        Ok(self)
    }

    /// Loads the configuration found by [`paths::resolve_config_sources`].
    pub fn load_default(&mut self, explicit: Option<&str>) -> Result<&mut Self, ConfigError> {
        for path in paths::resolve_config_sources(explicit)? {
            self.load_path(&path)?;
        }
        Ok(self)
    }

    /// Parses and adds an in-memory document. `origin` only appears in error messages.
    pub fn load_str(&mut self, content: &str, format: ConfigFormat, origin: &str) -> Result<&mut Self, ConfigError> {
        let document = parse_document(content, format, origin)?;
        Ok(self.add_document(origin, document))
    }

    /// Adds an already parsed document.
    pub fn add_document(&mut self, origin: &str, document: ChainConfigFile) -> &mut Self {
        log::trace!("Document '{}' declares {} catalog(s).", origin, document.catalogs.len());
        self.documents.push((origin.to_string(), document));
        self
    }

    /// Validates every document, flattens inheritance and returns the finished manager.
    pub fn build(self) -> Result<ChainManager, ConfigError> {
        let definitions = merge_documents(self.documents)?;
        let mut resolver = Resolver::new(&definitions);

        resolver.check_catalog_lineage()?;

        let mut catalogs = Vec::with_capacity(definitions.len());
        for catalog_id in definitions.keys() {
            catalogs.push(resolver.resolve_catalog(catalog_id)?);
        }
        check_namespaces(&catalogs)?;

        let manager = ChainManager::new(catalogs, self.registry).with_options(self.options);
        for warning in lint(&manager) {
            log::warn!("{}", warning);
        }
        log::info!("Chain configuration loaded: {} catalog(s).", manager.catalogs().len());
        Ok(manager)
    }
}

/// Merges documents by catalog id and validates every id and step shape.
fn merge_documents(documents: Vec<(String, ChainConfigFile)>) -> Result<BTreeMap<String, CatalogDef>, ConfigError> {
    let mut merged: BTreeMap<String, CatalogDef> = BTreeMap::new();
    for (origin, document) in documents {
        for catalog in document.catalogs {
            validate_catalog(&catalog)?;
            if merged.contains_key(&catalog.id) {
                log::warn!(
                    "Catalog '{}' from '{}' replaces an earlier definition with the same id.",
                    catalog.id,
                    origin
                );
            }
            merged.insert(catalog.id.clone(), catalog);
        }
    }
    Ok(merged)
}

fn validate_id(kind: &'static str, id: &str) -> Result<(), ConfigError> {
    if ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(ConfigError::InvalidId {
            kind,
            id: id.to_string(),
        })
    }
}

fn validate_catalog(catalog: &CatalogDef) -> Result<(), ConfigError> {
    validate_id("catalog", &catalog.id)?;
    for chain in &catalog.chains {
        validate_id("chain", &chain.id)?;
        for command in &chain.commands {
            validate_id("command", &command.id)?;
        }
    }
    Ok(())
}

/// Turns a step definition into a `CommandConfig`.
fn to_step(chain_ref: &str, def: &CommandDef) -> Result<CommandConfig, ConfigError> {
    let step = match (&def.class, &def.chain) {
        (Some(type_name), None) => def
            .properties
            .iter()
            .fold(CommandConfig::command(&def.id, type_name), |step, p| {
                step.with_property(&p.id, p.value.to_string())
            }),
        (None, Some(reference)) => {
            if !def.properties.is_empty() {
                log::warn!(
                    "Step '{}' in '{}' calls a chain; its properties are ignored.",
                    def.id,
                    chain_ref
                );
            }
            CommandConfig::sub_chain(&def.id, reference.trim())
        }
        _ => {
            return Err(ConfigError::InvalidStep {
                chain_ref: chain_ref.to_string(),
                step_id: def.id.clone(),
            });
        }
    };
    Ok(match &def.replace_id {
        Some(replace_id) => step.replacing(replace_id),
        None => step,
    })
}

/// Rejects chains whose engine keys would land in the same namespace, like catalog `a_b`
/// chain `c` and catalog `a` chain `b_c`.
fn check_namespaces(catalogs: &[Catalog]) -> Result<(), ConfigError> {
    let mut seen: HashMap<String, String> = HashMap::new();
    for catalog in catalogs {
        for chain in catalog.chains() {
            let prefix = namespace_prefix_for(catalog.id(), chain.id());
            let chain_ref = join_ref(catalog.id(), chain.id());
            if let Some(first) = seen.insert(prefix.clone(), chain_ref.clone()) {
                return Err(ConfigError::NamespaceCollision {
                    first,
                    second: chain_ref,
                    prefix,
                });
            }
        }
    }
    Ok(())
}

fn join_ref(catalog_id: &str, chain_id: &str) -> String {
    format!("{}{}{}", catalog_id, CHAIN_REF_SEPARATOR, chain_id)
}

/// Memoized resolution of the inheritance graph.
struct Resolver<'a> {
    definitions: &'a BTreeMap<String, CatalogDef>,
    chains: HashMap<String, Chain>,
    catalogs: HashMap<String, Catalog>,
    visiting: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn new(definitions: &'a BTreeMap<String, CatalogDef>) -> Self {
        Self {
            definitions,
            chains: HashMap::new(),
            catalogs: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    /// Follows every `catalog.extends` link, failing on unknown bases and cycles.
    fn check_catalog_lineage(&self) -> Result<(), ConfigError> {
        for start in self.definitions.values() {
            let mut lineage = vec![start.id.as_str()];
            let mut current = start;
            while let Some(base_id) = current.extends.as_deref() {
                if lineage.contains(&base_id) {
                    lineage.push(base_id);
                    return Err(ConfigError::CircularInheritance {
                        cycle_path: lineage.join(" -> "),
                    });
                }
                current = self
                    .definitions
                    .get(base_id)
                    .ok_or_else(|| ConfigError::UnknownBaseCatalog {
                        catalog_id: current.id.clone(),
                        base_id: base_id.to_string(),
                    })?;
                lineage.push(base_id);
            }
        }
        Ok(())
    }

    /// Every chain id visible in a catalog: its own plus everything inherited.
    fn chain_ids(&self, catalog_id: &str) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        let mut current = self.definitions.get(catalog_id);
        while let Some(def) = current {
            ids.extend(def.chains.iter().map(|c| c.id.clone()));
            current = def.extends.as_deref().and_then(|b| self.definitions.get(b));
        }
        ids
    }

    fn local_chain(&self, catalog_id: &str, chain_id: &str) -> Option<&'a ChainDef> {
        let definitions: &'a BTreeMap<String, CatalogDef> = self.definitions;
        definitions
            .get(catalog_id)?
            .chains
            .iter()
            .rev()
            .find(|c| c.id == chain_id)
    }

    fn resolve_catalog(&mut self, catalog_id: &str) -> Result<Catalog, ConfigError> {
        if let Some(done) = self.catalogs.get(catalog_id) {
            return Ok(done.clone());
        }
        let definitions = self.definitions;
        let def = definitions
            .get(catalog_id)
            .ok_or_else(|| ConfigError::UnknownBaseCatalog {
                catalog_id: catalog_id.to_string(),
                base_id: catalog_id.to_string(),
            })?;

        let mut catalog = match def.extends.as_deref() {
            Some(base_id) => {
                let base = self.resolve_catalog(base_id)?;
                Catalog::derived(&def.id, &base)
            }
            None => Catalog::new(&def.id),
        };

        let local_ids: BTreeSet<&str> = def.chains.iter().map(|c| c.id.as_str()).collect();
        for chain_id in local_ids {
            let chain = self.resolve_chain(&def.id, chain_id)?;
            catalog.add_chain(chain);
        }

        log::debug!("Resolved catalog '{}' with {} chain(s).", catalog.id(), catalog.len());
        self.catalogs.insert(catalog_id.to_string(), catalog.clone());
        Ok(catalog)
    }

    fn resolve_chain(&mut self, catalog_id: &str, chain_id: &str) -> Result<Chain, ConfigError> {
        let key = join_ref(catalog_id, chain_id);
        if let Some(done) = self.chains.get(&key) {
            return Ok(done.clone());
        }
        if let Some(start) = self.visiting.iter().position(|k| *k == key) {
            let mut cycle: Vec<&str> = self.visiting.iter().skip(start).map(String::as_str).collect();
            cycle.push(&key);
            return Err(ConfigError::CircularInheritance {
                cycle_path: cycle.join(" -> "),
            });
        }

        self.visiting.push(key.clone());
        let resolved = self.build_chain(catalog_id, chain_id, &key);
        self.visiting.pop();

        let chain = resolved?;
        self.chains.insert(key, chain.clone());
        Ok(chain)
    }

    fn build_chain(&mut self, catalog_id: &str, chain_id: &str, key: &str) -> Result<Chain, ConfigError> {
        let Some(def) = self.local_chain(catalog_id, chain_id) else {
            // Not declared here, so it must come from the catalog's base.
            let definitions: &'a BTreeMap<String, CatalogDef> = self.definitions;
            let base_id = definitions
                .get(catalog_id)
                .and_then(|c| c.extends.as_deref());
            return match base_id {
                Some(base_id) if self.chain_ids(base_id).contains(chain_id) => {
                    Ok(self.resolve_chain(base_id, chain_id)?.cloned_as(chain_id))
                }
                _ => Err(ConfigError::UnknownBaseChain {
                    chain_ref: self
                        .visiting
                        .iter()
                        .rev()
                        .nth(1)
                        .cloned()
                        .unwrap_or_else(|| key.to_string()),
                    base_ref: key.to_string(),
                }),
            };
        };

        let mut chain = match def.extends.as_deref() {
            Some(reference) => {
                let qualified = qualify_chain_ref(reference.trim(), catalog_id);
                let (base_catalog, base_chain) =
                    split_chain_ref(&qualified).ok_or_else(|| ConfigError::MalformedChainRef {
                        chain_ref: key.to_string(),
                        reference: reference.to_string(),
                    })?;
                if !self.definitions.contains_key(base_catalog) || !self.chain_ids(base_catalog).contains(base_chain) {
                    return Err(ConfigError::UnknownBaseChain {
                        chain_ref: key.to_string(),
                        base_ref: qualified.clone(),
                    });
                }
                let base = self.resolve_chain(base_catalog, base_chain)?;
                Chain::derived(&def.id, qualified.clone(), &base)
            }
            None => Chain::new(&def.id),
        };

        for command in &def.commands {
            chain.add_command(to_step(key, command)?)?;
        }
        log::trace!("Resolved chain '{}' with {} step(s).", key, chain.len());
        Ok(chain)
    }
}

/// Finds references the engine would only discover at run time: sub-chain steps pointing
/// at chains that do not exist, and command types missing from the registry.
pub fn lint(manager: &ChainManager) -> Vec<String> {
    let mut warnings = Vec::new();
    for catalog in manager.catalogs() {
        for chain in catalog.chains() {
            for step in chain.steps() {
                match step.kind() {
                    StepKind::SubChain { chain_ref } => {
                        let qualified = qualify_chain_ref(chain_ref, catalog.id());
                        if manager.find_chain(&qualified).is_none() {
                            warnings.push(format!(
                                "Step '{}' in '{}/{}' calls '{}', which does not exist.",
                                step.id(),
                                catalog.id(),
                                chain.id(),
                                qualified
                            ));
                        }
                    }
                    StepKind::Command { type_name, .. } => {
                        if !manager.registry().contains(type_name) {
                            warnings.push(format!(
                                "Step '{}' in '{}/{}' uses unregistered command type '{}'.",
                                step.id(),
                                catalog.id(),
                                chain.id(),
                                type_name
                            ));
                        }
                    }
                }
            }
        }
    }
    warnings
}
