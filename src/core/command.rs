//! # Commands
//!
//! A [`Command`] is the pluggable unit of work of a chain. Commands are never looked up by
//! reflection: every step names a *type*, and the [`CommandRegistry`] maps that type name to
//! a factory that receives the step's [`CommandProperties`] and returns a ready instance.
//! A fresh instance is built every time a step is visited.

use crate::core::context::ChainContext;
use crate::core::result::ChainResult;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// The three-phase lifecycle every command implements.
///
/// * `init` prepares the command. `Fail`/`Abort` ends the chain without calling the other two.
/// * `execute` does the work. Its code drives the interpreter (continue, restart, redo, jump).
/// * `cleanup` releases whatever `init`/`execute` acquired. It runs once after `execute`,
///   including when `execute` failed.
pub trait Command: Send {
    /// Prepares the command. Succeeds by default.
    fn init(&mut self, _context: &mut ChainContext) -> ChainResult {
        ChainResult::success()
    }

    /// Does the work of the step.
    fn execute(&mut self, context: &mut ChainContext) -> ChainResult;

    /// Releases what `init` or `execute` acquired. Succeeds by default.
    fn cleanup(&mut self, _context: &mut ChainContext) -> ChainResult {
        ChainResult::success()
    }
}

/// Errors raised while turning a step into a command instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No factory is registered under the requested type name.
    #[error("No command type named '{type_name}' is registered.")]
    UnknownType {
        /// The type name requested by the step.
        type_name: String,
    },
    /// A property the command cannot work without was not configured.
    #[error("Required property '{name}' is missing.")]
    MissingProperty {
        /// The property name.
        name: String,
    },
    /// A property value could not be converted to the type the command expects.
    #[error("Property '{name}' has invalid value '{value}': {reason}")]
    InvalidProperty {
        /// The property name.
        name: String,
        /// The raw configured value.
        value: String,
        /// Why the conversion failed.
        reason: String,
    },
}

impl CommandError {
    /// The short error kind reported in a failed result's `extra_info`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::UnknownType { .. } => "UnknownType",
            Self::MissingProperty { .. } => "MissingProperty",
            Self::InvalidProperty { .. } => "InvalidProperty",
        }
    }
}

/// The ordered `(name, value)` pairs configured on a step.
///
/// Values are always strings, as written in the configuration; conversion is up to the
/// command. When a name is configured more than once, the last value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandProperties {
    entries: Vec<(String, String)>,
}

impl CommandProperties {
    /// An empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property. A later value for the same name wins.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// The raw text of a property.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the raw value or a `MissingProperty` error.
    pub fn require(&self, name: &str) -> Result<&str, CommandError> {
        self.get(name).ok_or_else(|| CommandError::MissingProperty {
            name: name.to_string(),
        })
    }

    /// Parses a required property.
    pub fn parse<T>(&self, name: &str) -> Result<T, CommandError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.require(name)?;
        parse_value(name, raw)
    }

    /// Parses an optional property, falling back to `default` when it is not configured.
    pub fn parse_or<T>(&self, name: &str, default: T) -> Result<T, CommandError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(name) {
            Some(raw) => parse_value(name, raw),
            None => Ok(default),
        }
    }

    /// All properties, in the order they were pushed.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no property was set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for CommandProperties {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, CommandError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| CommandError::InvalidProperty {
            name: name.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Builds a configured command from a step's properties.
pub type CommandFactory =
    Arc<dyn Fn(&CommandProperties) -> Result<Box<dyn Command>, CommandError> + Send + Sync>;

/// Maps command type names to their factories.
///
/// The registry is cheap to clone (factories are reference counted) and read-only once it
/// has been handed to a `ChainManager`.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    factories: HashMap<String, CommandFactory>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in loop commands and the sample arithmetic commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::commands::register_builtins(&mut registry);
        registry
    }

    /// Registers a factory. A factory already registered under the same name is replaced.
    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&CommandProperties) -> Result<Box<dyn Command>, CommandError> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        if self
            .factories
            .insert(type_name.clone(), Arc::new(factory))
            .is_some()
        {
            log::warn!("Command type '{}' was registered twice. The last registration wins.", type_name);
        }
    }

    /// `true` if a factory is registered under `type_name`.
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Builds a new instance of `type_name` configured with `properties`.
    pub fn create(
        &self,
        type_name: &str,
        properties: &CommandProperties,
    ) -> Result<Box<dyn Command>, CommandError> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| CommandError::UnknownType {
                type_name: type_name.to_string(),
            })?;
        factory(properties)
    }

    /// All registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}
