// src/core/command_config.rs

use crate::core::command::CommandProperties;
use std::fmt;

/// What a step runs: a leaf command built from the registry, or another chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// A leaf command, identified by its registered type name.
    Command {
        /// The registry key of the command type.
        type_name: String,
        /// Properties handed to the factory.
        properties: CommandProperties,
    },
    /// A sub-chain call. A reference without a catalog part runs in the calling catalog.
    SubChain {
        /// `"catalogId/chainId"` or a bare `"chainId"`.
        chain_ref: String,
    },
}

/// The declarative descriptor of one step of a chain.
///
/// Built once while the configuration is loaded and never mutated afterwards. Cloning is a
/// deep copy, which is what chain and catalog inheritance rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConfig {
    id: String,
    kind: StepKind,
    replace_id: Option<String>,
}

impl CommandConfig {
    /// A leaf command step without properties.
    pub fn command(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: StepKind::Command {
                type_name: type_name.into(),
                properties: CommandProperties::new(),
            },
            replace_id: None,
        }
    }

    /// A step that runs another chain.
    pub fn sub_chain(id: impl Into<String>, chain_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: StepKind::SubChain {
                chain_ref: chain_ref.into(),
            },
            replace_id: None,
        }
    }

    /// Adds a property. Has no effect on sub-chain steps.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let StepKind::Command { properties, .. } = &mut self.kind {
            properties.push(name, value);
        } else {
            log::warn!("Ignoring property on sub-chain step '{}'.", self.id);
        }
        self
    }

    /// Marks this step as the replacement of an inherited step with the given id.
    pub fn replacing(mut self, replace_id: impl Into<String>) -> Self {
        self.replace_id = Some(replace_id.into());
        self
    }

    /// The step id, unique within its chain.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// What the step runs.
    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    /// Id of the inherited step this one replaces.
    pub fn replace_id(&self) -> Option<&str> {
        self.replace_id.as_deref()
    }
}

impl fmt::Display for CommandConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StepKind::Command {
                type_name,
                properties,
            } => {
                write!(f, "{} [{}]", self.id, type_name)?;
                if !properties.is_empty() {
                    let rendered: Vec<String> = properties
                        .iter()
                        .map(|(n, v)| format!("{}={}", n, v))
                        .collect();
                    write!(f, " {{{}}}", rendered.join(", "))?;
                }
                Ok(())
            }
            StepKind::SubChain { chain_ref } => write!(f, "{} -> {}", self.id, chain_ref),
        }
    }
}
