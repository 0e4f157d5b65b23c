// src/models.rs

use serde::{Deserialize, Serialize};
use std::fmt;

// --- CONFIGURATION FILE MODELS ---
// These mirror what the user writes in `chain_config.toml` (or its JSON twin). They are
// only a parse target: `config_loader` validates them and turns them into engine types.

/// The root of a configuration document.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChainConfigFile {
    /// Every `[[catalog]]` table in the document.
    #[serde(default, rename = "catalog")]
    pub catalogs: Vec<CatalogDef>,
}

/// A `[[catalog]]` table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CatalogDef {
    /// Catalog id, unique across all loaded documents.
    pub id: String,
    /// Id of the catalog whose chains this one starts from.
    #[serde(default)]
    pub extends: Option<String>,
    /// The `[[catalog.chain]]` tables.
    #[serde(default, rename = "chain")]
    pub chains: Vec<ChainDef>,
}

/// A `[[catalog.chain]]` table.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChainDef {
    /// Chain id, unique within its catalog.
    pub id: String,
    /// `"catalogId/chainId"` of the base chain. A bare id means the same catalog.
    #[serde(default)]
    pub extends: Option<String>,
    /// The steps, in order.
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandDef>,
}

/// A `[[catalog.chain.command]]` table. Exactly one of `class` and `chain` must be set.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommandDef {
    /// Step id, unique within its chain.
    pub id: String,
    /// Registered command type to run.
    #[serde(default)]
    pub class: Option<String>,
    /// Chain to call instead, as `"catalogId/chainId"` or a bare id.
    #[serde(default)]
    pub chain: Option<String>,
    /// Id of the inherited step this one replaces.
    #[serde(default, alias = "replaceId")]
    pub replace_id: Option<String>,
    /// Properties handed to the command factory.
    #[serde(default, rename = "property")]
    pub properties: Vec<PropertyDef>,
}

/// One `{ id, value }` pair handed to a command factory.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PropertyDef {
    /// Property name.
    pub id: String,
    /// Property value.
    pub value: ScalarValue,
}

/// A property value as written in the file. Uses `untagged` so `factor = 3` and
/// `factor = "3"` are both accepted; commands always receive the text form.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ScalarValue {
    /// `true` / `false`.
    Bool(bool),
    /// A whole number.
    Integer(i64),
    /// A decimal number.
    Float(f64),
    /// Anything else.
    String(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let doc = r#"
            [[catalog]]
            id = "Math"

            [[catalog.chain]]
            id = "Calc"

            [[catalog.chain.command]]
            id = "divide"
            class = "DivideABy2"

            [[catalog.chain.command]]
            id = "multiply"
            class = "MultiplyByX"
            property = [{ id = "factor", value = 3 }]

            [[catalog]]
            id = "Child"
            extends = "Math"

            [[catalog.chain]]
            id = "Calc2"
            extends = "Calc"

            [[catalog.chain.command]]
            id = "call"
            chain = "Math/Calc"
            replaceId = "divide"
        "#;
        let parsed: ChainConfigFile = toml::from_str(doc).unwrap();

        assert_eq!(parsed.catalogs.len(), 2);
        let calc = &parsed.catalogs[0].chains[0];
        assert_eq!(calc.commands[1].properties[0].value.to_string(), "3");
        let child = &parsed.catalogs[1];
        assert_eq!(child.extends.as_deref(), Some("Math"));
        assert_eq!(child.chains[0].commands[0].replace_id.as_deref(), Some("divide"));
        assert_eq!(child.chains[0].commands[0].chain.as_deref(), Some("Math/Calc"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let doc = r#"
            [[catalog]]
            id = "Math"
            colour = "blue"
        "#;
        assert!(toml::from_str::<ChainConfigFile>(doc).is_err());
    }

    #[test]
    fn test_scalar_values_render_as_text() {
        assert_eq!(ScalarValue::Bool(true).to_string(), "true");
        assert_eq!(ScalarValue::Float(1.5).to_string(), "1.5");
        assert_eq!(ScalarValue::String("x".into()).to_string(), "x");
    }

    #[test]
    fn test_json_documents_share_the_model() {
        let doc = r#"{ "catalog": [ { "id": "A", "chain": [ { "id": "c", "command": [
            { "id": "s", "class": "Simple" } ] } ] } ] }"#;
        let parsed: ChainConfigFile = serde_json::from_str(doc).unwrap();
        assert_eq!(parsed.catalogs[0].chains[0].commands[0].class.as_deref(), Some("Simple"));
    }
}
