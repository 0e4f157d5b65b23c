// src/commands/sample.rs

//! Small arithmetic commands over integer context attributes.

use crate::core::command::{Command, CommandError, CommandProperties};
use crate::core::context::ChainContext;
use crate::core::result::ChainResult;

// --- HELPERS ---

/// Reads `key`, applies `op` and writes the result back, failing the step if the attribute
/// is missing, not an integer, or the operation overflows.
fn update_integer(context: &mut ChainContext, key: &str, op: impl FnOnce(i64) -> Option<i64>) -> ChainResult {
    let Some(current) = context.get_i64(key) else {
        log::error!("Attribute '{}' is missing or not an integer.", key);
        return ChainResult::fail(format!("attribute '{}' is missing or not an integer", key));
    };
    let Some(updated) = op(current) else {
        log::error!("Arithmetic overflow updating '{}' (was {}).", key, current);
        return ChainResult::fail(format!("arithmetic overflow on '{}'", key));
    };
    context.set_attribute(key, updated);
    log_abc(context);
    ChainResult::success()
}

fn log_abc(context: &ChainContext) {
    log::debug!(
        "a, b, answer == {:?}, {:?}, {:?}",
        context.get_i64("a"),
        context.get_i64("b"),
        context.get_i64("answer")
    );
}

// --- COMMANDS ---

/// `a = a / 2` (integer division).
#[derive(Debug, Default, Clone, Copy)]
pub struct DivideABy2;

impl Command for DivideABy2 {
    fn execute(&mut self, context: &mut ChainContext) -> ChainResult {
        update_integer(context, "a", |a| a.checked_div(2))
    }
}

/// `b = b + 5`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Add5ToB;

impl Command for Add5ToB {
    fn execute(&mut self, context: &mut ChainContext) -> ChainResult {
        update_integer(context, "b", |b| b.checked_add(5))
    }
}

/// `answer = answer * factor`. The `factor` property is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiplyByX {
    factor: i64,
}

impl MultiplyByX {
    /// Multiplies `answer` by `factor`.
    pub fn new(factor: i64) -> Self {
        Self { factor }
    }

    /// Reads the required `factor` property.
    pub fn from_properties(properties: &CommandProperties) -> Result<Self, CommandError> {
        Ok(Self::new(properties.parse("factor")?))
    }
}

impl Command for MultiplyByX {
    fn execute(&mut self, context: &mut ChainContext) -> ChainResult {
        let factor = self.factor;
        update_integer(context, "answer", |answer| answer.checked_mul(factor))
    }
}

/// Adds `by` (default 1) to `attribute` (default `answer`). A missing attribute counts as 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    attribute: String,
    by: i64,
}

impl Increment {
    /// Adds `by` to `attribute`.
    pub fn new(attribute: impl Into<String>, by: i64) -> Self {
        Self {
            attribute: attribute.into(),
            by,
        }
    }

    /// Reads `attribute` (default `answer`) and `by` (default 1).
    pub fn from_properties(properties: &CommandProperties) -> Result<Self, CommandError> {
        let attribute = properties.get("attribute").unwrap_or("answer");
        Ok(Self::new(attribute, properties.parse_or("by", 1)?))
    }
}

impl Command for Increment {
    fn execute(&mut self, context: &mut ChainContext) -> ChainResult {
        if context.get_attribute(&self.attribute).is_none() {
            context.set_attribute(self.attribute.as_str(), 0);
        }
        let by = self.by;
        update_integer(context, &self.attribute, |value| value.checked_add(by))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chain_manager::ChainManager;
    use crate::core::config_loader::ConfigFormat;
    use crate::core::result::ResultCode;

    const MATH: &str = r#"
        [[catalog]]
        id = "Math"

        [[catalog.chain]]
        id = "Calc"

        [[catalog.chain.command]]
        id = "divide"
        class = "DivideABy2"

        [[catalog.chain.command]]
        id = "add"
        class = "Add5ToB"

        [[catalog.chain.command]]
        id = "multiply"
        class = "MultiplyByX"
        property = [{ id = "factor", value = "3" }]
    "#;

    fn math_manager() -> ChainManager {
        let mut builder = ChainManager::builder();
        builder.load_str(MATH, ConfigFormat::Toml, "math").unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_math_chain() {
        let manager = math_manager();
        let mut ctx = manager.create_context();
        ctx.set_attribute("a", 10);
        ctx.set_attribute("b", 10);
        ctx.set_attribute("answer", 1);

        let result = manager.execute_chain("Math/Calc", &mut ctx);

        assert!(result.is_success());
        assert_eq!(ctx.get_i64("a"), Some(5));
        assert_eq!(ctx.get_i64("b"), Some(15));
        assert_eq!(ctx.get_i64("answer"), Some(3));
    }

    #[test]
    fn test_missing_attribute_fails_the_chain() {
        let manager = math_manager();
        let mut ctx = manager.create_context();
        ctx.set_attribute("a", 10);

        let result = manager.execute_chain("Math/Calc", &mut ctx);

        assert_eq!(result.code(), ResultCode::Fail);
        assert!(result.extra_info().contains("'b'"));
        // The first step already ran.
        assert_eq!(ctx.get_i64("a"), Some(5));
    }

    #[test]
    fn test_multiply_requires_integer_factor() {
        let props: CommandProperties = [("factor", "x")].into_iter().collect();
        let err = MultiplyByX::from_properties(&props).unwrap_err();
        assert_eq!(err.kind_name(), "InvalidProperty");
    }

    #[test]
    fn test_overflow_fails_instead_of_wrapping() {
        let mut ctx = ChainContext::new();
        ctx.set_attribute("answer", i64::MAX);
        let result = MultiplyByX::new(2).execute(&mut ctx);
        assert_eq!(result.code(), ResultCode::Fail);
        assert_eq!(ctx.get_i64("answer"), Some(i64::MAX));
    }

    #[test]
    fn test_increment_defaults() {
        let mut ctx = ChainContext::new();
        let mut inc = Increment::from_properties(&CommandProperties::new()).unwrap();
        assert!(inc.execute(&mut ctx).is_success());
        assert!(inc.execute(&mut ctx).is_success());
        assert_eq!(ctx.get_i64("answer"), Some(2));

        let props: CommandProperties = [("attribute", "count"), ("by", "-3")].into_iter().collect();
        let mut dec = Increment::from_properties(&props).unwrap();
        ctx.set_attribute("count", "10");
        assert!(dec.execute(&mut ctx).is_success());
        assert_eq!(ctx.get_i64("count"), Some(7));
    }
}
