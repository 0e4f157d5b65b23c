//! # Loop Commands
//!
//! `LoopStart` and `LoopEnd` bracket a block of steps that runs once per value of an integer
//! index, from `indexStart` to `indexEnd` inclusive:
//!
//! ```toml
//! [[catalog.chain.command]]
//! id = "loop"
//! class = "LoopStart"
//! property = [{ id = "indexStart", value = 1 }, { id = "indexEnd", value = 3 }]
//!
//! # ...body steps...
//!
//! [[catalog.chain.command]]
//! id = "endLoop"
//! class = "LoopEnd"
//! ```
//!
//! The loop state lives in the context under the chain's namespace, so loops in different
//! chains (including a chain and its sub-chains) do not interfere. The body always runs at
//! least once, even when `indexStart` is greater than `indexEnd`. Loops cannot be nested
//! inside the same chain; put the inner loop in a sub-chain instead.

use crate::constants::{IN_LOOP_KEY, LOOP_FIRST_COMMAND_INDEX_KEY, LOOP_INDEX_END_KEY, LOOP_INDEX_VAR_KEY};
use crate::core::command::{Command, CommandError, CommandProperties};
use crate::core::context::ChainContext;
use crate::core::result::ChainResult;

/// Opens a loop and records its bounds and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopStartCommand {
    index_start: i64,
    index_end: i64,
}

impl LoopStartCommand {
    /// A loop from `index_start` to `index_end`, both inclusive.
    pub fn new(index_start: i64, index_end: i64) -> Self {
        Self { index_start, index_end }
    }

    /// Reads the required `indexStart` and `indexEnd` properties.
    pub fn from_properties(properties: &CommandProperties) -> Result<Self, CommandError> {
        Ok(Self::new(properties.parse("indexStart")?, properties.parse("indexEnd")?))
    }
}

impl Command for LoopStartCommand {
    fn execute(&mut self, context: &mut ChainContext) -> ChainResult {
        let Some(position) = context.execution_index() else {
            return ChainResult::fail("LoopStart must run inside a chain");
        };
        log::debug!(
            "Loop opened at step #{} for {}..={}",
            position,
            self.index_start,
            self.index_end
        );

        let first = context.namespaced_key(LOOP_FIRST_COMMAND_INDEX_KEY);
        let var = context.namespaced_key(LOOP_INDEX_VAR_KEY);
        let end = context.namespaced_key(LOOP_INDEX_END_KEY);
        let in_loop = context.namespaced_key(IN_LOOP_KEY);
        context.set_attribute(first, position);
        context.set_attribute(var, self.index_start);
        context.set_attribute(end, self.index_end);
        context.set_attribute(in_loop, true);
        ChainResult::success()
    }
}

/// Closes a loop: either jumps back to the first body step or lets the chain continue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopEndCommand;

impl Command for LoopEndCommand {
    fn execute(&mut self, context: &mut ChainContext) -> ChainResult {
        let in_loop = context.namespaced_key(IN_LOOP_KEY);
        if context.get_attribute(&in_loop).is_none() {
            // No open loop in this chain.
            return ChainResult::success();
        }

        let var_key = context.namespaced_key(LOOP_INDEX_VAR_KEY);
        let (Some(current), Some(end), Some(first)) = (
            context.get_i64(&var_key),
            context.get_i64(&context.namespaced_key(LOOP_INDEX_END_KEY)),
            context.get_i64(&context.namespaced_key(LOOP_FIRST_COMMAND_INDEX_KEY)),
        ) else {
            return ChainResult::fail("Loop state in the context is missing or not numeric");
        };

        let next = current.saturating_add(1);
        if next > end {
            log::debug!("Loop finished after index {}.", current);
            context.remove_attribute(&in_loop);
            return ChainResult::success();
        }

        let Some(body_start) = usize::try_from(first).ok().and_then(|f| f.checked_add(1)) else {
            return ChainResult::fail("Loop start position is out of range");
        };
        context.set_attribute(var_key, next);
        ChainResult::jump_to_index(body_start)
    }
}
