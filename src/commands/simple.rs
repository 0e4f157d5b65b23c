// src/commands/simple.rs

use crate::core::command::Command;
use crate::core::context::ChainContext;
use crate::core::result::ChainResult;

/// Succeeds in every phase and touches nothing. Useful as a placeholder or jump label.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleCommand;

impl Command for SimpleCommand {
    fn execute(&mut self, _context: &mut ChainContext) -> ChainResult {
        ChainResult::success()
    }
}
