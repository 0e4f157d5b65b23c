// src/commands/mod.rs

//! Built-in command types.
//!
//! `Simple`, `LoopStart` and `LoopEnd` are engine primitives. The arithmetic commands
//! operate on integer context attributes and are handy for trying chains from the CLI.

pub mod loop_control;
pub mod sample;
/// `Simple`: succeeds without doing anything.
pub mod simple;

use crate::core::command::{Command, CommandRegistry};

/// Type name of [`simple::SimpleCommand`].
pub const SIMPLE: &str = "Simple";
/// Type name of [`loop_control::LoopStartCommand`].
pub const LOOP_START: &str = "LoopStart";
/// Type name of [`loop_control::LoopEndCommand`].
pub const LOOP_END: &str = "LoopEnd";
/// Type name of [`sample::DivideABy2`].
pub const DIVIDE_A_BY_2: &str = "DivideABy2";
/// Type name of [`sample::Add5ToB`].
pub const ADD_5_TO_B: &str = "Add5ToB";
/// Type name of [`sample::MultiplyByX`].
pub const MULTIPLY_BY_X: &str = "MultiplyByX";
/// Type name of [`sample::Increment`].
pub const INCREMENT: &str = "Increment";

/// Registers every built-in command type.
pub fn register_builtins(registry: &mut CommandRegistry) {
    registry.register(SIMPLE, |_| Ok(Box::new(simple::SimpleCommand) as Box<dyn Command>));
    registry.register(LOOP_START, |props| {
        Ok(Box::new(loop_control::LoopStartCommand::from_properties(props)?) as Box<dyn Command>)
    });
    registry.register(LOOP_END, |_| Ok(Box::new(loop_control::LoopEndCommand) as Box<dyn Command>));
    registry.register(DIVIDE_A_BY_2, |_| Ok(Box::new(sample::DivideABy2) as Box<dyn Command>));
    registry.register(ADD_5_TO_B, |_| Ok(Box::new(sample::Add5ToB) as Box<dyn Command>));
    registry.register(MULTIPLY_BY_X, |props| {
        Ok(Box::new(sample::MultiplyByX::from_properties(props)?) as Box<dyn Command>)
    });
    registry.register(INCREMENT, |props| {
        Ok(Box::new(sample::Increment::from_properties(props)?) as Box<dyn Command>)
    });
}
