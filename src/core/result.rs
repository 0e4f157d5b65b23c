// src/core/result.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// The control code carried by every [`ChainResult`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    /// The step completed; continue with the next one.
    Success,
    /// Something unexpected happened. Terminates the whole call stack.
    Fail,
    /// Intentional early termination. Handled like `Fail`, reported differently.
    Abort,
    /// Start the current chain over from its first step.
    RestartChain,
    /// Run the current step again.
    RedoCommand,
    /// Continue at the step whose id is `target_command`.
    JumpToCommand,
    /// Continue at the step at position `target_index`.
    JumpToIndex,
}

impl ResultCode {
    /// The upper-case name used in logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Fail => "FAIL",
            Self::Abort => "ABORT",
            Self::RestartChain => "RESTART_CHAIN",
            Self::RedoCommand => "REDO_COMMAND",
            Self::JumpToCommand => "JUMP_TO_COMMAND",
            Self::JumpToIndex => "JUMP_TO_INDEX",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The immutable outcome of a command lifecycle call or of a whole chain.
///
/// A fresh value is produced for every step; results are never reused between steps.
/// `target_command` only matters for [`ResultCode::JumpToCommand`] and `target_index`
/// only for [`ResultCode::JumpToIndex`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChainResult {
    code: ResultCode,
    #[serde(skip_serializing_if = "String::is_empty")]
    extra_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_index: Option<usize>,
}

impl ChainResult {
    /// Creates a result with the given code and no extra information.
    pub fn new(code: ResultCode) -> Self {
        Self {
            code,
            extra_info: String::new(),
            target_command: None,
            target_index: None,
        }
    }

    /// Creates a result with the given code and a free-form explanation.
    pub fn with_info(code: ResultCode, extra_info: impl Into<String>) -> Self {
        Self {
            extra_info: extra_info.into(),
            ..Self::new(code)
        }
    }

    /// The step completed.
    pub fn success() -> Self {
        Self::new(ResultCode::Success)
    }

    /// Something went wrong. Stops every chain on the stack.
    pub fn fail(extra_info: impl Into<String>) -> Self {
        Self::with_info(ResultCode::Fail, extra_info)
    }

    /// Intentional early stop.
    pub fn abort(extra_info: impl Into<String>) -> Self {
        Self::with_info(ResultCode::Abort, extra_info)
    }

    /// Starts the current chain over.
    pub fn restart_chain() -> Self {
        Self::new(ResultCode::RestartChain)
    }

    /// Runs the current step again.
    pub fn redo_command() -> Self {
        Self::new(ResultCode::RedoCommand)
    }

    /// Requests a jump to the step with the given id in the current chain.
    pub fn jump_to_command(target: impl Into<String>) -> Self {
        Self {
            target_command: Some(target.into()),
            ..Self::new(ResultCode::JumpToCommand)
        }
    }

    /// Requests that the interpreter continue at the given step position.
    pub fn jump_to_index(index: usize) -> Self {
        Self {
            target_index: Some(index),
            ..Self::new(ResultCode::JumpToIndex)
        }
    }

    /// The control code.
    pub fn code(&self) -> ResultCode {
        self.code
    }

    /// Free-form explanation, empty if none was given.
    pub fn extra_info(&self) -> &str {
        &self.extra_info
    }

    /// Step id to jump to, for `JumpToCommand`.
    pub fn target_command(&self) -> Option<&str> {
        self.target_command.as_deref()
    }

    /// Step position to jump to, for `JumpToIndex`.
    pub fn target_index(&self) -> Option<usize> {
        self.target_index
    }

    /// `true` for `Fail` and `Abort`, the two codes that stop a chain.
    pub fn is_terminal(&self) -> bool {
        matches!(self.code, ResultCode::Fail | ResultCode::Abort)
    }

    /// `true` for `Success`.
    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }
}

impl Default for ChainResult {
    fn default() -> Self {
        Self::success()
    }
}

impl fmt::Display for ChainResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(target) = &self.target_command {
            write!(f, " -> '{}'", target)?;
        }
        if let Some(index) = self.target_index {
            write!(f, " -> #{}", index)?;
        }
        if !self.extra_info.is_empty() {
            write!(f, " ({})", self.extra_info)?;
        }
        Ok(())
    }
}
