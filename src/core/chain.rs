//! # Chain
//!
//! A chain is the interpreted program of the engine: an ordered list of steps plus the loop
//! that walks them. The cursor lives on the stack of [`Chain::execute`], so any number of
//! threads can run the same chain at once, and a chain can call itself as a sub-chain.

use crate::constants::CHAIN_REF_SEPARATOR;
use crate::core::chain_manager::ChainManager;
use crate::core::command::CommandProperties;
use crate::core::command_config::{CommandConfig, StepKind};
use crate::core::context::ChainContext;
use crate::core::result::{ChainResult, ResultCode};
use thiserror::Error;

/// Errors raised while assembling the step list of a chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// `replace_id` names a step the chain does not have.
    #[error("Step '{step_id}' in chain '{chain_id}' replaces '{replace_id}', but no such step exists.")]
    ReplaceTargetNotFound {
        /// The chain being assembled.
        chain_id: String,
        /// The replacing step.
        step_id: String,
        /// The id that could not be found.
        replace_id: String,
    },
    /// Two steps of the same chain share an id.
    #[error("Chain '{chain_id}' already has a step with id '{step_id}'. Use replace_id to override it.")]
    DuplicateStepId {
        /// The chain being assembled.
        chain_id: String,
        /// The repeated id.
        step_id: String,
    },
}

/// How the interpreter moves after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Advance,
    Restart,
    Redo,
    Jump(usize),
    Stop,
}

/// A named, ordered sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    id: String,
    extends: Option<String>,
    steps: Vec<CommandConfig>,
}

impl Chain {
    /// An empty chain.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extends: None,
            steps: Vec::new(),
        }
    }

    /// Creates a chain that starts from a deep copy of `base`'s steps.
    ///
    /// `extends` is the `"catalogId/chainId"` reference `base` was resolved from.
    pub fn derived(id: impl Into<String>, extends: impl Into<String>, base: &Self) -> Self {
        Self {
            id: id.into(),
            extends: Some(extends.into()),
            steps: base.steps.clone(),
        }
    }

    /// A copy of this chain under another id, as catalog inheritance needs it.
    pub(crate) fn cloned_as(&self, id: &str) -> Self {
        Self {
            id: id.to_string(),
            extends: self.extends.clone(),
            steps: self.steps.clone(),
        }
    }

    /// Appends a step, or replaces the step whose id equals the new step's `replace_id`.
    pub fn add_command(&mut self, step: CommandConfig) -> Result<(), StepError> {
        match step.replace_id() {
            Some(replace_id) => {
                let position = self
                    .position_of(replace_id)
                    .ok_or_else(|| StepError::ReplaceTargetNotFound {
                        chain_id: self.id.clone(),
                        step_id: step.id().to_string(),
                        replace_id: replace_id.to_string(),
                    })?;
                // The replacement may keep the old id or take a new one, but it must not
                // collide with a third step.
                if step.id() != replace_id && self.position_of(step.id()).is_some() {
                    return Err(StepError::DuplicateStepId {
                        chain_id: self.id.clone(),
                        step_id: step.id().to_string(),
                    });
                }
                if let Some(slot) = self.steps.get_mut(position) {
                    log::debug!("Chain '{}': step '{}' replaced by '{}'.", self.id, replace_id, step.id());
                    *slot = step;
                }
            }
            None => {
                if self.position_of(step.id()).is_some() {
                    return Err(StepError::DuplicateStepId {
                        chain_id: self.id.clone(),
                        step_id: step.id().to_string(),
                    });
                }
                self.steps.push(step);
            }
        }
        Ok(())
    }

    /// The chain id, unique within its catalog.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `"catalogId/chainId"` this chain was derived from.
    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    /// The steps in execution order.
    pub fn steps(&self) -> &[CommandConfig] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `true` if the chain has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The position of the step with the given id.
    pub fn position_of(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == step_id)
    }

    /// Runs the chain against `context` and returns its final result.
    ///
    /// The context's catalog and chain ids must already point at this chain (which
    /// `ChainManager::execute_chain` takes care of); they namespace the engine's own keys.
    /// The loop below is the whole interpreter:
    ///
    /// 1. Publish the cursor as `<catalog>_<chain>_executionIndex`.
    /// 2. Run the step: either a nested `execute_chain`, or `init`/`execute`/`cleanup` on a
    ///    freshly built command.
    /// 3. Move the cursor according to the step's result code.
    ///
    /// Nothing escapes as a panic or error: a step that cannot be built ends the chain
    /// with `FAIL` and the error kind in `extra_info`.
    pub fn execute(&self, manager: &ChainManager, context: &mut ChainContext) -> ChainResult {
        let catalog_id = context.catalog_id().to_string();
        let chain_id = context.chain_id().to_string();
        let max_steps = manager.options().max_steps;

        let mut result = ChainResult::success();
        let mut cursor: usize = 0;
        let mut visits: u64 = 0;

        while let Some(step) = self.steps.get(cursor) {
            visits += 1;
            if let Some(limit) = max_steps
                && visits > limit
            {
                log::error!(
                    "Chain '{}/{}' exceeded the limit of {} step executions. Stopping.",
                    catalog_id,
                    chain_id,
                    limit
                );
                return ChainResult::fail("StepLimitExceeded");
            }

            context.publish_execution_index(cursor);
            log::info!("Next step in '{}/{}' (#{}): {}", catalog_id, chain_id, cursor, step);

            let (step_result, flow) = match step.kind() {
                StepKind::SubChain { chain_ref } => {
                    self.run_sub_chain(manager, context, chain_ref, &catalog_id, &chain_id)
                }
                StepKind::Command {
                    type_name,
                    properties,
                } => self.run_command(manager, context, step.id(), type_name, properties),
            };
            result = step_result;

            match flow {
                Flow::Advance => cursor += 1,
                Flow::Restart => {
                    log::debug!("Restarting chain '{}/{}'.", catalog_id, chain_id);
                    cursor = 0;
                }
                Flow::Redo => log::debug!("Redoing step #{} of '{}/{}'.", cursor, catalog_id, chain_id),
                Flow::Jump(target) => {
                    log::debug!("Jumping from step #{} to #{} in '{}/{}'.", cursor, target, catalog_id, chain_id);
                    cursor = target;
                }
                Flow::Stop => break,
            }
        }

        match result.code() {
            ResultCode::Fail => log::error!("Chain '{}/{}' FAILED: {}", catalog_id, chain_id, result),
            ResultCode::Abort => log::warn!("Chain '{}/{}' ABORTED: {}", catalog_id, chain_id, result),
            _ => log::debug!("Chain '{}/{}' finished: {}", catalog_id, chain_id, result),
        }
        result
    }

    /// Runs a sub-chain step. There is no cleanup to call here; the nested chain ran its own.
    fn run_sub_chain(
        &self,
        manager: &ChainManager,
        context: &mut ChainContext,
        chain_ref: &str,
        catalog_id: &str,
        chain_id: &str,
    ) -> (ChainResult, Flow) {
        let qualified = qualify_chain_ref(chain_ref, catalog_id);
        let nested = manager.execute_chain(&qualified, context);
        // execute_chain points the context at the nested chain; take it back.
        context.set_location(catalog_id, chain_id);

        let flow = match nested.code() {
            ResultCode::Fail | ResultCode::Abort => Flow::Stop,
            ResultCode::RestartChain => Flow::Restart,
            ResultCode::RedoCommand => Flow::Redo,
            // Jumps address steps of the chain that produced them, never the caller's.
            ResultCode::Success | ResultCode::JumpToCommand | ResultCode::JumpToIndex => Flow::Advance,
        };
        (nested, flow)
    }

    /// Runs a leaf step through the full `init` / `execute` / `cleanup` lifecycle.
    fn run_command(
        &self,
        manager: &ChainManager,
        context: &mut ChainContext,
        step_id: &str,
        type_name: &str,
        properties: &CommandProperties,
    ) -> (ChainResult, Flow) {
        let mut command = match manager.registry().create(type_name, properties) {
            Ok(command) => command,
            Err(e) => {
                log::error!("Step '{}' could not be created: {}", step_id, e);
                return (ChainResult::fail(e.kind_name()), Flow::Stop);
            }
        };

        let initialized = command.init(context);
        if initialized.is_terminal() {
            log::debug!("Step '{}' init() returned {}.", step_id, initialized);
            return (initialized, Flow::Stop);
        }

        let executed = command.execute(context);
        let flow = match executed.code() {
            ResultCode::Success => Flow::Advance,
            ResultCode::RestartChain => Flow::Restart,
            ResultCode::RedoCommand => Flow::Redo,
            ResultCode::JumpToCommand => {
                let Some(target) = executed.target_command() else {
                    log::error!(
                        "Step '{}' returned JUMP_TO_COMMAND without a target. Chain execution will FAIL.",
                        step_id
                    );
                    let _ = command.cleanup(context);
                    return (
                        ChainResult::fail("JUMP_TO_COMMAND requested but target command was not set"),
                        Flow::Stop,
                    );
                };
                match self.position_of(target) {
                    Some(index) => Flow::Jump(index),
                    None => {
                        log::error!(
                            "JUMP_TO_COMMAND target '{}' requested by step '{}' was not found. Chain execution will FAIL.",
                            target,
                            step_id
                        );
                        let _ = command.cleanup(context);
                        return (
                            ChainResult::fail(format!(
                                "JUMP_TO_COMMAND target command '{}' not found",
                                target
                            )),
                            Flow::Stop,
                        );
                    }
                }
            }
            ResultCode::JumpToIndex => match executed.target_index().filter(|i| *i < self.steps.len()) {
                Some(index) => Flow::Jump(index),
                None => {
                    log::error!(
                        "JUMP_TO_INDEX requested by step '{}' is out of range ({:?} of {} steps).",
                        step_id,
                        executed.target_index(),
                        self.steps.len()
                    );
                    let _ = command.cleanup(context);
                    return (ChainResult::fail("JUMP_TO_INDEX target out of range"), Flow::Stop);
                }
            },
            ResultCode::Fail | ResultCode::Abort => {
                // Cleanup still runs, but its result cannot change the outcome.
                let _ = command.cleanup(context);
                return (executed, Flow::Stop);
            }
        };

        let cleaned = command.cleanup(context);
        if cleaned.is_terminal() {
            log::debug!("Step '{}' cleanup() returned {}.", step_id, cleaned);
            return (cleaned, Flow::Stop);
        }
        (cleaned, flow)
    }
}

/// Prefixes a bare chain id with the calling catalog.
pub(crate) fn qualify_chain_ref(chain_ref: &str, catalog_id: &str) -> String {
    if chain_ref.contains(CHAIN_REF_SEPARATOR) {
        chain_ref.to_string()
    } else {
        format!("{}{}{}", catalog_id, CHAIN_REF_SEPARATOR, chain_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::chain_manager::EngineOptions;
    use crate::core::test_support::{Harness, Script};
    use serde_json::json;

    fn manager_with(harness: &Harness, chains: Vec<Chain>) -> ChainManager {
        let mut catalog = Catalog::new("Test");
        for chain in chains {
            catalog.add_chain(chain);
        }
        ChainManager::new([catalog], harness.registry.clone())
    }

    fn chain_of(id: &str, steps: &[(&str, &str)]) -> Chain {
        let mut chain = Chain::new(id);
        for (step_id, type_name) in steps {
            chain.add_command(CommandConfig::command(*step_id, *type_name)).unwrap();
        }
        chain
    }

    #[test]
    fn test_plain_chain_visits_every_step_once_in_order() {
        let mut h = Harness::new();
        for name in ["A", "B", "C"] {
            h.script(name, Script::default());
        }
        let manager = manager_with(&h, vec![chain_of("main", &[("a", "A"), ("b", "B"), ("c", "C")])]);
        let mut ctx = manager.create_context();

        let result = manager.execute_chain("Test/main", &mut ctx);

        assert!(result.is_success());
        assert_eq!(
            h.journal(),
            vec![
                "A.init", "A.execute", "A.cleanup", "B.init", "B.execute", "B.cleanup", "C.init",
                "C.execute", "C.cleanup"
            ]
        );
        assert_eq!(ctx.result(), Some(&result));
    }

    #[test]
    fn test_redo_runs_the_same_step_again_immediately() {
        let mut h = Harness::new();
        h.script("A", Script::executing(vec![ChainResult::redo_command()]));
        h.script("B", Script::default());
        let manager = manager_with(&h, vec![chain_of("main", &[("a", "A"), ("b", "B")])]);
        let mut ctx = manager.create_context();

        assert!(manager.execute_chain("Test/main", &mut ctx).is_success());
        assert_eq!(
            h.executions(),
            vec!["A.execute", "A.execute", "B.execute"]
        );
        // Each visit is a full lifecycle, cleanup included.
        assert_eq!(h.count("A.cleanup"), 2);
    }

    #[test]
    fn test_restart_goes_back_to_the_first_step() {
        let mut h = Harness::new();
        h.script("A", Script::default());
        h.script("B", Script::executing(vec![ChainResult::restart_chain()]));
        h.script("C", Script::default());
        let manager =
            manager_with(&h, vec![chain_of("main", &[("a", "A"), ("b", "B"), ("c", "C")])]);
        let mut ctx = manager.create_context();
        ctx.set_attribute("keep", "me");

        assert!(manager.execute_chain("Test/main", &mut ctx).is_success());
        assert_eq!(
            h.executions(),
            vec!["A.execute", "B.execute", "A.execute", "B.execute", "C.execute"]
        );
        assert_eq!(ctx.get_attribute("keep"), Some(&json!("me")));
    }

    #[test]
    fn test_jump_to_existing_command() {
        let mut h = Harness::new();
        h.script("A", Script::executing(vec![ChainResult::jump_to_command("c")]));
        h.script("B", Script::default());
        h.script("C", Script::default());
        let manager =
            manager_with(&h, vec![chain_of("main", &[("a", "A"), ("b", "B"), ("c", "C")])]);
        let mut ctx = manager.create_context();

        assert!(manager.execute_chain("Test/main", &mut ctx).is_success());
        assert_eq!(h.executions(), vec!["A.execute", "C.execute"]);
    }

    #[test]
    fn test_jump_to_missing_command_fails_without_running_more_steps() {
        let mut h = Harness::new();
        h.script("A", Script::executing(vec![ChainResult::jump_to_command("nowhere")]));
        h.script("B", Script::default());
        let manager = manager_with(&h, vec![chain_of("main", &[("a", "A"), ("b", "B")])]);
        let mut ctx = manager.create_context();

        let result = manager.execute_chain("Test/main", &mut ctx);

        assert_eq!(result.code(), ResultCode::Fail);
        assert!(result.extra_info().contains("not found"));
        assert_eq!(h.journal(), vec!["A.init", "A.execute", "A.cleanup"]);
    }

    #[test]
    fn test_jump_without_target_fails_instead_of_looping() {
        let mut h = Harness::new();
        h.script("E", Script::default());
        h.script("A", Script::executing(vec![ChainResult::new(ResultCode::JumpToCommand)]));
        // An empty id must not catch a jump that names no step at all.
        let manager = manager_with(&h, vec![chain_of("main", &[("", "E"), ("a", "A")])]);
        let mut ctx = manager.create_context();

        let result = manager.execute_chain("Test/main", &mut ctx);

        assert_eq!(result.code(), ResultCode::Fail);
        assert!(result.extra_info().contains("not set"));
        assert_eq!(h.executions(), vec!["E.execute", "A.execute"]);
        assert_eq!(h.count("A.cleanup"), 1);
    }

    #[test]
    fn test_jump_to_index_out_of_range_fails_after_one_cleanup() {
        let mut h = Harness::new();
        h.script("A", Script::executing(vec![ChainResult::jump_to_index(2)]));
        h.script("B", Script::default());
        let manager = manager_with(&h, vec![chain_of("main", &[("a", "A"), ("b", "B")])]);
        let mut ctx = manager.create_context();

        let result = manager.execute_chain("Test/main", &mut ctx);

        assert_eq!(result, ChainResult::fail("JUMP_TO_INDEX target out of range"));
        assert_eq!(h.journal(), vec!["A.init", "A.execute", "A.cleanup"]);
    }

    #[test]
    fn test_fail_and_abort_stop_after_one_cleanup() {
        for terminal in [ChainResult::fail("boom"), ChainResult::abort("enough")] {
            let mut h = Harness::new();
            h.script("A", Script::default());
            h.script("B", Script::executing(vec![terminal.clone()]));
            h.script("C", Script::default());
            let manager =
                manager_with(&h, vec![chain_of("main", &[("a", "A"), ("b", "B"), ("c", "C")])]);
            let mut ctx = manager.create_context();

            let result = manager.execute_chain("Test/main", &mut ctx);

            assert_eq!(result, terminal);
            assert_eq!(h.count("B.cleanup"), 1);
            assert_eq!(h.count("C.init"), 0);
        }
    }

    #[test]
    fn test_failed_init_skips_execute_and_cleanup() {
        let mut h = Harness::new();
        h.script(
            "A",
            Script {
                init: vec![ChainResult::abort("not ready")].into(),
                ..Script::default()
            },
        );
        h.script("B", Script::default());
        let manager = manager_with(&h, vec![chain_of("main", &[("a", "A"), ("b", "B")])]);
        let mut ctx = manager.create_context();

        let result = manager.execute_chain("Test/main", &mut ctx);

        assert_eq!(result.code(), ResultCode::Abort);
        assert_eq!(h.journal(), vec!["A.init"]);
    }

    #[test]
    fn test_failed_cleanup_stops_the_chain() {
        let mut h = Harness::new();
        h.script(
            "A",
            Script {
                cleanup: vec![ChainResult::fail("leak")].into(),
                ..Script::default()
            },
        );
        h.script("B", Script::default());
        let manager = manager_with(&h, vec![chain_of("main", &[("a", "A"), ("b", "B")])]);
        let mut ctx = manager.create_context();

        let result = manager.execute_chain("Test/main", &mut ctx);

        assert_eq!(result, ChainResult::fail("leak"));
        assert_eq!(h.count("B.init"), 0);
    }

    #[test]
    fn test_unknown_command_type_fails_with_error_kind() {
        let h = Harness::new();
        let manager = manager_with(&h, vec![chain_of("main", &[("a", "DoesNotExist")])]);
        let mut ctx = manager.create_context();

        let result = manager.execute_chain("Test/main", &mut ctx);

        assert_eq!(result, ChainResult::fail("UnknownType"));
    }

    #[test]
    fn test_sub_chain_runs_in_place_and_restores_namespace() {
        let mut h = Harness::new();
        h.script("A", Script::default());
        h.script("S", Script::default());
        h.script("B", Script::default());
        let mut main = chain_of("main", &[("a", "A")]);
        main.add_command(CommandConfig::sub_chain("sub", "helper")).unwrap();
        main.add_command(CommandConfig::command("b", "B")).unwrap();
        let helper = chain_of("helper", &[("s", "S")]);
        let manager = manager_with(&h, vec![main, helper]);
        let mut ctx = manager.create_context();

        assert!(manager.execute_chain("Test/main", &mut ctx).is_success());
        assert_eq!(h.executions(), vec!["A.execute", "S.execute", "B.execute"]);
        assert_eq!(ctx.chain_id(), "main");
        assert_eq!(ctx.get_attribute("Test_main_executionIndex"), Some(&json!(2)));
        assert_eq!(ctx.get_attribute("Test_helper_executionIndex"), Some(&json!(0)));
    }

    #[test]
    fn test_sub_chain_failure_propagates() {
        let mut h = Harness::new();
        h.script("S", Script::executing(vec![ChainResult::fail("deep")]));
        h.script("B", Script::default());
        let mut main = Chain::new("main");
        main.add_command(CommandConfig::sub_chain("sub", "Test/helper")).unwrap();
        main.add_command(CommandConfig::command("b", "B")).unwrap();
        let manager = manager_with(&h, vec![main, chain_of("helper", &[("s", "S")])]);
        let mut ctx = manager.create_context();

        let result = manager.execute_chain("Test/main", &mut ctx);

        assert_eq!(result, ChainResult::fail("deep"));
        assert_eq!(h.count("B.init"), 0);
    }

    /// `main` = [a: A, sub: helper, b: B], `helper` = [s: S]. A sub-chain ends with the
    /// result of its last cleanup, which is how a control code leaves a nested chain.
    fn nested_with_helper_cleanup(final_cleanup: ChainResult) -> (Harness, ChainManager) {
        let mut h = Harness::new();
        h.script("A", Script::default());
        h.script(
            "S",
            Script {
                cleanup: vec![final_cleanup].into(),
                ..Script::default()
            },
        );
        h.script("B", Script::default());
        let mut main = chain_of("main", &[("a", "A")]);
        main.add_command(CommandConfig::sub_chain("sub", "helper")).unwrap();
        main.add_command(CommandConfig::command("b", "B")).unwrap();
        let manager = manager_with(&h, vec![main, chain_of("helper", &[("s", "S")])]);
        (h, manager)
    }

    #[test]
    fn test_sub_chain_redo_runs_the_sub_chain_step_again() {
        let (h, manager) = nested_with_helper_cleanup(ChainResult::redo_command());
        let mut ctx = manager.create_context();

        assert!(manager.execute_chain("Test/main", &mut ctx).is_success());
        assert_eq!(h.executions(), vec!["A.execute", "S.execute", "S.execute", "B.execute"]);
    }

    #[test]
    fn test_sub_chain_restart_restarts_the_caller() {
        let (h, manager) = nested_with_helper_cleanup(ChainResult::restart_chain());
        let mut ctx = manager.create_context();

        assert!(manager.execute_chain("Test/main", &mut ctx).is_success());
        assert_eq!(
            h.executions(),
            vec!["A.execute", "S.execute", "A.execute", "S.execute", "B.execute"]
        );
    }

    #[test]
    fn test_sub_chain_jump_lets_the_caller_advance() {
        // "a" exists in the caller; the jump must still not land there.
        let (h, manager) = nested_with_helper_cleanup(ChainResult::jump_to_command("a"));
        let mut ctx = manager.create_context();

        let result = manager.execute_chain("Test/main", &mut ctx);

        assert!(result.is_success());
        assert_eq!(h.executions(), vec!["A.execute", "S.execute", "B.execute"]);
        assert_eq!(ctx.chain_id(), "main");
    }

    #[test]
    fn test_missing_sub_chain_fails() {
        let h = Harness::new();
        let mut main = Chain::new("main");
        main.add_command(CommandConfig::sub_chain("sub", "ghost")).unwrap();
        let manager = manager_with(&h, vec![main]);
        let mut ctx = manager.create_context();

        assert_eq!(manager.execute_chain("Test/main", &mut ctx).code(), ResultCode::Fail);
    }

    #[test]
    fn test_chain_can_call_itself() {
        let mut h = Harness::new();
        // Counts down `n`; jumps past the recursive step once it reaches zero.
        h.register_fn("CountDown", |ctx| {
            let n = ctx.get_i64("n").unwrap_or_default();
            if n <= 0 {
                return ChainResult::jump_to_command("done");
            }
            ctx.set_attribute("n", n - 1);
            ChainResult::success()
        });
        h.script("Done", Script::default());
        let mut main = chain_of("self", &[("count", "CountDown")]);
        main.add_command(CommandConfig::sub_chain("again", "self")).unwrap();
        main.add_command(CommandConfig::command("done", "Done")).unwrap();
        let manager = manager_with(&h, vec![main]);
        let mut ctx = manager.create_context();
        ctx.set_attribute("n", 3);

        assert!(manager.execute_chain("Test/self", &mut ctx).is_success());
        assert_eq!(ctx.get_i64("n"), Some(0));
        // Every level ends through its own `done` step.
        assert_eq!(h.count("Done.execute"), 4);
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_step_limit_bounds_endless_redo() {
        let mut h = Harness::new();
        h.register_fn("Forever", |_| ChainResult::redo_command());
        let manager = manager_with(&h, vec![chain_of("main", &[("x", "Forever")])])
            .with_options(EngineOptions {
                max_steps: Some(25),
                ..EngineOptions::default()
            });
        let mut ctx = manager.create_context();

        let result = manager.execute_chain("Test/main", &mut ctx);

        assert_eq!(result, ChainResult::fail("StepLimitExceeded"));
        assert_eq!(h.count("Forever.execute"), 25);
    }

    #[test]
    fn test_empty_chain_succeeds() {
        let h = Harness::new();
        let manager = manager_with(&h, vec![Chain::new("empty")]);
        let mut ctx = manager.create_context();
        assert!(manager.execute_chain("Test/empty", &mut ctx).is_success());
    }

    #[test]
    fn test_replace_and_duplicate_rules() {
        let mut chain = chain_of("main", &[("a", "A"), ("b", "B")]);

        chain
            .add_command(CommandConfig::command("b2", "C").replacing("b"))
            .unwrap();
        assert_eq!(chain.position_of("b2"), Some(1));
        assert_eq!(chain.position_of("b"), None);

        let dup = chain.add_command(CommandConfig::command("a", "A"));
        assert!(matches!(dup, Err(StepError::DuplicateStepId { .. })));

        let missing = chain.add_command(CommandConfig::command("z", "Z").replacing("nope"));
        assert!(matches!(missing, Err(StepError::ReplaceTargetNotFound { .. })));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_derived_chain_does_not_touch_base() {
        let base = chain_of("base", &[("a", "A"), ("b", "B")]);
        let snapshot = base.clone();
        let mut derived = Chain::derived("child", "Test/base", &base);
        derived
            .add_command(CommandConfig::command("b", "Other").replacing("b"))
            .unwrap();
        derived.add_command(CommandConfig::command("c", "C")).unwrap();

        assert_eq!(base, snapshot);
        assert_eq!(derived.len(), 3);
        assert_eq!(derived.extends(), Some("Test/base"));
    }

    #[test]
    fn test_base_chain_runs_the_same_after_derivation() {
        let mut h = Harness::new();
        for name in ["A", "B", "C", "D"] {
            h.script(name, Script::default());
        }
        let base = chain_of("work", &[("a", "A"), ("b", "B")]);

        let before = manager_with(&h, vec![base.clone()]);
        let mut ctx = before.create_context();
        assert!(before.execute_chain("Test/work", &mut ctx).is_success());
        let first_run = h.journal();

        let mut more = Chain::derived("more", "Test/work", &base);
        more.add_command(CommandConfig::command("c", "C").replacing("b")).unwrap();
        more.add_command(CommandConfig::command("d", "D")).unwrap();
        let after = manager_with(&h, vec![base, more]);
        let mut ctx = after.create_context();
        assert!(after.execute_chain("Test/work", &mut ctx).is_success());
        let second_run = h.journal()[first_run.len()..].to_vec();

        assert_eq!(second_run, first_run);
        assert_eq!(first_run, vec!["A.init", "A.execute", "A.cleanup", "B.init", "B.execute", "B.cleanup"]);

        let mut ctx = after.create_context();
        assert!(after.execute_chain("Test/more", &mut ctx).is_success());
        assert_eq!(
            h.executions()[4..].to_vec(),
            vec!["A.execute", "C.execute", "D.execute"]
        );
    }

    #[test]
    fn test_qualify_chain_ref() {
        assert_eq!(qualify_chain_ref("Calc", "Math"), "Math/Calc");
        assert_eq!(qualify_chain_ref("Other/Calc", "Math"), "Other/Calc");
    }
}
