// src/core/test_support.rs

//! Scripted commands and a shared journal for interpreter tests.

use crate::core::command::{Command, CommandRegistry};
use crate::core::context::ChainContext;
use crate::core::result::ChainResult;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Journal = Arc<Mutex<Vec<String>>>;

/// Queued results for each lifecycle phase. An empty queue answers `SUCCESS`.
///
/// The queues are shared by every instance the registry builds for one type name, so a
/// script describes the whole run, visit after visit.
#[derive(Debug, Default, Clone)]
pub struct Script {
    pub init: VecDeque<ChainResult>,
    pub execute: VecDeque<ChainResult>,
    pub cleanup: VecDeque<ChainResult>,
}

impl Script {
    pub fn executing(results: Vec<ChainResult>) -> Self {
        Self {
            execute: results.into(),
            ..Self::default()
        }
    }
}

struct Scripted {
    name: String,
    script: Arc<Mutex<Script>>,
    journal: Journal,
}

impl Scripted {
    fn next(&self, phase: &str, pick: fn(&mut Script) -> &mut VecDeque<ChainResult>) -> ChainResult {
        self.journal.lock().unwrap().push(format!("{}.{}", self.name, phase));
        let mut script = self.script.lock().unwrap();
        pick(&mut script).pop_front().unwrap_or_default()
    }
}

impl Command for Scripted {
    fn init(&mut self, _context: &mut ChainContext) -> ChainResult {
        self.next("init", |s| &mut s.init)
    }

    fn execute(&mut self, _context: &mut ChainContext) -> ChainResult {
        self.next("execute", |s| &mut s.execute)
    }

    fn cleanup(&mut self, _context: &mut ChainContext) -> ChainResult {
        self.next("cleanup", |s| &mut s.cleanup)
    }
}

type ExecuteFn = Arc<dyn Fn(&mut ChainContext) -> ChainResult + Send + Sync>;

struct FnCommand {
    name: String,
    body: ExecuteFn,
    journal: Journal,
}

impl FnCommand {
    fn record(&self, phase: &str) {
        self.journal.lock().unwrap().push(format!("{}.{}", self.name, phase));
    }
}

impl Command for FnCommand {
    fn init(&mut self, _context: &mut ChainContext) -> ChainResult {
        self.record("init");
        ChainResult::success()
    }

    fn execute(&mut self, context: &mut ChainContext) -> ChainResult {
        self.record("execute");
        (self.body)(context)
    }

    fn cleanup(&mut self, _context: &mut ChainContext) -> ChainResult {
        self.record("cleanup");
        ChainResult::success()
    }
}

/// A registry whose commands log every lifecycle call into one journal.
pub struct Harness {
    pub(crate) registry: CommandRegistry,
    journal: Journal,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            registry: CommandRegistry::new(),
            journal: Arc::default(),
        }
    }

    /// Registers `name` as a command that replays `script`.
    pub fn script(&mut self, name: &str, script: Script) {
        let script = Arc::new(Mutex::new(script));
        let journal = Arc::clone(&self.journal);
        let type_name = name.to_string();
        self.registry.register(name, move |_| {
            Ok(Box::new(Scripted {
                name: type_name.clone(),
                script: Arc::clone(&script),
                journal: Arc::clone(&journal),
            }) as Box<dyn Command>)
        });
    }

    /// Registers `name` as a command whose `execute` runs `body`.
    pub fn register_fn<F>(&mut self, name: &str, body: F)
    where
        F: Fn(&mut ChainContext) -> ChainResult + Send + Sync + 'static,
    {
        let body: ExecuteFn = Arc::new(body);
        let journal = Arc::clone(&self.journal);
        let type_name = name.to_string();
        self.registry.register(name, move |_| {
            Ok(Box::new(FnCommand {
                name: type_name.clone(),
                body: Arc::clone(&body),
                journal: Arc::clone(&journal),
            }) as Box<dyn Command>)
        });
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    /// Only the `execute` entries, in order.
    pub fn executions(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter(|e| e.ends_with(".execute"))
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.journal().iter().filter(|e| *e == entry).count()
    }
}
