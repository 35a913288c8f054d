#![allow(dead_code)]

// Fakes for the package manager seams, shared by the integration tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use neokat::apt::{AptBackend, CommandRunner, ExternalCommand, PackageDatabase};
use neokat::executor::PackageBackend;
use neokat::types::{FallbackChannel, ItemOutcome};

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

/// Backend returning scripted outcomes (default `Success`) and logging calls
#[derive(Default)]
pub struct ScriptedBackend {
    pub outcomes: HashMap<String, ItemOutcome>,
    pub calls: Vec<String>,
    /// Raise `interrupt` once this many items have been processed
    pub interrupt_after: Option<(usize, &'static AtomicBool)>,
}

impl ScriptedBackend {
    pub fn with(outcomes: &[(&str, ItemOutcome)]) -> Self {
        Self {
            outcomes: outcomes.iter().map(|(n, o)| ((*n).to_string(), *o)).collect(),
            ..Self::default()
        }
    }

    fn handle(&mut self, name: &str) -> ItemOutcome {
        self.calls.push(name.to_string());
        if let Some((after, flag)) = self.interrupt_after
            && self.calls.len() == after
        {
            flag.store(true, Ordering::SeqCst);
        }
        self.outcomes.get(name).copied().unwrap_or(ItemOutcome::Success)
    }
}

impl PackageBackend for ScriptedBackend {
    fn install(&mut self, name: &str) -> ItemOutcome {
        self.handle(name)
    }

    fn remove(&mut self, name: &str) -> ItemOutcome {
        self.handle(name)
    }
}

/// Command runner that logs every command line and fails listed programs
#[derive(Clone, Default)]
pub struct RecordingRunner {
    pub log: Rc<RefCell<Vec<String>>>,
    pub failing: HashSet<String>,
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, command: &ExternalCommand) -> io::Result<bool> {
        self.log.borrow_mut().push(command.to_string());
        Ok(!self.failing.contains(&command.program))
    }
}

/// Package database with a fixed installed set
pub struct FakeDatabase {
    pub installed: Vec<String>,
}

impl PackageDatabase for FakeDatabase {
    fn is_installed(&mut self, name: &str) -> bool {
        self.installed.iter().any(|p| p == name)
    }

    fn installed_packages(&mut self) -> Vec<String> {
        let mut names = self.installed.clone();
        names.sort();
        names
    }

    fn invalidate(&mut self) {}
}

/// An `AptBackend` over fakes, plus the shared command log
pub fn fake_apt(installed: &[&str], failing: &[&str]) -> (AptBackend, Rc<RefCell<Vec<String>>>) {
    let runner = RecordingRunner {
        log: Rc::new(RefCell::new(Vec::new())),
        failing: failing.iter().map(|s| (*s).to_string()).collect(),
    };
    let log = Rc::clone(&runner.log);
    let db = FakeDatabase {
        installed: names(installed),
    };
    let backend = AptBackend::new(Box::new(runner), Box::new(db), Some(FallbackChannel::Snap), true);
    (backend, log)
}
