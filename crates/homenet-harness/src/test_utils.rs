//! Scripted collaborators for exercising the runner without real nodes
//!
//! Each [`ScriptedMachine`] replays queued unit states and command results.
//! When a queue runs dry its last entry repeats, so "fails twice then
//! succeeds forever" is three lines of setup. Scripting the same unit or
//! command again replaces its queue. Every interaction is appended to
//! a shared [`Journal`] so tests can assert ordering across nodes.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::error::{HarnessError, Result};
use crate::node::{CommandOutput, Machine, NodeSpec, Provisioner, UnitState};

/// Ordered record of collaborator calls
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Position of the first entry equal to `entry`
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == entry)
    }

    /// Whether any entry starts with `prefix`
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.0.lock().iter().any(|e| e.starts_with(prefix))
    }
}

fn next_scripted<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// A node whose answers are queued up front
pub struct ScriptedMachine {
    name: String,
    journal: Journal,
    units: Mutex<HashMap<String, VecDeque<UnitState>>>,
    commands: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
}

impl ScriptedMachine {
    pub fn new(name: &str, journal: Journal) -> Self {
        Self {
            name: name.to_string(),
            journal,
            units: Mutex::new(HashMap::new()),
            commands: Mutex::new(HashMap::new()),
        }
    }

    /// Set the states reported for `unit`, replacing any earlier script
    pub fn script_unit(&self, unit: &str, states: impl IntoIterator<Item = UnitState>) {
        self.units
            .lock()
            .insert(unit.to_string(), states.into_iter().collect());
    }

    /// Set the results returned for `command`, replacing any earlier script
    pub fn script_command(
        &self,
        command: &str,
        results: impl IntoIterator<Item = CommandOutput>,
    ) {
        self.commands
            .lock()
            .insert(command.to_string(), results.into_iter().collect());
    }

    /// Number of times `command` was executed
    pub fn executions(&self, command: &str) -> usize {
        let entry = format!("{}: exec {}", self.name, command);
        self.journal.entries().iter().filter(|e| **e == entry).count()
    }
}

#[async_trait]
impl Machine for ScriptedMachine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn unit_state(&self, unit: &str) -> Result<UnitState> {
        self.journal.record(format!("{}: unit {}", self.name, unit));
        let state = self
            .units
            .lock()
            .get_mut(unit)
            .and_then(next_scripted)
            .unwrap_or(UnitState::Inactive);
        Ok(state)
    }

    async fn execute(&self, command: &str) -> Result<CommandOutput> {
        self.journal.record(format!("{}: exec {}", self.name, command));
        let output = self
            .commands
            .lock()
            .get_mut(command)
            .and_then(next_scripted)
            .unwrap_or_else(|| CommandOutput::failure(127, "command not scripted"));
        Ok(output)
    }
}

/// Hands out scripted machines and records start/stop calls
#[derive(Default)]
pub struct ScriptedProvisioner {
    journal: Journal,
    machines: Mutex<HashMap<String, Arc<ScriptedMachine>>>,
    broken: Mutex<HashSet<String>>,
}

impl ScriptedProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// The machine that will back `name`, created on first use
    pub fn machine(&self, name: &str) -> Arc<ScriptedMachine> {
        self.machines
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ScriptedMachine::new(name, self.journal.clone())))
            .clone()
    }

    /// Make `start` fail for `name`
    pub fn fail_start(&self, name: &str) {
        self.broken.lock().insert(name.to_string());
    }
}

#[async_trait]
impl Provisioner for ScriptedProvisioner {
    async fn start(&self, node: &NodeSpec) -> Result<Arc<dyn Machine>> {
        self.journal.record(format!("start {}", node.name));
        if self.broken.lock().contains(&node.name) {
            return Err(HarnessError::Provision {
                node: node.name.clone(),
                reason: "scripted boot failure".to_string(),
            });
        }
        Ok(self.machine(&node.name))
    }

    async fn stop(&self, node: &NodeSpec) -> Result<()> {
        self.journal.record(format!("stop {}", node.name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_scripted_entry_repeats() {
        let machine = ScriptedMachine::new("router", Journal::default());
        machine.script_unit("sshd.service", [UnitState::Activating, UnitState::Active]);

        let unit = "sshd.service";
        assert_eq!(machine.unit_state(unit).await.unwrap(), UnitState::Activating);
        assert_eq!(machine.unit_state(unit).await.unwrap(), UnitState::Active);
        assert_eq!(machine.unit_state(unit).await.unwrap(), UnitState::Active);
        assert_eq!(machine.unit_state("other.service").await.unwrap(), UnitState::Inactive);
    }

    #[tokio::test]
    async fn test_rescripting_replaces_queue() {
        let machine = ScriptedMachine::new("host1", Journal::default());
        machine.script_command("ping -c 5 router", [CommandOutput::success("ok")]);
        machine.script_command("ping -c 5 router", [CommandOutput::failure(1, "loss")]);

        let output = machine.execute("ping -c 5 router").await.unwrap();
        assert_eq!(output.exit_code, Some(1));

        machine.script_unit("sshd.service", [UnitState::Active]);
        machine.script_unit("sshd.service", [UnitState::Failed]);
        assert_eq!(machine.unit_state("sshd.service").await.unwrap(), UnitState::Failed);
    }

    #[tokio::test]
    async fn test_unscripted_command_fails() {
        let machine = ScriptedMachine::new("host1", Journal::default());
        let output = machine.execute("ping -c 1 nowhere").await.unwrap();
        assert_eq!(output.exit_code, Some(127));
        assert_eq!(machine.executions("ping -c 1 nowhere"), 1);
    }
}
