//! Node declarations and the collaborator contracts
//!
//! The harness never boots machines or inspects services itself. It talks to
//! two collaborators:
//!
//! - [`Provisioner`] brings declared nodes up and tears them down
//! - [`Machine`] answers unit-state queries and runs shell commands on one node

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// A named execution target as declared in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Node identifier, e.g. `router`
    pub name: String,
    /// Argv prefix used to run a command on the node.
    ///
    /// Empty means the local host, where commands run as `sh -c <command>`.
    /// Otherwise the shell command is appended as the final argument, so the
    /// prefix must hand it to a shell, as `["ssh", "root@router"]` does.
    #[serde(default)]
    pub exec: Vec<String>,
    /// Argv run on the controller to boot the node
    #[serde(default)]
    pub start: Option<Vec<String>>,
    /// Argv run on the controller to tear the node down
    #[serde(default)]
    pub stop: Option<Vec<String>>,
}

impl NodeSpec {
    /// A node whose commands run on the local host
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exec: Vec::new(),
            start: None,
            stop: None,
        }
    }

    /// A node reached over non-interactive ssh as root
    pub fn ssh(name: impl Into<String>, host: &str) -> Self {
        Self {
            name: name.into(),
            exec: vec![
                "ssh".to_string(),
                "-o".to_string(),
                "BatchMode=yes".to_string(),
                format!("root@{}", host),
            ],
            start: None,
            stop: None,
        }
    }

    /// Set the boot command
    pub fn with_start(mut self, argv: &[&str]) -> Self {
        self.start = Some(argv.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Set the teardown command
    pub fn with_stop(mut self, argv: &[&str]) -> Self {
        self.stop = Some(argv.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// State of a readiness unit, as reported by `systemctl is-active`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    Active,
    Reloading,
    Activating,
    Deactivating,
    Inactive,
    Failed,
    /// Anything else, including empty output from an unreachable node
    Unknown(String),
}

impl UnitState {
    /// Parse the first line of `systemctl is-active` output
    pub fn parse(output: &str) -> Self {
        match output.lines().next().map(str::trim).unwrap_or("") {
            "active" => UnitState::Active,
            "reloading" => UnitState::Reloading,
            "activating" => UnitState::Activating,
            "deactivating" => UnitState::Deactivating,
            "inactive" => UnitState::Inactive,
            "failed" => UnitState::Failed,
            other => UnitState::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Active => write!(f, "active"),
            UnitState::Reloading => write!(f, "reloading"),
            UnitState::Activating => write!(f, "activating"),
            UnitState::Deactivating => write!(f, "deactivating"),
            UnitState::Inactive => write!(f, "inactive"),
            UnitState::Failed => write!(f, "failed"),
            UnitState::Unknown(s) if s.is_empty() => write!(f, "unknown"),
            UnitState::Unknown(s) => write!(f, "unknown ({})", s),
        }
    }
}

/// Captured result of one command invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit status, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A zero-status result with the given stdout
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given status and stderr
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Access to a started node
#[async_trait]
pub trait Machine: Send + Sync {
    /// Node name (for logging)
    fn name(&self) -> &str;

    /// Query the current state of a readiness unit
    async fn unit_state(&self, unit: &str) -> Result<UnitState>;

    /// Run a shell command once and capture its output
    ///
    /// A non-zero exit is a normal `Ok` result; `Err` means the command
    /// could not be run at all.
    async fn execute(&self, command: &str) -> Result<CommandOutput>;
}

/// Brings declared nodes up and down
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Start a node and return a handle to it
    async fn start(&self, node: &NodeSpec) -> Result<Arc<dyn Machine>>;

    /// Tear a started node down
    async fn stop(&self, node: &NodeSpec) -> Result<()>;
}
