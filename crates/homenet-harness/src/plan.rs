//! Test plans: declared nodes plus an ordered list of steps
//!
//! A plan is usually loaded from TOML:
//!
//! ```toml
//! [[nodes]]
//! name = "router"
//! exec = ["ssh", "root@router"]
//!
//! [[steps]]
//! action = "start_all"
//!
//! [[steps]]
//! action = "wait_for_unit"
//! node = "router"
//! unit = "systemd-networkd.service"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::config::TimingConfig;
use crate::error::{HarnessError, Result};
use crate::node::NodeSpec;

/// Domain the home network publishes host names under
pub const HOME_DOMAIN: &str = "home.arpa.";

/// Echo requests sent by each reachability probe
pub const PING_COUNT: u32 = 5;

/// One entry of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Bring every declared node up
    StartAll,
    /// Wait until a unit on `node` is active
    WaitForUnit { node: String, unit: String },
    /// Retry `command` on `node` until it exits zero
    WaitUntilSucceeds { node: String, command: String },
}

impl Step {
    pub fn wait_for_unit(node: &str, unit: &str) -> Self {
        Step::WaitForUnit {
            node: node.to_string(),
            unit: unit.to_string(),
        }
    }

    pub fn wait_until_succeeds(node: &str, command: impl Into<String>) -> Self {
        Step::WaitUntilSucceeds {
            node: node.to_string(),
            command: command.into(),
        }
    }

    /// The condition this step evaluates, if any
    pub fn condition(&self) -> Option<Condition> {
        match self {
            Step::StartAll => None,
            Step::WaitForUnit { node, unit } => Some(Condition {
                node: node.clone(),
                kind: ConditionKind::UnitActive { unit: unit.clone() },
            }),
            Step::WaitUntilSucceeds { node, command } => Some(Condition {
                node: node.clone(),
                kind: ConditionKind::CommandSucceeds {
                    command: command.clone(),
                },
            }),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::StartAll => write!(f, "start_all()"),
            Step::WaitForUnit { node, unit } => {
                write!(f, "{}.wait_for_unit({:?})", node, unit)
            }
            Step::WaitUntilSucceeds { node, command } => {
                write!(f, "{}.wait_until_succeeds({:?})", node, command)
            }
        }
    }
}

/// A predicate bound to one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub node: String,
    pub kind: ConditionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionKind {
    UnitActive { unit: String },
    CommandSucceeds { command: String },
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConditionKind::UnitActive { unit } => {
                write!(f, "unit {} to become active on {}", unit, self.node)
            }
            ConditionKind::CommandSucceeds { command } => {
                write!(f, "`{}` to succeed on {}", command, self.node)
            }
        }
    }
}

/// Build the probe command used for reachability checks
pub fn ping_command(target: &str, domain: &str, count: u32) -> String {
    format!("ping -c {} {}.{}", count, target, domain)
}

/// Declared nodes, ordered steps and the timing policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
    pub nodes: Vec<NodeSpec>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl Default for TestPlan {
    /// The router/host1 scenario: networkd readiness, then ping both ways
    fn default() -> Self {
        Self::reachability(
            NodeSpec::ssh("router", "router"),
            NodeSpec::ssh("host1", "host1"),
            HOME_DOMAIN,
        )
    }
}

impl TestPlan {
    /// Readiness of both nodes followed by a ping in each direction
    pub fn reachability(router: NodeSpec, host: NodeSpec, domain: &str) -> Self {
        let steps = vec![
            Step::StartAll,
            Step::wait_for_unit(&router.name, "systemd-networkd.service"),
            Step::wait_for_unit(&host.name, "systemd-networkd-wait-online.service"),
            Step::wait_until_succeeds(&router.name, ping_command(&host.name, domain, PING_COUNT)),
            Step::wait_until_succeeds(&host.name, ping_command(&router.name, domain, PING_COUNT)),
        ];

        Self {
            nodes: vec![router, host],
            steps,
            timing: TimingConfig::default(),
        }
    }

    /// Parse and validate a TOML plan
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let plan: TestPlan = toml::from_str(input)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Load and validate a TOML plan from disk
    pub fn load(path: &Path) -> Result<Self> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    /// Look up a declared node
    pub fn node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Check structural invariants before anything is started
    ///
    /// Every node name is unique and non-empty, every step names a declared
    /// node, and no condition appears before `start_all`.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(HarnessError::Plan("no nodes declared".to_string()));
        }

        let mut names = HashSet::new();
        for node in &self.nodes {
            if node.name.is_empty() {
                return Err(HarnessError::Plan("node with empty name".to_string()));
            }
            if !names.insert(node.name.as_str()) {
                return Err(HarnessError::Plan(format!("duplicate node {}", node.name)));
            }
        }

        let mut started = false;
        for (index, step) in self.steps.iter().enumerate() {
            match step.condition() {
                None => started = true,
                Some(condition) => {
                    if !names.contains(condition.node.as_str()) {
                        return Err(HarnessError::UnknownNode(condition.node));
                    }
                    if !started {
                        return Err(HarnessError::Plan(format!(
                            "step {} `{}` runs before start_all",
                            index, step
                        )));
                    }
                }
            }
        }

        if self.timing.poll_interval.is_zero() {
            return Err(HarnessError::Plan("poll_interval must be non-zero".to_string()));
        }

        Ok(())
    }
}
