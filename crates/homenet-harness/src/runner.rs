//! Sequential, fail-fast execution of a test plan

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::TimingConfig;
use crate::error::{HarnessError, Result, StepFailure};
use crate::node::{Machine, NodeSpec, Provisioner, UnitState};
use crate::plan::{Condition, ConditionKind, Step, TestPlan};

/// Started nodes for the duration of one run
///
/// A session owns nothing but the handles returned by the provisioner, so
/// dropping it and opening a new one starts from a clean slate.
pub struct Session<'a> {
    nodes: &'a [NodeSpec],
    provisioner: &'a dyn Provisioner,
    timing: &'a TimingConfig,
    machines: BTreeMap<String, Arc<dyn Machine>>,
}

impl<'a> Session<'a> {
    pub fn new(
        nodes: &'a [NodeSpec],
        provisioner: &'a dyn Provisioner,
        timing: &'a TimingConfig,
    ) -> Self {
        Self {
            nodes,
            provisioner,
            timing,
            machines: BTreeMap::new(),
        }
    }

    /// Bring up every declared node in declaration order
    ///
    /// Stops at the first node that cannot be started.
    pub async fn start_all(&mut self) -> Result<()> {
        for node in self.nodes {
            if self.machines.contains_key(&node.name) {
                continue;
            }

            info!("Starting node {}", node.name);
            let machine = self.provisioner.start(node).await.map_err(|e| match e {
                HarnessError::Provision { .. } => e,
                other => HarnessError::Provision {
                    node: node.name.clone(),
                    reason: other.to_string(),
                },
            })?;
            self.machines.insert(node.name.clone(), machine);
        }
        Ok(())
    }

    /// Names of the nodes started so far
    pub fn started(&self) -> impl Iterator<Item = &str> {
        self.machines.keys().map(String::as_str)
    }

    fn machine(&self, node: &str) -> Result<&Arc<dyn Machine>> {
        match self.machines.get(node) {
            Some(machine) => Ok(machine),
            None if self.nodes.iter().any(|n| n.name == node) => {
                Err(HarnessError::NodeNotStarted(node.to_string()))
            }
            None => Err(HarnessError::UnknownNode(node.to_string())),
        }
    }

    /// Block until `unit` on `node` reports active
    pub async fn wait_for_unit(&self, node: &str, unit: &str) -> Result<()> {
        let machine = self.machine(node)?;
        let condition = Condition {
            node: node.to_string(),
            kind: ConditionKind::UnitActive {
                unit: unit.to_string(),
            },
        };
        let deadline = self.timing.unit_timeout;
        let interval = self.timing.poll_interval;

        timeout(deadline, async {
            loop {
                match machine.unit_state(unit).await? {
                    UnitState::Active => return Ok::<(), HarnessError>(()),
                    UnitState::Failed => {
                        return Err(HarnessError::UnitFailed {
                            node: node.to_string(),
                            unit: unit.to_string(),
                        })
                    }
                    state => debug!("{}: unit {} is {}", node, unit, state),
                }
                sleep(interval).await;
            }
        })
        .await
        .map_err(|_| HarnessError::Timeout {
            node: node.to_string(),
            condition: condition.to_string(),
            waited: deadline,
        })?
    }

    /// Retry `command` on `node` until it exits zero
    ///
    /// Returns the stdout of the successful attempt.
    pub async fn wait_until_succeeds(&self, node: &str, command: &str) -> Result<String> {
        let machine = self.machine(node)?;
        let condition = Condition {
            node: node.to_string(),
            kind: ConditionKind::CommandSucceeds {
                command: command.to_string(),
            },
        };
        let deadline = self.timing.command_timeout;
        let interval = self.timing.poll_interval;

        timeout(deadline, async {
            let mut attempt = 0u32;
            loop {
                attempt += 1;
                let output = machine.execute(command).await?;
                if output.succeeded() {
                    debug!("{}: `{}` succeeded after {} attempt(s)", node, command, attempt);
                    return Ok::<String, HarnessError>(output.stdout);
                }
                debug!(
                    "{}: `{}` exited with {:?}: {}",
                    node,
                    command,
                    output.exit_code,
                    output.stderr.trim()
                );
                sleep(interval).await;
            }
        })
        .await
        .map_err(|_| HarnessError::Timeout {
            node: node.to_string(),
            condition: condition.to_string(),
            waited: deadline,
        })?
    }

    /// Evaluate a single step, returning captured output if any
    pub async fn run_step(&mut self, step: &Step) -> Result<Option<String>> {
        match step {
            Step::StartAll => self.start_all().await.map(|_| None),
            Step::WaitForUnit { node, unit } => self.wait_for_unit(node, unit).await.map(|_| None),
            Step::WaitUntilSucceeds { node, command } => {
                self.wait_until_succeeds(node, command).await.map(Some)
            }
        }
    }

    /// Stop every started node, in reverse start order
    pub async fn shutdown(mut self) {
        for node in self.nodes.iter().rev() {
            if self.machines.remove(&node.name).is_none() {
                continue;
            }
            if let Err(e) = self.provisioner.stop(node).await {
                warn!("Failed to stop node {}: {}", node.name, e);
            }
        }
    }
}

/// Outcome of one successful step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub step: String,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub output: Option<String>,
}

/// Summary of a run in which every step passed
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub steps: Vec<StepReport>,
}

/// Runs a plan against a provisioner
pub struct TestRunner<P> {
    plan: TestPlan,
    provisioner: P,
}

impl<P: Provisioner> TestRunner<P> {
    pub fn new(plan: TestPlan, provisioner: P) -> Self {
        Self { plan, provisioner }
    }

    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    /// Execute every step in order, aborting on the first failure
    ///
    /// Started nodes are stopped before returning, whatever the outcome.
    pub async fn run(&self) -> std::result::Result<RunReport, StepFailure> {
        let started_at = Utc::now();
        let run_start = Instant::now();
        let mut session = Session::new(&self.plan.nodes, &self.provisioner, &self.plan.timing);
        let mut reports = Vec::with_capacity(self.plan.steps.len());

        for (index, step) in self.plan.steps.iter().enumerate() {
            info!("[{}/{}] {}", index + 1, self.plan.steps.len(), step);
            let step_start = Instant::now();

            match session.run_step(step).await {
                Ok(output) => {
                    if let Some(out) = output.as_deref().filter(|o| !o.trim().is_empty()) {
                        info!("{}", out.trim_end());
                    }
                    reports.push(StepReport {
                        index,
                        step: step.to_string(),
                        elapsed: step_start.elapsed(),
                        output,
                    });
                }
                Err(source) => {
                    session.shutdown().await;
                    return Err(StepFailure {
                        index,
                        step: step.clone(),
                        source,
                    });
                }
            }
        }

        session.shutdown().await;

        Ok(RunReport {
            started_at,
            elapsed: run_start.elapsed(),
            steps: reports,
        })
    }
}
