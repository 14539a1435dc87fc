//! Command-line backed collaborators
//!
//! Local nodes (empty exec prefix) run each shell command as `sh -c <command>`.
//! Other nodes are reached by appending the command to an argv such as
//! `ssh root@router` or `machinectl shell router /bin/sh -c`. Unit state is
//! read with `systemctl is-active`.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{HarnessError, Result};
use crate::node::{CommandOutput, Machine, NodeSpec, Provisioner, UnitState};

/// Quote a string for a POSIX shell
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\\''"))
}

async fn run_argv(argv: &[String], trailing: Option<&str>) -> std::io::Result<CommandOutput> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv"))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(arg) = trailing {
        cmd.arg(arg);
    }

    let output = cmd.output().await?;
    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// A node reached through an argv prefix
#[derive(Debug, Clone)]
pub struct CommandMachine {
    name: String,
    exec: Vec<String>,
}

impl CommandMachine {
    pub fn new(spec: &NodeSpec) -> Self {
        let exec = if spec.exec.is_empty() {
            vec!["sh".to_string(), "-c".to_string()]
        } else {
            spec.exec.clone()
        };
        Self {
            name: spec.name.clone(),
            exec,
        }
    }
}

#[async_trait]
impl Machine for CommandMachine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn unit_state(&self, unit: &str) -> Result<UnitState> {
        let output = self
            .execute(&format!("systemctl is-active {}", shell_quote(unit)))
            .await?;
        // is-active exits non-zero for anything but "active"; stdout still names the state
        Ok(UnitState::parse(&output.stdout))
    }

    async fn execute(&self, command: &str) -> Result<CommandOutput> {
        debug!("{}: running `{}`", self.name, command);
        run_argv(&self.exec, Some(command))
            .await
            .map_err(|e| HarnessError::Backend {
                node: self.name.clone(),
                reason: e.to_string(),
            })
    }
}

/// Provisions nodes by running their `start`/`stop` argv on the controller
///
/// Nodes without a start command are expected to be up already; they are
/// probed once with `true` so an unreachable node fails provisioning instead
/// of the first condition.
#[derive(Debug, Clone, Default)]
pub struct CommandProvisioner;

impl CommandProvisioner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provisioner for CommandProvisioner {
    async fn start(&self, node: &NodeSpec) -> Result<Arc<dyn Machine>> {
        let machine = CommandMachine::new(node);

        match &node.start {
            Some(argv) => {
                info!("{}: running start command {:?}", node.name, argv);
                let output = run_argv(argv, None).await.map_err(|e| HarnessError::Provision {
                    node: node.name.clone(),
                    reason: e.to_string(),
                })?;
                if !output.succeeded() {
                    return Err(HarnessError::Provision {
                        node: node.name.clone(),
                        reason: format!(
                            "start command exited with {:?}: {}",
                            output.exit_code,
                            output.stderr.trim()
                        ),
                    });
                }
            }
            None => {
                let probe = machine.execute("true").await?;
                if !probe.succeeded() {
                    return Err(HarnessError::Provision {
                        node: node.name.clone(),
                        reason: format!(
                            "node did not accept commands (exit {:?}): {}",
                            probe.exit_code,
                            probe.stderr.trim()
                        ),
                    });
                }
            }
        }

        Ok(Arc::new(machine))
    }

    async fn stop(&self, node: &NodeSpec) -> Result<()> {
        let Some(argv) = &node.stop else {
            return Ok(());
        };

        info!("{}: running stop command {:?}", node.name, argv);
        let output = run_argv(argv, None).await?;
        if !output.succeeded() {
            return Err(HarnessError::Backend {
                node: node.name.clone(),
                reason: format!("stop command exited with {:?}", output.exit_code),
            });
        }
        Ok(())
    }
}
