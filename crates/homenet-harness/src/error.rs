//! Error types for the reachability harness

use std::time::Duration;
use thiserror::Error;

use crate::plan::Step;

/// Errors raised while provisioning nodes or evaluating conditions
#[derive(Error, Debug)]
pub enum HarnessError {
    /// A node could not be brought up
    #[error("Failed to provision node {node}: {reason}")]
    Provision { node: String, reason: String },

    /// A readiness or reachability condition was not met in time
    #[error("Timed out after {} waiting for {condition}", humantime::format_duration(*.waited))]
    Timeout {
        node: String,
        condition: String,
        waited: Duration,
    },

    /// A unit entered the failed state while being waited on
    #[error("Unit {unit} failed on node {node}")]
    UnitFailed { node: String, unit: String },

    /// A condition referenced a node that has not been started
    #[error("Node not started: {0}")]
    NodeNotStarted(String),

    /// A step referenced a node that is not declared in the plan
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// The node collaborator failed to run a command
    #[error("Backend error on node {node}: {reason}")]
    Backend { node: String, reason: String },

    /// The test plan is malformed
    #[error("Invalid plan: {0}")]
    Plan(String),

    /// I/O error outside of any node
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for HarnessError {
    fn from(err: toml::de::Error) -> Self {
        HarnessError::Plan(err.to_string())
    }
}

/// A step that aborted the run
///
/// Carries the position and the rendered step so the report names exactly
/// which condition was not met.
#[derive(Error, Debug)]
#[error("step {index} `{step}` failed: {source}")]
pub struct StepFailure {
    pub index: usize,
    pub step: Step,
    #[source]
    pub source: HarnessError,
}

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;
