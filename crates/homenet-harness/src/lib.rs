//! Homenet Harness - declarative readiness and reachability checks
//!
//! A plan declares named nodes and an ordered list of steps. The runner
//! brings every node up through a [`Provisioner`], then evaluates each step
//! in turn against the node's [`Machine`] handle:
//!
//! - **start_all** - provision every declared node
//! - **wait_for_unit** - poll a unit until it reports `active`
//! - **wait_until_succeeds** - retry a shell command until it exits zero
//!
//! The first step that fails or exceeds its deadline aborts the run.
//!
//! # Example
//!
//! ```rust,no_run
//! use homenet_harness::{CommandProvisioner, TestPlan, TestRunner};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = TestRunner::new(TestPlan::default(), CommandProvisioner::new());
//!     let report = runner.run().await?;
//!     println!("{} steps passed", report.steps.len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod node;
pub mod plan;
pub mod runner;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports
pub use backend::{CommandMachine, CommandProvisioner};
pub use config::TimingConfig;
pub use error::{HarnessError, Result, StepFailure};
pub use node::{CommandOutput, Machine, NodeSpec, Provisioner, UnitState};
pub use plan::{ping_command, Condition, ConditionKind, Step, TestPlan, HOME_DOMAIN};
pub use runner::{RunReport, Session, StepReport, TestRunner};
