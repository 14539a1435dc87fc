//! Homenet nettest - run a reachability plan against live nodes
//!
//! Without arguments this runs the built-in router/host1 scenario: both nodes
//! wait for systemd-networkd, then ping each other over `home.arpa.`.
//! Exits non-zero with the first failing step.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use homenet_harness::{CommandProvisioner, TestPlan, TestRunner};

#[derive(Parser)]
#[command(name = "homenet-nettest")]
#[command(about = "Wait for node readiness and verify reachability between nodes")]
struct Args {
    /// TOML plan to run instead of the built-in router/host1 scenario
    #[arg(long, short)]
    plan: Option<PathBuf>,

    /// Delay between attempts of the same condition (e.g. "500ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    poll_interval: Option<Duration>,

    /// Deadline for every condition (e.g. "5m")
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Write a JSON report of the passed steps to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut plan = match &args.plan {
        Some(path) => {
            info!("Loading plan from {}", path.display());
            TestPlan::load(path)?
        }
        None => TestPlan::default(),
    };

    if let Some(interval) = args.poll_interval {
        plan.timing.poll_interval = interval;
    }
    if let Some(deadline) = args.timeout {
        plan.timing = plan.timing.with_timeout(deadline);
    }
    plan.validate()?;

    info!(
        "Running {} step(s) against {} node(s)",
        plan.steps.len(),
        plan.nodes.len()
    );

    let runner = TestRunner::new(plan, CommandProvisioner::new());
    // anyhow prints the failing step on exit
    let report = runner.run().await?;

    info!(
        "All {} step(s) passed in {}",
        report.steps.len(),
        humantime::format_duration(Duration::from_secs(report.elapsed.as_secs()))
    );

    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
