//! Expiry reconciliation commands for CLI.

use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use lophoc_core::{Config, Database, PassAction, ReconcileScheduler, Reconciler, SystemClock};

#[derive(Subcommand)]
pub enum ReconcileAction {
    /// Run one reconcile pass for a student
    Run {
        /// Student ID
        student: String,
        /// Output the pass report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reconcile a student on a fixed interval until interrupted
    Watch {
        /// Student ID
        student: String,
        /// Seconds between passes (default: from config)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

fn build_reconciler() -> Result<Reconciler, Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);
    Ok(Reconciler::new(db.clone(), db, Arc::new(SystemClock)))
}

pub fn run(action: ReconcileAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ReconcileAction::Run { student, json } => {
            let reconciler = build_reconciler()?;
            let report = reconciler.run(&student)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Pass for {}: {} enrollment(s), {} removed, {} notified, {} suppressed, {} failed",
                    report.student_id,
                    report.outcomes.len(),
                    report.removed_count(),
                    report.notified_count(),
                    report.suppressed_count(),
                    report.failed_count()
                );
                for outcome in &report.outcomes {
                    let action = match &outcome.action {
                        PassAction::None => "no action".to_string(),
                        PassAction::Notified { kind } => format!("notified {kind:?}"),
                        PassAction::Suppressed { kind } => format!("suppressed {kind:?}"),
                        PassAction::Removed { kind } => format!("removed, notified {kind:?}"),
                        PassAction::Failed { message } => format!("failed: {message}"),
                    };
                    println!(
                        "  {}  class={}  {:?}  {}",
                        outcome.enrollment_id, outcome.class_id, outcome.band, action
                    );
                }
            }
        }
        ReconcileAction::Watch {
            student,
            interval_secs,
        } => {
            let config = Config::load_or_default();
            let interval =
                Duration::from_secs(interval_secs.unwrap_or(config.reconcile.interval_secs));

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                let reconciler = build_reconciler()?;
                let scheduler = ReconcileScheduler::start(reconciler, student.clone(), interval);
                println!(
                    "Watching enrollments for {student} every {}s. Press Ctrl-C to stop.",
                    interval.as_secs()
                );

                tokio::signal::ctrl_c().await?;
                scheduler.stop().await;
                println!("Stopped.");
                Ok::<(), Box<dyn std::error::Error>>(())
            })?;
        }
    }

    Ok(())
}
