//! Periodic reconcile scheduling.
//!
//! An explicit lifecycle object that owns one timer task per watched
//! student: one pass immediately on start, then one per interval, strictly
//! sequential so passes for the same subject never overlap. `stop()`
//! waits for any in-flight pass to finish before returning, so no write
//! can race a stopped subject. Schedulers for different students are
//! independent.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::reconciler::Reconciler;

/// Default pass interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to a running reconcile loop for one student.
pub struct ReconcileScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ReconcileScheduler {
    /// Start reconciling `student_id` every `interval`, beginning with an
    /// immediate pass. Must be called from within a tokio runtime.
    pub fn start(
        reconciler: Reconciler,
        student_id: impl Into<String>,
        interval: Duration,
    ) -> Self {
        let student_id = student_id.into();
        let (shutdown, mut rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // run() completes before the next select poll, so
                        // passes for this subject are sequential and a
                        // shutdown can only land between passes.
                        if let Err(err) = reconciler.run(&student_id) {
                            tracing::warn!(
                                %student_id,
                                error = %err,
                                "reconcile pass failed, retrying next tick"
                            );
                        }
                    }
                    _ = rx.changed() => break,
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Stop the loop. Waits for an in-flight pass to complete; safe to
    /// call at any time.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }

    /// Whether the loop has exited (e.g. after a runtime shutdown).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
