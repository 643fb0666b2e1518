//! Enrollment expiration reconciler.
//!
//! One pass scans a student's Approved enrollments, classifies each
//! against the expiry thresholds, revokes expired access, and emits
//! deduplicated warning/expiry notifications. Passes are idempotent:
//! removal is one-way, and warning kinds are suppressed inside their
//! dedup windows, so running a pass twice in a row changes nothing.
//!
//! Enrollments are processed independently -- a failure on one record is
//! captured in its outcome and never blocks the rest of the batch. Only a
//! failure to fetch the candidate list fails the whole pass.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::band::{self, Band};
use super::store::{EnrollmentStore, NotificationSink, SinkError, StoreError};
use super::{Enrollment, EnrollmentKind};
use crate::clock::Clock;
use crate::notification::{self, NotificationKind};

/// Pass-level failure: the candidate set could not be fetched. Everything
/// below that level is recorded per enrollment in the pass report.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("failed to list enrollments: {0}")]
    Store(#[from] StoreError),
}

/// What one pass did to one enrollment.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PassAction {
    /// Nothing to do for this band.
    None,
    /// A warning notification was inserted.
    Notified { kind: NotificationKind },
    /// A warning was due but suppressed by its dedup window.
    Suppressed { kind: NotificationKind },
    /// Access was revoked and the expiry notice inserted.
    Removed { kind: NotificationKind },
    /// A store/sink step failed; other enrollments were unaffected.
    Failed { message: String },
}

/// Per-enrollment outcome, for observability.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentOutcome {
    pub enrollment_id: String,
    pub class_id: String,
    pub band: Band,
    pub action: PassAction,
}

/// The result of one reconcile pass over one student.
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub student_id: String,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<EnrollmentOutcome>,
}

impl PassReport {
    pub fn removed_count(&self) -> usize {
        self.count(|a| matches!(a, PassAction::Removed { .. }))
    }

    pub fn notified_count(&self) -> usize {
        self.count(|a| matches!(a, PassAction::Notified { .. }))
    }

    pub fn suppressed_count(&self) -> usize {
        self.count(|a| matches!(a, PassAction::Suppressed { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|a| matches!(a, PassAction::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&PassAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.action)).count()
    }
}

#[derive(Error, Debug)]
enum StepError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Reconciles one student's enrollments against the expiry thresholds.
///
/// Dedup is check-then-insert and is not atomic across processes: two
/// concurrent passes for the same student from *different* processes can
/// both miss the existence check and double-fire a warning. Within one
/// process the scheduler runs passes for a subject sequentially, which is
/// the guard this design relies on.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn EnrollmentStore + Send + Sync>,
    sink: Arc<dyn NotificationSink + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn EnrollmentStore + Send + Sync>,
        sink: Arc<dyn NotificationSink + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, sink, clock }
    }

    /// One reconcile pass for `student_id`.
    ///
    /// # Errors
    /// Fails only when the candidate list cannot be fetched. Per-record
    /// failures are reported in the returned outcome list instead.
    pub fn run(&self, student_id: &str) -> Result<PassReport, ReconcileError> {
        let started_at = self.clock.now();
        let enrollments = self.store.list_approved(student_id)?;

        let outcomes: Vec<EnrollmentOutcome> = enrollments
            .iter()
            .map(|e| self.process(e, started_at))
            .collect();

        let report = PassReport {
            student_id: student_id.to_string(),
            started_at,
            outcomes,
        };

        if report.removed_count() + report.notified_count() + report.failed_count() > 0 {
            tracing::info!(
                student_id,
                total = report.outcomes.len(),
                removed = report.removed_count(),
                notified = report.notified_count(),
                suppressed = report.suppressed_count(),
                failed = report.failed_count(),
                "reconcile pass complete"
            );
        } else {
            tracing::debug!(
                student_id,
                total = report.outcomes.len(),
                "reconcile pass complete, nothing to do"
            );
        }

        Ok(report)
    }

    fn process(&self, enrollment: &Enrollment, now: DateTime<Utc>) -> EnrollmentOutcome {
        let band = band::classify(now, enrollment.expires_at);
        let action = match self.apply(enrollment, band, now) {
            Ok(action) => action,
            Err(err) => {
                tracing::warn!(
                    enrollment_id = %enrollment.id,
                    class_id = %enrollment.class_id,
                    error = %err,
                    "skipping enrollment after step failure"
                );
                PassAction::Failed {
                    message: err.to_string(),
                }
            }
        };
        EnrollmentOutcome {
            enrollment_id: enrollment.id.clone(),
            class_id: enrollment.class_id.clone(),
            band,
            action,
        }
    }

    fn apply(
        &self,
        enrollment: &Enrollment,
        band: Band,
        now: DateTime<Utc>,
    ) -> Result<PassAction, StepError> {
        let expires_at = match enrollment.expires_at {
            Some(t) => t,
            None => return Ok(PassAction::None),
        };

        match band {
            Band::NotApplicable | Band::Active => Ok(PassAction::None),
            Band::ExpiringIn3Days => {
                let kind = NotificationKind::expiring_in_3_days(enrollment.kind);
                let days = band::days_remaining(now, expires_at);
                let content = notification::three_day_warning(enrollment.kind, days);
                self.notify_deduped(enrollment, kind, &content.title, &content.message, now)
            }
            Band::ExpiringIn24h => {
                let kind = NotificationKind::expiring_in_24h(enrollment.kind);
                let hours = band::hours_remaining(now, expires_at);
                let content = notification::last_day_warning(enrollment.kind, hours);
                self.notify_deduped(enrollment, kind, &content.title, &content.message, now)
            }
            Band::Expired => self.expire(enrollment),
        }
    }

    /// Revoke access, then insert the expiry notice. The transition is
    /// the dedup: once Removed, this enrollment is no longer a candidate
    /// on the next pass.
    fn expire(&self, enrollment: &Enrollment) -> Result<PassAction, StepError> {
        let reason = removal_reason(enrollment.kind);
        match self.store.mark_removed(&enrollment.id, &reason) {
            Ok(()) => {}
            // Gone between fetch and write: another writer already
            // resolved it, so neither the transition nor the notice is
            // ours to emit.
            Err(StoreError::NotFound(_)) => return Ok(PassAction::None),
            Err(err) => return Err(err.into()),
        }

        let kind = NotificationKind::expired(enrollment.kind);
        let content = notification::expired_notice(enrollment.kind);
        self.sink.insert(
            &enrollment.student_id,
            kind,
            &enrollment.class_id,
            &content.title,
            &content.message,
        )?;
        Ok(PassAction::Removed { kind })
    }

    fn notify_deduped(
        &self,
        enrollment: &Enrollment,
        kind: NotificationKind,
        title: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<PassAction, StepError> {
        if let Some(window) = kind.dedup_window() {
            let since = now - window;
            if self
                .sink
                .exists_recent(&enrollment.student_id, kind, &enrollment.class_id, since)?
            {
                tracing::debug!(
                    enrollment_id = %enrollment.id,
                    ?kind,
                    "warning suppressed by dedup window"
                );
                return Ok(PassAction::Suppressed { kind });
            }
        }

        self.sink.insert(
            &enrollment.student_id,
            kind,
            &enrollment.class_id,
            title,
            message,
        )?;
        Ok(PassAction::Notified { kind })
    }
}

/// Removal reason recorded on expiry, e.g. "Hết hạn học thử".
pub fn removal_reason(kind: EnrollmentKind) -> String {
    format!("Hết hạn {}", kind.type_label())
}
