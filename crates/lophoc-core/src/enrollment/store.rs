//! Store and sink contracts consumed by the reconciler.
//!
//! The reconciler does not own persistence. It reads Approved enrollments
//! and writes removals through [`EnrollmentStore`], and emits deduplicated
//! notifications through [`NotificationSink`]. Both must tolerate
//! concurrent callers; the SQLite adapters in `storage` implement them.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::Enrollment;
use crate::notification::NotificationKind;

/// Enrollment store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport or query failure; the pass retries on the next tick.
    #[error("enrollment store unavailable: {0}")]
    Unavailable(String),

    /// The transition target vanished between fetch and write. Treated
    /// as already-resolved by the reconciler, not as a failure.
    #[error("enrollment not found: {0}")]
    NotFound(String),
}

/// Notification sink failures.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

/// Scoped read and conditional status update of enrollment records.
pub trait EnrollmentStore {
    /// All `Approved` enrollments for one student. An empty result is a
    /// normal outcome, not an error.
    fn list_approved(&self, student_id: &str) -> Result<Vec<Enrollment>, StoreError>;

    /// Move an enrollment to `Removed` with the given reason. Must be
    /// safe to call twice with the same arguments.
    fn mark_removed(&self, enrollment_id: &str, reason: &str) -> Result<(), StoreError>;
}

/// Append-only notification event store with a dedup-existence query.
pub trait NotificationSink {
    /// Has an event of this kind for this relation been created at or
    /// after `since`?
    fn exists_recent(
        &self,
        user_id: &str,
        kind: NotificationKind,
        related_id: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, SinkError>;

    fn insert(
        &self,
        user_id: &str,
        kind: NotificationKind,
        related_id: &str,
        title: &str,
        message: &str,
    ) -> Result<(), SinkError>;
}
