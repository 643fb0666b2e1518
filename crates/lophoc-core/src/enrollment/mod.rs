//! Enrollment domain model.
//!
//! An enrollment is a student's time-bounded grant of access to a class.
//! Trial and paid ("real") enrollments share one lifecycle; the kind tags
//! which expiry semantics apply. The reconciler in this module's submodules
//! only ever reads `Approved` enrollments and moves them to `Removed`.

pub mod band;
pub mod reconciler;
pub mod scheduler;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trial access window vs. paid enrollment term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentKind {
    Trial,
    Real,
}

impl EnrollmentKind {
    /// User-facing label, used in notification text and removal reasons.
    pub fn type_label(&self) -> &'static str {
        match self {
            EnrollmentKind::Trial => "học thử",
            EnrollmentKind::Real => "học thật",
        }
    }
}

/// Lifecycle status. Only `Approved` enrollments are expiry candidates;
/// `Removed` is terminal for the reconciler (one-way transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Approved,
    Rejected,
    Removed,
}

/// A student's access grant to a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub class_id: String,
    pub kind: EnrollmentKind,
    pub status: EnrollmentStatus,
    /// `None` means the enrollment never expires and is permanently
    /// exempt from expiry processing.
    pub expires_at: Option<DateTime<Utc>>,
    /// Set exactly once, on the transition to `Removed`.
    pub removal_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    /// Create a new pending enrollment with no expiry set.
    ///
    /// The approval flow assigns `expires_at` when it moves the record
    /// to `Approved`.
    pub fn new(
        student_id: impl Into<String>,
        class_id: impl Into<String>,
        kind: EnrollmentKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.into(),
            class_id: class_id.into(),
            kind,
            status: EnrollmentStatus::Pending,
            expires_at: None,
            removal_reason: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_enrollment_starts_pending_without_expiry() {
        let e = Enrollment::new("student-1", "class-1", EnrollmentKind::Trial);
        assert_eq!(e.status, EnrollmentStatus::Pending);
        assert!(e.expires_at.is_none());
        assert!(e.removal_reason.is_none());
        assert!(!e.id.is_empty());
    }

    #[test]
    fn type_labels() {
        assert_eq!(EnrollmentKind::Trial.type_label(), "học thử");
        assert_eq!(EnrollmentKind::Real.type_label(), "học thật");
    }
}
