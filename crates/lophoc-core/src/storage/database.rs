//! SQLite-based storage for enrollments and notification events.
//!
//! One database backs both reconciler contracts: the enrollments table
//! implements [`EnrollmentStore`] and the append-only notifications table
//! implements [`NotificationSink`]. The connection sits behind a mutex so
//! passes for different students can share one handle.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations};
use crate::enrollment::store::{EnrollmentStore, NotificationSink, SinkError, StoreError};
use crate::enrollment::{Enrollment, EnrollmentKind, EnrollmentStatus};
use crate::error::{CoreError, DatabaseError, Result};
use crate::notification::{NotificationEvent, NotificationKind};

// === Helper Functions ===

/// Format enrollment kind for database storage
fn format_enrollment_kind(kind: EnrollmentKind) -> &'static str {
    match kind {
        EnrollmentKind::Trial => "trial",
        EnrollmentKind::Real => "real",
    }
}

/// Parse enrollment kind from database string
fn parse_enrollment_kind(kind_str: &str) -> Option<EnrollmentKind> {
    match kind_str {
        "trial" => Some(EnrollmentKind::Trial),
        "real" => Some(EnrollmentKind::Real),
        _ => None,
    }
}

/// Format enrollment status for database storage
fn format_enrollment_status(status: EnrollmentStatus) -> &'static str {
    match status {
        EnrollmentStatus::Pending => "pending",
        EnrollmentStatus::Approved => "approved",
        EnrollmentStatus::Rejected => "rejected",
        EnrollmentStatus::Removed => "removed",
    }
}

/// Parse enrollment status from database string
fn parse_enrollment_status(status_str: &str) -> Option<EnrollmentStatus> {
    match status_str {
        "pending" => Some(EnrollmentStatus::Pending),
        "approved" => Some(EnrollmentStatus::Approved),
        "rejected" => Some(EnrollmentStatus::Rejected),
        "removed" => Some(EnrollmentStatus::Removed),
        _ => None,
    }
}

/// Format notification kind for database storage
fn format_notification_kind(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::TrialExpiringIn3Days => "trial_expiring_3d",
        NotificationKind::TrialExpiringIn24h => "trial_expiring_24h",
        NotificationKind::TrialExpired => "trial_expired",
        NotificationKind::RealExpiringIn3Days => "real_expiring_3d",
        NotificationKind::RealExpiringIn24h => "real_expiring_24h",
        NotificationKind::RealExpired => "real_expired",
    }
}

/// Parse notification kind from database string
fn parse_notification_kind(kind_str: &str) -> Option<NotificationKind> {
    match kind_str {
        "trial_expiring_3d" => Some(NotificationKind::TrialExpiringIn3Days),
        "trial_expiring_24h" => Some(NotificationKind::TrialExpiringIn24h),
        "trial_expired" => Some(NotificationKind::TrialExpired),
        "real_expiring_3d" => Some(NotificationKind::RealExpiringIn3Days),
        "real_expiring_24h" => Some(NotificationKind::RealExpiringIn24h),
        "real_expired" => Some(NotificationKind::RealExpired),
        _ => None,
    }
}

fn conversion_failure(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_timestamp(idx: usize, value: &str) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, format!("bad timestamp '{value}': {e}")))
}

fn row_to_enrollment(row: &rusqlite::Row<'_>) -> std::result::Result<Enrollment, rusqlite::Error> {
    let kind_str: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let expires_at: Option<String> = row.get(5)?;
    let created_at: String = row.get(7)?;

    Ok(Enrollment {
        id: row.get(0)?,
        student_id: row.get(1)?,
        class_id: row.get(2)?,
        kind: parse_enrollment_kind(&kind_str)
            .ok_or_else(|| conversion_failure(3, format!("unknown enrollment kind '{kind_str}'")))?,
        status: parse_enrollment_status(&status_str).ok_or_else(|| {
            conversion_failure(4, format!("unknown enrollment status '{status_str}'"))
        })?,
        expires_at: expires_at.as_deref().map(|s| parse_timestamp(5, s)).transpose()?,
        removal_reason: row.get(6)?,
        created_at: parse_timestamp(7, &created_at)?,
    })
}

const ENROLLMENT_COLUMNS: &str =
    "id, student_id, class_id, kind, status, expires_at, removal_reason, created_at";

/// SQLite database for enrollments and notifications.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/lophoc/lophoc.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("lophoc.db");
        let conn = Connection::open(&path).map_err(|source| {
            CoreError::Database(DatabaseError::OpenFailed { path, source })
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests and ephemeral runs).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Database(DatabaseError::from(e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| CoreError::Database(DatabaseError::MigrationFailed(e.to_string())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // === Enrollments ===

    /// Insert a new enrollment record.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including a duplicate id).
    pub fn insert_enrollment(&self, enrollment: &Enrollment) -> std::result::Result<(), DatabaseError> {
        self.conn().execute(
            "INSERT INTO enrollments (id, student_id, class_id, kind, status, expires_at, removal_reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                enrollment.id,
                enrollment.student_id,
                enrollment.class_id,
                format_enrollment_kind(enrollment.kind),
                format_enrollment_status(enrollment.status),
                enrollment.expires_at.map(|t| t.to_rfc3339()),
                enrollment.removal_reason,
                enrollment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch one enrollment by id.
    pub fn get_enrollment(&self, id: &str) -> std::result::Result<Option<Enrollment>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = ?1"
        ))?;
        let enrollment = stmt
            .query_row(params![id], row_to_enrollment)
            .optional()?;
        Ok(enrollment)
    }

    /// List a student's enrollments, optionally filtered by status.
    pub fn list_by_student(
        &self,
        student_id: &str,
        status: Option<EnrollmentStatus>,
    ) -> std::result::Result<Vec<Enrollment>, DatabaseError> {
        let conn = self.conn();
        let mut out = Vec::new();
        match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
                     WHERE student_id = ?1 AND status = ?2
                     ORDER BY created_at DESC"
                ))?;
                let rows = stmt.query_map(
                    params![student_id, format_enrollment_status(status)],
                    row_to_enrollment,
                )?;
                for row in rows {
                    out.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
                     WHERE student_id = ?1
                     ORDER BY created_at DESC"
                ))?;
                let rows = stmt.query_map(params![student_id], row_to_enrollment)?;
                for row in rows {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    /// Approve an enrollment and set its expiry (`None` = never expires).
    ///
    /// # Errors
    /// Returns an error if the enrollment does not exist.
    pub fn approve_enrollment(
        &self,
        id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> std::result::Result<(), DatabaseError> {
        let updated = self.conn().execute(
            "UPDATE enrollments SET status = ?1, expires_at = ?2 WHERE id = ?3",
            params![
                format_enrollment_status(EnrollmentStatus::Approved),
                expires_at.map(|t| t.to_rfc3339()),
                id,
            ],
        )?;
        if updated == 0 {
            return Err(DatabaseError::QueryFailed(format!(
                "enrollment not found: {id}"
            )));
        }
        Ok(())
    }

    fn update_removed(&self, id: &str, reason: &str) -> std::result::Result<usize, DatabaseError> {
        let updated = self.conn().execute(
            "UPDATE enrollments SET status = ?1, removal_reason = ?2 WHERE id = ?3",
            params![
                format_enrollment_status(EnrollmentStatus::Removed),
                reason,
                id,
            ],
        )?;
        Ok(updated)
    }

    // === Notifications ===

    /// Insert a notification event with an explicit creation time.
    ///
    /// The sink trait stamps the wall clock; this variant exists for
    /// backfills and tests that need to control event age.
    pub fn insert_notification_at(
        &self,
        user_id: &str,
        kind: NotificationKind,
        related_id: &str,
        title: &str,
        message: &str,
        created_at: DateTime<Utc>,
    ) -> std::result::Result<i64, DatabaseError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO notifications (user_id, kind, related_id, title, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                format_notification_kind(kind),
                related_id,
                title,
                message,
                created_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's most recent notification events, newest first.
    pub fn list_notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> std::result::Result<Vec<NotificationEvent>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, kind, related_id, title, message, created_at
             FROM notifications
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            let kind_str: String = row.get(2)?;
            let created_at: String = row.get(6)?;
            Ok(NotificationEvent {
                id: row.get(0)?,
                user_id: row.get(1)?,
                kind: parse_notification_kind(&kind_str).ok_or_else(|| {
                    conversion_failure(2, format!("unknown notification kind '{kind_str}'"))
                })?,
                related_id: row.get(3)?,
                title: row.get(4)?,
                message: row.get(5)?,
                created_at: parse_timestamp(6, &created_at)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl EnrollmentStore for Database {
    fn list_approved(&self, student_id: &str) -> std::result::Result<Vec<Enrollment>, StoreError> {
        self.list_by_student(student_id, Some(EnrollmentStatus::Approved))
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn mark_removed(&self, enrollment_id: &str, reason: &str) -> std::result::Result<(), StoreError> {
        let updated = self
            .update_removed(enrollment_id, reason)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        if updated == 0 {
            return Err(StoreError::NotFound(enrollment_id.to_string()));
        }
        Ok(())
    }
}

impl NotificationSink for Database {
    fn exists_recent(
        &self,
        user_id: &str,
        kind: NotificationKind,
        related_id: &str,
        since: DateTime<Utc>,
    ) -> std::result::Result<bool, SinkError> {
        self.conn()
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM notifications
                    WHERE user_id = ?1 AND kind = ?2 AND related_id = ?3 AND created_at >= ?4
                 )",
                params![
                    user_id,
                    format_notification_kind(kind),
                    related_id,
                    since.to_rfc3339(),
                ],
                |row| row.get::<_, bool>(0),
            )
            .map_err(|e| SinkError::Unavailable(e.to_string()))
    }

    fn insert(
        &self,
        user_id: &str,
        kind: NotificationKind,
        related_id: &str,
        title: &str,
        message: &str,
    ) -> std::result::Result<(), SinkError> {
        self.insert_notification_at(user_id, kind, related_id, title, message, Utc::now())
            .map(|_| ())
            .map_err(|e| SinkError::Unavailable(e.to_string()))
    }
}
