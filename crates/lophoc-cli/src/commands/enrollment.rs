//! Enrollment management commands for CLI.

use chrono::{Duration, Utc};
use clap::Subcommand;
use lophoc_core::{
    Config, Database, Enrollment, EnrollmentKind, EnrollmentStatus, EnrollmentStore,
};

#[derive(Subcommand)]
pub enum EnrollmentAction {
    /// Create a new pending enrollment
    Add {
        /// Student ID
        student: String,
        /// Class ID
        class: String,
        /// Enrollment kind: trial or real (default: trial)
        #[arg(long, default_value = "trial")]
        kind: String,
    },
    /// Approve an enrollment and start its access window
    Approve {
        /// Enrollment ID
        id: String,
        /// Override the configured access window, in days
        #[arg(long)]
        days: Option<i64>,
        /// Grant permanent access (no expiry)
        #[arg(long)]
        permanent: bool,
    },
    /// List a student's enrollments
    List {
        /// Student ID
        student: String,
        /// Filter by status (pending, approved, rejected, removed)
        #[arg(long)]
        status: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an enrollment (revokes access)
    Remove {
        /// Enrollment ID
        id: String,
        /// Removal reason
        #[arg(long)]
        reason: String,
    },
}

fn parse_kind(s: &str) -> Result<EnrollmentKind, String> {
    match s {
        "trial" => Ok(EnrollmentKind::Trial),
        "real" => Ok(EnrollmentKind::Real),
        other => Err(format!("unknown enrollment kind: {other}")),
    }
}

fn parse_status(s: &str) -> Result<EnrollmentStatus, String> {
    match s {
        "pending" => Ok(EnrollmentStatus::Pending),
        "approved" => Ok(EnrollmentStatus::Approved),
        "rejected" => Ok(EnrollmentStatus::Rejected),
        "removed" => Ok(EnrollmentStatus::Removed),
        other => Err(format!("unknown status: {other}")),
    }
}

pub fn run(action: EnrollmentAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        EnrollmentAction::Add {
            student,
            class,
            kind,
        } => {
            let kind = parse_kind(&kind)?;
            let enrollment = Enrollment::new(student, class, kind);
            db.insert_enrollment(&enrollment)?;
            println!("Enrollment created: {}", enrollment.id);
        }
        EnrollmentAction::Approve {
            id,
            days,
            permanent,
        } => {
            let enrollment = db
                .get_enrollment(&id)?
                .ok_or_else(|| format!("enrollment not found: {id}"))?;

            let expires_at = if permanent {
                None
            } else {
                let config = Config::load_or_default();
                let days = days.unwrap_or(match enrollment.kind {
                    EnrollmentKind::Trial => config.reconcile.trial_days,
                    EnrollmentKind::Real => config.reconcile.term_days,
                });
                Some(Utc::now() + Duration::days(days))
            };

            db.approve_enrollment(&id, expires_at)?;
            match expires_at {
                Some(t) => println!("Approved until {}", t.to_rfc3339()),
                None => println!("Approved permanently"),
            }
        }
        EnrollmentAction::List {
            student,
            status,
            json,
        } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let enrollments = db.list_by_student(&student, status)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&enrollments)?);
            } else {
                for e in &enrollments {
                    let expiry = e
                        .expires_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string());
                    println!(
                        "{}  class={}  {:?}/{:?}  expires={}",
                        e.id, e.class_id, e.kind, e.status, expiry
                    );
                }
                if enrollments.is_empty() {
                    println!("No enrollments for {student}");
                }
            }
        }
        EnrollmentAction::Remove { id, reason } => {
            db.mark_removed(&id, &reason)?;
            println!("Removed: {id}");
        }
    }

    Ok(())
}
