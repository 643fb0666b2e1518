//! Integration tests for the enrollment expiration reconciler.
//!
//! Exercises full passes over the SQLite store with a pinned clock:
//! expiry revocation, warning dedup windows, idempotent repeat passes,
//! and the one-way Removed transition.

use std::sync::Arc;

use chrono::{Duration, Utc};
use lophoc_core::{
    Clock, Database, Enrollment, EnrollmentKind, EnrollmentStatus, ManualClock, NotificationKind,
    Reconciler,
};

struct Fixture {
    db: Arc<Database>,
    clock: Arc<ManualClock>,
    reconciler: Reconciler,
}

fn fixture() -> Fixture {
    let db = Arc::new(Database::open_memory().unwrap());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let reconciler = Reconciler::new(db.clone(), db.clone(), clock.clone());
    Fixture {
        db,
        clock,
        reconciler,
    }
}

fn seed_approved(
    db: &Database,
    student: &str,
    class: &str,
    kind: EnrollmentKind,
    expires_at: Option<chrono::DateTime<Utc>>,
) -> Enrollment {
    let mut e = Enrollment::new(student, class, kind);
    e.status = EnrollmentStatus::Approved;
    e.expires_at = expires_at;
    db.insert_enrollment(&e).unwrap();
    e
}

#[test]
fn expired_trial_is_removed_and_notified_once() {
    let f = fixture();
    let now = f.clock.now();
    let e = seed_approved(
        &f.db,
        "s1",
        "c1",
        EnrollmentKind::Trial,
        Some(now - Duration::seconds(1)),
    );

    let report = f.reconciler.run("s1").unwrap();
    assert_eq!(report.removed_count(), 1);

    let stored = f.db.get_enrollment(&e.id).unwrap().unwrap();
    assert_eq!(stored.status, EnrollmentStatus::Removed);
    assert_eq!(stored.removal_reason.as_deref(), Some("Hết hạn học thử"));

    let events = f.db.list_notifications("s1", 10).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::TrialExpired);
    assert_eq!(events[0].related_id, "c1");
    assert_eq!(events[0].title, "Hết hạn học thử");
}

#[test]
fn real_enrollment_two_hours_out_gets_a_24h_warning() {
    let f = fixture();
    let now = f.clock.now();
    let e = seed_approved(
        &f.db,
        "s1",
        "c9",
        EnrollmentKind::Real,
        Some(now + Duration::hours(2)),
    );

    let report = f.reconciler.run("s1").unwrap();
    assert_eq!(report.notified_count(), 1);
    assert_eq!(report.removed_count(), 0);

    // Status untouched.
    let stored = f.db.get_enrollment(&e.id).unwrap().unwrap();
    assert_eq!(stored.status, EnrollmentStatus::Approved);

    let events = f.db.list_notifications("s1", 10).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::RealExpiringIn24h);
    assert!(events[0].message.contains("trong 2 giờ nữa"));
}

#[test]
fn recent_warning_suppresses_a_new_one() {
    let f = fixture();
    let now = f.clock.now();
    seed_approved(
        &f.db,
        "s1",
        "c9",
        EnrollmentKind::Real,
        Some(now + Duration::hours(2)),
    );
    // Same kind for the same relation, half an hour ago.
    f.db.insert_notification_at(
        "s1",
        NotificationKind::RealExpiringIn24h,
        "c9",
        "Sắp hết hạn học thật!",
        "Lớp học của bạn sẽ hết hạn trong 3 giờ nữa. Hãy gia hạn ngay!",
        now - Duration::minutes(30),
    )
    .unwrap();

    let report = f.reconciler.run("s1").unwrap();
    assert_eq!(report.notified_count(), 0);
    assert_eq!(report.suppressed_count(), 1);
    assert_eq!(f.db.list_notifications("s1", 10).unwrap().len(), 1);
}

#[test]
fn permanent_enrollment_is_never_touched() {
    let f = fixture();
    let e = seed_approved(&f.db, "s1", "c1", EnrollmentKind::Real, None);

    for _ in 0..3 {
        f.reconciler.run("s1").unwrap();
        f.clock.advance(Duration::days(365));
    }

    let stored = f.db.get_enrollment(&e.id).unwrap().unwrap();
    assert_eq!(stored.status, EnrollmentStatus::Approved);
    assert!(f.db.list_notifications("s1", 10).unwrap().is_empty());
}

#[test]
fn three_day_warning_carries_ceiling_days() {
    let f = fixture();
    let now = f.clock.now();
    seed_approved(
        &f.db,
        "s1",
        "c1",
        EnrollmentKind::Trial,
        Some(now + Duration::hours(49)),
    );

    f.reconciler.run("s1").unwrap();
    let events = f.db.list_notifications("s1", 10).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::TrialExpiringIn3Days);
    // 49h rounds up to 3 days.
    assert_eq!(events[0].title, "Còn 3 ngày học thử");
}

#[test]
fn repeated_passes_within_the_window_insert_one_event() {
    let f = fixture();
    let now = f.clock.now();
    seed_approved(
        &f.db,
        "s1",
        "c1",
        EnrollmentKind::Trial,
        Some(now + Duration::hours(20)),
    );

    // Three passes, half an hour apart.
    for _ in 0..3 {
        f.reconciler.run("s1").unwrap();
        f.clock.advance(Duration::minutes(30));
    }

    let events = f.db.list_notifications("s1", 10).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::TrialExpiringIn24h);
}

#[test]
fn double_run_is_idempotent() {
    let f = fixture();
    let now = f.clock.now();
    let expired = seed_approved(
        &f.db,
        "s1",
        "c1",
        EnrollmentKind::Trial,
        Some(now - Duration::hours(1)),
    );
    seed_approved(
        &f.db,
        "s1",
        "c2",
        EnrollmentKind::Real,
        Some(now + Duration::hours(5)),
    );

    let first = f.reconciler.run("s1").unwrap();
    assert_eq!(first.removed_count(), 1);
    assert_eq!(first.notified_count(), 1);

    let second = f.reconciler.run("s1").unwrap();
    assert_eq!(second.removed_count(), 0);
    assert_eq!(second.notified_count(), 0);
    assert_eq!(second.suppressed_count(), 1);

    // One expiry notice, one warning -- no duplicates from the second pass.
    assert_eq!(f.db.list_notifications("s1", 10).unwrap().len(), 2);
    let stored = f.db.get_enrollment(&expired.id).unwrap().unwrap();
    assert_eq!(stored.status, EnrollmentStatus::Removed);
}

#[test]
fn removed_never_returns_to_approved() {
    let f = fixture();
    let now = f.clock.now();
    let e = seed_approved(
        &f.db,
        "s1",
        "c1",
        EnrollmentKind::Real,
        Some(now - Duration::days(1)),
    );

    f.reconciler.run("s1").unwrap();
    for _ in 0..5 {
        f.clock.advance(Duration::hours(6));
        f.reconciler.run("s1").unwrap();
        let stored = f.db.get_enrollment(&e.id).unwrap().unwrap();
        assert_eq!(stored.status, EnrollmentStatus::Removed);
    }

    // The expiry notice fired exactly once across all passes.
    let events = f.db.list_notifications("s1", 10).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::RealExpired);
    assert_eq!(events[0].message, "Thời gian học thật của bạn đã hết. Vui lòng đăng ký lại để tiếp tục học.");
}

#[test]
fn warning_escalates_to_removal_as_time_passes() {
    let f = fixture();
    let now = f.clock.now();
    let e = seed_approved(
        &f.db,
        "s1",
        "c1",
        EnrollmentKind::Trial,
        Some(now + Duration::hours(48)),
    );

    // 48h out: 3-day warning.
    f.reconciler.run("s1").unwrap();
    // 12h out: 24h warning.
    f.clock.advance(Duration::hours(36));
    f.reconciler.run("s1").unwrap();
    // Past expiry: removal + notice.
    f.clock.advance(Duration::hours(13));
    f.reconciler.run("s1").unwrap();

    let events = f.db.list_notifications("s1", 10).unwrap();
    let kinds: Vec<NotificationKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds.len(), 3);
    assert!(kinds.contains(&NotificationKind::TrialExpiringIn3Days));
    assert!(kinds.contains(&NotificationKind::TrialExpiringIn24h));
    assert!(kinds.contains(&NotificationKind::TrialExpired));

    let stored = f.db.get_enrollment(&e.id).unwrap().unwrap();
    assert_eq!(stored.status, EnrollmentStatus::Removed);
    assert_eq!(stored.removal_reason.as_deref(), Some("Hết hạn học thử"));
}

#[test]
fn students_are_reconciled_independently() {
    let f = fixture();
    let now = f.clock.now();
    seed_approved(
        &f.db,
        "s1",
        "c1",
        EnrollmentKind::Trial,
        Some(now - Duration::hours(1)),
    );
    let other = seed_approved(
        &f.db,
        "s2",
        "c1",
        EnrollmentKind::Trial,
        Some(now - Duration::hours(1)),
    );

    f.reconciler.run("s1").unwrap();

    // s2 was not part of the pass.
    let stored = f.db.get_enrollment(&other.id).unwrap().unwrap();
    assert_eq!(stored.status, EnrollmentStatus::Approved);
    assert!(f.db.list_notifications("s2", 10).unwrap().is_empty());
}
