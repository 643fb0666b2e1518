//! # Lophoc Core Library
//!
//! This library provides the core business logic for Lophoc, a class
//! enrollment manager for a tutoring platform. It implements a CLI-first
//! philosophy where all operations are available via a standalone CLI
//! binary, with any GUI being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Reconciler**: Periodically scans a student's active enrollments,
//!   classifies each against expiry thresholds, revokes expired access
//!   exactly once, and emits deduplicated warning notifications
//! - **Scheduler**: Explicit per-student lifecycle around the reconciler
//!   (immediate first pass, fixed interval, non-overlapping passes)
//! - **Storage**: SQLite-based enrollment/notification storage and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Reconciler`]: One reconcile pass over one student
//! - [`ReconcileScheduler`]: Periodic driver with clean start/stop
//! - [`Database`]: Enrollment and notification persistence
//! - [`Clock`]: Injectable time source for deterministic tests

pub mod clock;
pub mod enrollment;
pub mod error;
pub mod notification;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use enrollment::band::{classify, days_remaining, hours_remaining, Band};
pub use enrollment::reconciler::{
    removal_reason, EnrollmentOutcome, PassAction, PassReport, ReconcileError, Reconciler,
};
pub use enrollment::scheduler::{ReconcileScheduler, DEFAULT_INTERVAL};
pub use enrollment::store::{EnrollmentStore, NotificationSink, SinkError, StoreError};
pub use enrollment::{Enrollment, EnrollmentKind, EnrollmentStatus};
pub use error::{ConfigError, CoreError, DatabaseError};
pub use notification::{NotificationContent, NotificationEvent, NotificationKind};
pub use storage::{Config, Database, ReconcileConfig};
