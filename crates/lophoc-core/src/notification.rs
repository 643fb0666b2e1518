//! Notification kinds and message templates.
//!
//! The reconciler decides *whether* and *what* to emit; delivery (push,
//! email, in-app) is owned by downstream consumers of the sink. Kinds are
//! qualified by enrollment kind so a trial warning and a paid-term warning
//! stay distinct events with independent dedup histories.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::enrollment::EnrollmentKind;

/// Every notification the reconciler can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TrialExpiringIn3Days,
    TrialExpiringIn24h,
    TrialExpired,
    RealExpiringIn3Days,
    RealExpiringIn24h,
    RealExpired,
}

impl NotificationKind {
    pub fn expiring_in_3_days(kind: EnrollmentKind) -> Self {
        match kind {
            EnrollmentKind::Trial => NotificationKind::TrialExpiringIn3Days,
            EnrollmentKind::Real => NotificationKind::RealExpiringIn3Days,
        }
    }

    pub fn expiring_in_24h(kind: EnrollmentKind) -> Self {
        match kind {
            EnrollmentKind::Trial => NotificationKind::TrialExpiringIn24h,
            EnrollmentKind::Real => NotificationKind::RealExpiringIn24h,
        }
    }

    pub fn expired(kind: EnrollmentKind) -> Self {
        match kind {
            EnrollmentKind::Trial => NotificationKind::TrialExpired,
            EnrollmentKind::Real => NotificationKind::RealExpired,
        }
    }

    /// Trailing window within which a repeat of this kind for the same
    /// relation is suppressed. `None` means no window: the expired notice
    /// is already guarded by the status transition itself (a removed
    /// enrollment is not a candidate on the next pass).
    pub fn dedup_window(&self) -> Option<Duration> {
        match self {
            NotificationKind::TrialExpiringIn3Days | NotificationKind::RealExpiringIn3Days => {
                Some(Duration::days(2))
            }
            NotificationKind::TrialExpiringIn24h | NotificationKind::RealExpiringIn24h => {
                Some(Duration::days(1))
            }
            NotificationKind::TrialExpired | NotificationKind::RealExpired => None,
        }
    }
}

/// Title and body composed for one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub message: String,
}

/// "Còn N ngày ..." -- advance warning at the 3-day threshold.
pub fn three_day_warning(kind: EnrollmentKind, days_left: i64) -> NotificationContent {
    NotificationContent {
        title: format!("Còn {} ngày {}", days_left, kind.type_label()),
        message: format!(
            "Lớp học của bạn sẽ hết hạn trong {} ngày nữa. Hãy chuẩn bị gia hạn!",
            days_left
        ),
    }
}

/// "Sắp hết hạn ...!" -- advance warning inside the final 24 hours.
pub fn last_day_warning(kind: EnrollmentKind, hours_left: i64) -> NotificationContent {
    NotificationContent {
        title: format!("Sắp hết hạn {}!", kind.type_label()),
        message: format!(
            "Lớp học của bạn sẽ hết hạn trong {} giờ nữa. Hãy gia hạn ngay!",
            hours_left
        ),
    }
}

/// "Hết hạn ..." -- emitted once, alongside the access revocation.
pub fn expired_notice(kind: EnrollmentKind) -> NotificationContent {
    let label = kind.type_label();
    NotificationContent {
        title: format!("Hết hạn {}", label),
        message: format!(
            "Thời gian {} của bạn đã hết. Vui lòng đăng ký lại để tiếp tục học.",
            label
        ),
    }
}

/// A notification event as stored by the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: i64,
    pub user_id: String,
    pub kind: NotificationKind,
    pub related_id: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
