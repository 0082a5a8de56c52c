use chrono::{DateTime, Duration, Utc};

/// How far ahead of a release the reminder fires
pub const REMINDER_LEAD_MINUTES: i64 = 10;

pub const DEFAULT_REMINDER_BODY: &str = "This show airs in 10 minutes! Grab your popcorn. 🍿";

/// When a release reminder should fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderPlan {
    /// Fire at the given instant, ten minutes before release
    At(DateTime<Utc>),
    /// Release is less than ten minutes away: fire now
    Immediate,
    /// Release already happened
    Expired,
}

/// A reminder ready to hand to the push scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub title: String,
    pub body: String,
    /// `None` means deliver immediately
    pub trigger: Option<DateTime<Utc>>,
}

/// Push notification SDK seam
#[async_trait::async_trait]
pub trait ReminderScheduler: Send + Sync {
    async fn schedule(&self, reminder: Reminder) -> bool;
}

pub fn plan_reminder(release: DateTime<Utc>, now: DateTime<Utc>) -> ReminderPlan {
    let trigger = release - Duration::minutes(REMINDER_LEAD_MINUTES);
    if trigger > now {
        ReminderPlan::At(trigger)
    } else if release > now {
        ReminderPlan::Immediate
    } else {
        ReminderPlan::Expired
    }
}

/// Schedules a reminder for an ISO-8601 release timestamp
///
/// Returns `false` for an unparseable or past timestamp, or when the scheduler
/// refuses the reminder.
pub async fn schedule_reminder(
    scheduler: &dyn ReminderScheduler,
    title: &str,
    body: &str,
    release_iso: &str,
    now: DateTime<Utc>,
) -> bool {
    let release = match DateTime::parse_from_rfc3339(release_iso) {
        Ok(at) => at.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!(error = %e, release = %release_iso, "Invalid reminder timestamp");
            return false;
        }
    };

    let reminder = match plan_reminder(release, now) {
        ReminderPlan::At(trigger) => Reminder {
            title: format!("🎥 Coming up: {}", title),
            body: if body.is_empty() {
                DEFAULT_REMINDER_BODY.to_string()
            } else {
                body.to_string()
            },
            trigger: Some(trigger),
        },
        ReminderPlan::Immediate => Reminder {
            title: title.to_string(),
            body: body.to_string(),
            trigger: None,
        },
        ReminderPlan::Expired => {
            tracing::debug!(title = %title, release = %release, "Release already passed");
            return false;
        }
    };

    scheduler.schedule(reminder).await
}
