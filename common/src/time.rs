//! Time utilities and constants for tCurrency.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// How long a fetched rate table is served without a network call (5 minutes).
    pub fn rate_freshness_window() -> Duration {
        Duration::minutes(5)
    }

    /// Default rate source request timeout (10 seconds).
    pub fn rate_request_timeout() -> Duration {
        Duration::seconds(10)
    }
}

/// A timestamp (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Age of `timestamp` as seen at `at`. Never negative.
pub fn age_at(timestamp: Timestamp, at: Timestamp) -> Duration {
    let age = at.signed_duration_since(timestamp);
    if age < Duration::zero() {
        Duration::zero()
    } else {
        age
    }
}

/// Check whether `timestamp` is younger than `window` at `at`.
pub fn is_fresh_within(timestamp: Timestamp, window: Duration, at: Timestamp) -> bool {
    age_at(timestamp, at) < window
}

/// Human label for when rates were last updated.
///
/// Under a minute reads "just updated", under an hour "N minutes ago",
/// and anything older shows the wall-clock time of the update.
pub fn update_label<Tz: TimeZone>(last_update: Option<&DateTime<Tz>>, now: &DateTime<Tz>) -> String {
    let Some(last) = last_update else {
        return String::new();
    };

    let minutes = now.clone().signed_duration_since(last.clone()).num_minutes();
    match minutes {
        m if m < 1 => "just updated".to_string(),
        1 => "1 minute ago".to_string(),
        m if m < 60 => format!("{} minutes ago", m),
        _ => format!("updated today at {}:{:02}", last.hour(), last.minute()),
    }
}
