//! Wall-clock source for the time display and the alarm scanner.
//!
//! The runner reads "now" through the [`Clock`] trait on every tick and
//! hands the value to the app, which never touches the system clock itself.

use chrono::{Local, NaiveDateTime, NaiveTime, Timelike};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the system clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Format as `HH:MM:SS` for the big clock display.
#[must_use]
pub fn format_hms(time: NaiveTime) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        time.hour(),
        time.minute(),
        time.second()
    )
}

/// Long date, e.g. `Monday, October 19, 2026`.
#[must_use]
pub fn format_long_date(at: NaiveDateTime) -> String {
    at.format("%A, %B %-d, %Y").to_string()
}
