//! Alarm trigger detection.
//!
//! # State Machine
//!
//! ```text
//!           tick() matches an active alarm
//!  Idle ─────────────────────────────────────► Ringing
//!   ▲                                             │
//!   └──────────────── dismiss() ──────────────────┘
//! ```
//!
//! The scanner is driven by the clock tick. While ringing, ticks never
//! start a second session. A minute that already produced a session is
//! spent: after a dismissal inside that same minute, no alarm fires again
//! until a later minute matches.

use chrono::{NaiveDate, NaiveDateTime};

use super::model::{AlarmId, AlarmTime};
use super::store::AlarmStore;

/// The period between an alarm firing and its dismissal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingingSession {
    pub alarm_id: AlarmId,
    pub time: AlarmTime,
    pub label: String,
    pub started_at: NaiveDateTime,
}

/// Result of a single [`AlarmScanner::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Nothing matched.
    Idle,
    /// An alarm just fired and a session began.
    Triggered(RingingSession),
    /// A session is already in progress.
    Ringing,
}

#[derive(Debug, Clone, Default)]
enum State {
    #[default]
    Idle,
    Ringing(RingingSession),
}

/// Compares the clock against the alarm store once per tick.
#[derive(Debug, Clone, Default)]
pub struct AlarmScanner {
    state: State,
    spent_minute: Option<(NaiveDate, AlarmTime)>,
}

impl AlarmScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `now` against the active alarms.
    ///
    /// The solved-count baseline is not known here; the caller fetches it
    /// from the service once a session starts.
    pub fn tick(&mut self, now: NaiveDateTime, store: &AlarmStore) -> ScanOutcome {
        if matches!(self.state, State::Ringing(_)) {
            return ScanOutcome::Ringing;
        }

        let minute = (now.date(), AlarmTime::from_time(now.time()));
        if self.spent_minute == Some(minute) {
            return ScanOutcome::Idle;
        }

        let Some(alarm) = store.active().find(|a| a.time.matches(now.time())) else {
            return ScanOutcome::Idle;
        };

        let session = RingingSession {
            alarm_id: alarm.id,
            time: alarm.time,
            label: alarm.label.clone(),
            started_at: now,
        };
        log::info!(
            "Alarm {} ({}) triggered at {}",
            alarm.id,
            alarm.label,
            now.format("%H:%M:%S")
        );

        self.spent_minute = Some(minute);
        self.state = State::Ringing(session.clone());
        ScanOutcome::Triggered(session)
    }

    /// End the current session. Returns it, or `None` if nothing was ringing.
    pub fn dismiss(&mut self) -> Option<RingingSession> {
        match std::mem::take(&mut self.state) {
            State::Ringing(session) => {
                log::info!("Alarm {} dismissed", session.alarm_id);
                Some(session)
            }
            State::Idle => None,
        }
    }

    #[must_use]
    pub fn is_ringing(&self) -> bool {
        matches!(self.state, State::Ringing(_))
    }

    #[must_use]
    pub fn session(&self) -> Option<&RingingSession> {
        match &self.state {
            State::Ringing(session) => Some(session),
            State::Idle => None,
        }
    }
}
