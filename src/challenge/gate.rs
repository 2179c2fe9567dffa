//! The "solve a problem to dismiss" flow.
//!
//! # Phases
//!
//! ```text
//!             begin_check()            latest > initial
//!  Ringing ─────────────────► Checking ─────────────────► Solved ──(1.5s)──► Done
//!     ▲                          │
//!     │                          │ latest <= initial, or the request failed
//!     │                          ▼
//!     └─────────(3s)──────── Rejected
//! ```
//!
//! The baseline is the solved count the service reports when the alarm
//! fires. A gate created with [`ChallengeGate::awaiting_baseline`] refuses
//! checks with [`GateError::BaselinePending`] until
//! [`ChallengeGate::set_baseline`] supplies it.
//!
//! The gate never talks to the network itself. The shell calls
//! [`ChallengeGate::begin_check`], runs the request, and feeds the result to
//! [`ChallengeGate::complete_check`]. Display windows are measured against
//! the `now` passed to [`ChallengeGate::poll`], which reports
//! [`GateEvent::Solved`] exactly once.

use std::time::{Duration, Instant};

use thiserror::Error;

use super::audio::{AudioCue, AudioError};
use crate::service::ServiceError;

/// How long each acknowledgment stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTiming {
    pub success_display: Duration,
    pub rejection_display: Duration,
}

impl Default for GateTiming {
    fn default() -> Self {
        Self {
            success_display: Duration::from_millis(1_500),
            rejection_display: Duration::from_millis(3_000),
        }
    }
}

/// Where the gate is in its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    /// Waiting for the user to claim a solve.
    Ringing,
    /// A verification request is outstanding.
    Checking,
    /// Solve confirmed; success overlay shown until `until`.
    Solved { until: Instant },
    /// No new solve detected; rejection overlay shown until `until`.
    Rejected { until: Instant },
    /// Completion reported. The gate is finished.
    Done,
}

/// Outcome of feeding a verification result to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckVerdict {
    Solved { latest: u32 },
    NotYetSolved { latest: u32 },
    /// The request failed. Shown to the user exactly like `NotYetSolved`.
    Unverified,
    /// No check was outstanding; the result was dropped.
    Ignored,
}

/// Transition reported by [`ChallengeGate::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    /// The rejection overlay timed out; back to the ringing screen.
    RejectionCleared,
    /// The success overlay timed out; the alarm may be dismissed.
    Solved,
}

/// Why a check could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("the starting solved count is not known yet")]
    BaselinePending,

    #[error("a verification is already in progress")]
    AlreadyChecking,

    #[error("an acknowledgment is still on screen")]
    Acknowledging,

    #[error("the challenge is already complete")]
    Finished,
}

/// Full-screen ringing state for one alarm session.
pub struct ChallengeGate {
    initial_solved_count: Option<u32>,
    latest_solved_count: Option<u32>,
    phase: GatePhase,
    audio: Box<dyn AudioCue>,
    audio_deferred: bool,
    flicker_on: bool,
    timing: GateTiming,
}

impl std::fmt::Debug for ChallengeGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeGate")
            .field("initial_solved_count", &self.initial_solved_count)
            .field("latest_solved_count", &self.latest_solved_count)
            .field("phase", &self.phase)
            .field("audio_playing", &self.audio.is_playing())
            .field("audio_deferred", &self.audio_deferred)
            .finish()
    }
}

impl ChallengeGate {
    /// Create a gate whose baseline is `initial_solved_count`.
    #[must_use]
    pub fn new(initial_solved_count: u32, audio: Box<dyn AudioCue>, timing: GateTiming) -> Self {
        let mut gate = Self::awaiting_baseline(audio, timing);
        gate.set_baseline(initial_solved_count);
        gate
    }

    /// Create a gate that rings before its baseline is known.
    #[must_use]
    pub fn awaiting_baseline(audio: Box<dyn AudioCue>, timing: GateTiming) -> Self {
        Self {
            initial_solved_count: None,
            latest_solved_count: None,
            phase: GatePhase::Ringing,
            audio,
            audio_deferred: false,
            flicker_on: true,
            timing,
        }
    }

    /// Record the starting solved count. Only the first call has any effect.
    pub fn set_baseline(&mut self, count: u32) -> bool {
        if self.initial_solved_count.is_some() {
            log::debug!("Baseline already set; ignoring count {}", count);
            return false;
        }
        log::info!("Challenge baseline solved count {}", count);
        self.initial_solved_count = Some(count);
        self.latest_solved_count = Some(count);
        true
    }

    /// Start the alarm sound.
    ///
    /// If the platform blocks playback, the start is retried on the next
    /// [`on_user_action`](Self::on_user_action).
    pub fn on_enter(&mut self) {
        self.try_start_audio();
    }

    /// Any key press while ringing. Retries deferred audio.
    pub fn on_user_action(&mut self) {
        if self.audio_deferred && self.audio_should_play() {
            log::debug!("Retrying deferred alarm sound after user action");
            self.try_start_audio();
        }
    }

    fn try_start_audio(&mut self) {
        match self.audio.start() {
            Ok(()) => {
                self.audio_deferred = false;
                log::debug!("Alarm sound started");
            }
            Err(AudioError::Blocked(reason)) => {
                self.audio_deferred = true;
                log::debug!("Alarm sound deferred until next user action: {}", reason);
            }
            Err(e @ AudioError::Failed(_)) => {
                self.audio_deferred = false;
                log::warn!("Alarm sound unavailable: {}", e);
            }
        }
    }

    fn audio_should_play(&self) -> bool {
        !matches!(self.phase, GatePhase::Solved { .. } | GatePhase::Done)
    }

    /// The user claims to have solved a problem.
    pub fn begin_check(&mut self) -> Result<(), GateError> {
        match self.phase {
            GatePhase::Ringing if self.initial_solved_count.is_none() => Err(GateError::BaselinePending),
            GatePhase::Ringing => {
                self.phase = GatePhase::Checking;
                Ok(())
            }
            GatePhase::Checking => Err(GateError::AlreadyChecking),
            GatePhase::Solved { .. } | GatePhase::Rejected { .. } => Err(GateError::Acknowledging),
            GatePhase::Done => Err(GateError::Finished),
        }
    }

    /// Apply the verification result.
    pub fn complete_check(&mut self, result: Result<u32, ServiceError>, now: Instant) -> CheckVerdict {
        let (GatePhase::Checking, Some(initial)) = (self.phase, self.initial_solved_count) else {
            log::debug!("Dropping verification result outside of a check");
            return CheckVerdict::Ignored;
        };

        let verdict = match result {
            Ok(latest) => {
                self.latest_solved_count = Some(latest);
                if latest > initial {
                    log::info!("Solve confirmed: {} -> {}", initial, latest);
                    CheckVerdict::Solved { latest }
                } else {
                    log::info!("No new solve yet: count {} (baseline {})", latest, initial);
                    CheckVerdict::NotYetSolved { latest }
                }
            }
            Err(e) => {
                log::warn!("Could not verify solved count: {}", e);
                CheckVerdict::Unverified
            }
        };

        self.phase = match verdict {
            CheckVerdict::Solved { .. } => {
                self.audio.stop();
                self.audio_deferred = false;
                GatePhase::Solved {
                    until: now + self.timing.success_display,
                }
            }
            _ => GatePhase::Rejected {
                until: now + self.timing.rejection_display,
            },
        };
        verdict
    }

    /// Advance display windows and keep the sound looping.
    pub fn poll(&mut self, now: Instant) -> Option<GateEvent> {
        match self.phase {
            GatePhase::Rejected { until } if now >= until => {
                self.phase = GatePhase::Ringing;
                Some(GateEvent::RejectionCleared)
            }
            GatePhase::Solved { until } if now >= until => {
                self.phase = GatePhase::Done;
                Some(GateEvent::Solved)
            }
            _ => {
                if self.audio_should_play() {
                    self.audio.pump();
                }
                None
            }
        }
    }

    /// Flip the ringing animation.
    pub fn tick_flicker(&mut self) {
        self.flicker_on = !self.flicker_on;
    }

    /// Stop the sound. Called when the ringing view goes away.
    pub fn teardown(&mut self) {
        self.audio.stop();
        self.audio_deferred = false;
    }

    #[must_use]
    pub fn phase(&self) -> GatePhase {
        self.phase
    }

    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.phase == GatePhase::Checking
    }

    /// Baseline solved count, once known.
    #[must_use]
    pub fn initial_solved_count(&self) -> Option<u32> {
        self.initial_solved_count
    }

    /// Most recent count seen by this gate.
    #[must_use]
    pub fn latest_solved_count(&self) -> Option<u32> {
        self.latest_solved_count
    }

    #[must_use]
    pub fn flicker_on(&self) -> bool {
        self.flicker_on
    }

    #[must_use]
    pub fn is_audio_playing(&self) -> bool {
        self.audio.is_playing()
    }

    #[must_use]
    pub fn is_audio_deferred(&self) -> bool {
        self.audio_deferred
    }
}

impl Drop for ChallengeGate {
    fn drop(&mut self) {
        self.audio.stop();
    }
}
