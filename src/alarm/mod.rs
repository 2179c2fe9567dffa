//! Alarm records, the in-memory store, and trigger detection.
//!
//! # Architecture
//!
//! * [`model`]: `Alarm`, `AlarmId` and the validated `AlarmTime`.
//! * [`store`]: insertion-ordered collection mutated by user actions.
//! * [`scanner`]: the Idle/Ringing state machine driven by the clock tick.

pub mod model;
pub mod scanner;
pub mod store;

pub use model::{Alarm, AlarmId, AlarmTime, AlarmTimeError};
pub use scanner::{AlarmScanner, RingingSession, ScanOutcome};
pub use store::AlarmStore;
