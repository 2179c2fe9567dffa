//! Challenge gate: the ringing screen's dismissal logic and its sound.
//!
//! * [`gate`]: phase machine deciding when a ringing alarm may stop.
//! * [`audio`]: looping cues owned by the gate.

pub mod audio;
pub mod gate;

pub use audio::{AudioCue, AudioError, BellCue, NullCue, PlayerCue};
pub use gate::{ChallengeGate, CheckVerdict, GateError, GateEvent, GatePhase, GateTiming};
