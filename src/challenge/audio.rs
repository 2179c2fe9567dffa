//! Looping alarm sound.
//!
//! The cue is played in a manual loop: [`AudioCue::pump`] is called on
//! every frame and restarts or re-emits the sound when needed.
//!
//! - [`BellCue`]: rings the terminal bell at a fixed interval.
//! - [`PlayerCue`]: plays a sound file through an external player command,
//!   relaunching it whenever it exits.
//! - [`NullCue`]: silent, used when audio is disabled.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::AudioConfig;

/// Why playback did not start.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The platform does not allow playback right now. Worth retrying
    /// after the next user action.
    #[error("playback blocked: {0}")]
    Blocked(String),

    /// Playback failed outright.
    #[error("playback failed: {0}")]
    Failed(String),
}

/// A sound that loops until stopped.
pub trait AudioCue: Send {
    /// Begin looping. Starting an already playing cue is a no-op.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Stop immediately. Safe to call when not playing.
    fn stop(&mut self);

    fn is_playing(&self) -> bool;

    /// Drive the loop. Called frequently while the alarm is ringing.
    fn pump(&mut self) {}
}

/// Build the cue described by the audio settings.
#[must_use]
pub fn from_config(config: &AudioConfig) -> Box<dyn AudioCue> {
    if !config.enabled {
        return Box::new(NullCue::default());
    }
    match &config.sound_file {
        Some(file) => Box::new(PlayerCue::new(config.player.clone(), file.clone())),
        None => Box::new(BellCue::new(Duration::from_millis(config.bell_interval_ms))),
    }
}

/// Silent cue that only tracks its playing flag.
#[derive(Debug, Default)]
pub struct NullCue {
    playing: bool,
}

impl AudioCue for NullCue {
    fn start(&mut self) -> Result<(), AudioError> {
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Rings the terminal bell every `interval`.
#[derive(Debug)]
pub struct BellCue {
    interval: Duration,
    last_ring: Option<Instant>,
    playing: bool,
}

impl BellCue {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_ring: None,
            playing: false,
        }
    }

    fn ring(&mut self) {
        let mut stdout = io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|()| stdout.flush()) {
            log::debug!("Failed to ring terminal bell: {}", e);
        }
        self.last_ring = Some(Instant::now());
    }
}

impl AudioCue for BellCue {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.playing {
            return Ok(());
        }
        if !io::stdout().is_terminal() {
            return Err(AudioError::Blocked(
                "stdout is not an interactive terminal".to_string(),
            ));
        }
        self.playing = true;
        self.ring();
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = false;
        self.last_ring = None;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn pump(&mut self) {
        if !self.playing {
            return;
        }
        if self.last_ring.is_none_or(|at| at.elapsed() >= self.interval) {
            self.ring();
        }
    }
}

/// Plays `file` with `player`, relaunching it each time it finishes.
#[derive(Debug)]
pub struct PlayerCue {
    player: String,
    file: PathBuf,
    child: Option<Child>,
}

impl PlayerCue {
    #[must_use]
    pub fn new(player: String, file: PathBuf) -> Self {
        Self {
            player,
            file,
            child: None,
        }
    }

    fn spawn(&self) -> Result<Child, AudioError> {
        if !self.file.exists() {
            return Err(AudioError::Failed(format!(
                "sound file not found: {}",
                self.file.display()
            )));
        }
        Command::new(&self.player)
            .arg(&self.file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AudioError::Failed(format!("could not launch '{}': {}", self.player, e)))
    }
}

impl AudioCue for PlayerCue {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.child.is_none() {
            self.child = Some(self.spawn()?);
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn is_playing(&self) -> bool {
        self.child.is_some()
    }

    fn pump(&mut self) {
        let finished = match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(Some(_))) => true,
            Some(Ok(None)) | None => false,
            Some(Err(e)) => {
                log::debug!("Could not poll sound player: {}", e);
                false
            }
        };
        if finished {
            match self.spawn() {
                Ok(child) => self.child = Some(child),
                Err(e) => {
                    log::warn!("Alarm sound stopped looping: {}", e);
                    self.child = None;
                }
            }
        }
    }
}

impl Drop for PlayerCue {
    fn drop(&mut self) {
        self.stop();
    }
}
