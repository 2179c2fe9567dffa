//! TUI main loop.
//!
//! This module provides the main entry point for running the interactive TUI.
//! It handles terminal setup, the event loop, and cleanup on exit.
//!
//! # Terminal Management
//!
//! The TUI takes over the terminal by:
//! - Enabling raw mode (unbuffered input, no echo)
//! - Entering the alternate screen buffer
//! - Hiding the cursor
//!
//! All these changes are reverted on exit, including on panic.
//!
//! # Event Loop
//!
//! Timers and network requests run on a tokio runtime and report back over
//! a channel. Each frame the loop:
//! 1. Applies every event that arrived since the last frame
//! 2. Lets the app advance its time-based state
//! 3. Executes the commands the app queued
//! 4. Renders, then polls the keyboard with a short timeout
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use codealarm::clock::SystemClock;
//! use codealarm::identity::IdentityStore;
//! use codealarm::service::HttpProgressClient;
//! use codealarm::tui::{run_tui, App, AppSettings, RunContext};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let client = HttpProgressClient::new("http://localhost:3000", Duration::from_secs(10)).unwrap();
//! let store = IdentityStore::open("/tmp/identity.json").unwrap();
//! let mut app = App::new(AppSettings::default(), store);
//! let context = RunContext {
//!     service: Arc::new(client),
//!     clock: Arc::new(SystemClock),
//!     runtime: runtime.handle().clone(),
//!     tick_period: Duration::from_secs(1),
//!     flicker_period: Duration::from_millis(500),
//! };
//! run_tui(&mut app, &context, None).unwrap();
//! ```

use std::io::{self, Stdout};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use thiserror::Error;
use tokio::runtime::Handle;

use super::app::{Action, App, AppEvent, Command};
use super::events::{EventError, EventHandler};
use super::ui::render;
use crate::clock::Clock;
use crate::identity;
use crate::service::ProgressService;
use crate::timer::ScheduledTask;

/// Frame rate limit: 60 FPS = ~16.67ms per frame.
/// Using 16ms for slightly conservative timing.
const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Event poll timeout: Use the frame duration for responsive rendering.
const POLL_TIMEOUT: Duration = Duration::from_millis(16);

/// Error type for TUI operations.
#[derive(Debug, Error)]
pub enum TuiError {
    /// I/O error from terminal operations.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// Event handling error.
    #[error("event error: {0}")]
    Event(#[from] EventError),

    /// The TUI was interrupted by a shutdown signal.
    #[error("interrupted by shutdown signal")]
    Interrupted,
}

/// Result type for TUI operations.
pub type TuiResult<T> = Result<T, TuiError>;

/// Type alias for the terminal backend.
type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Everything the loop needs besides the app itself.
#[derive(Clone)]
pub struct RunContext {
    pub service: Arc<dyn ProgressService>,
    pub clock: Arc<dyn Clock>,
    pub runtime: Handle,
    pub tick_period: Duration,
    pub flicker_period: Duration,
}

/// Executes [`Command`]s queued by the app.
///
/// Requests are spawned on the runtime and report through `events`. The
/// flicker timer lives here for as long as an alarm rings.
pub struct Dispatcher {
    service: Arc<dyn ProgressService>,
    runtime: Handle,
    flicker_period: Duration,
    events: Sender<AppEvent>,
    flicker: Option<ScheduledTask>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(context: &RunContext, events: Sender<AppEvent>) -> Self {
        Self {
            service: Arc::clone(&context.service),
            runtime: context.runtime.clone(),
            flicker_period: context.flicker_period,
            events,
            flicker: None,
        }
    }

    pub fn execute(&mut self, command: Command) {
        log::trace!("Executing {:?}", command);
        match command {
            Command::LookupUser(username) => {
                let service = Arc::clone(&self.service);
                let events = self.events.clone();
                self.runtime.spawn(async move {
                    let result = identity::verify_username(service.as_ref(), &username).await;
                    let _ = events.send(AppEvent::LoginResult(result));
                });
            }
            Command::FetchSolvedCount { username, purpose } => {
                let service = Arc::clone(&self.service);
                let events = self.events.clone();
                self.runtime.spawn(async move {
                    let result = service.solved_count(&username).await;
                    let _ = events.send(AppEvent::SolvedCount {
                        username,
                        purpose,
                        result,
                    });
                });
            }
            Command::StartFlicker => {
                let events = self.events.clone();
                self.flicker = Some(ScheduledTask::repeating(
                    &self.runtime,
                    "flicker",
                    self.flicker_period,
                    move || events.send(AppEvent::Flicker).is_ok(),
                ));
            }
            Command::StopFlicker => self.flicker = None,
        }
    }

    #[must_use]
    pub fn is_flickering(&self) -> bool {
        self.flicker.is_some()
    }
}

/// Run the interactive TUI.
///
/// This function takes over the terminal and runs the interactive interface
/// until the user quits, a shutdown signal arrives, or an error occurs.
///
/// # Arguments
///
/// * `app` - The application state
/// * `context` - Service, clock and runtime used by timers and requests
/// * `shutdown_flag` - Optional flag for external shutdown signaling (e.g., Ctrl+C handler)
///
/// # Terminal Restoration
///
/// The terminal is always restored to its original state, even on error or panic.
///
/// # Errors
///
/// Returns `TuiError::Io` for terminal I/O errors.
/// Returns `TuiError::Event` for event handling errors.
/// Returns `TuiError::Interrupted` if shutdown was requested.
pub fn run_tui(app: &mut App, context: &RunContext, shutdown_flag: Option<Arc<AtomicBool>>) -> TuiResult<()> {
    // Restore the terminal before the panic message is printed
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, app, context, shutdown_flag);
    restore_terminal()?;

    let _ = panic::take_hook();
    result
}

fn run_loop(
    terminal: &mut Terminal,
    app: &mut App,
    context: &RunContext,
    shutdown_flag: Option<Arc<AtomicBool>>,
) -> TuiResult<()> {
    let event_handler = EventHandler::new();
    let (tx, rx) = mpsc::channel();
    let mut dispatcher = Dispatcher::new(context, tx.clone());

    let clock = Arc::clone(&context.clock);
    let _clock_timer = ScheduledTask::repeating(&context.runtime, "clock", context.tick_period, move || {
        tx.send(AppEvent::Tick(clock.now())).is_ok()
    });
    app.handle_event(AppEvent::Tick(context.clock.now()), Instant::now());

    let mut last_render = Instant::now();

    loop {
        if let Some(ref flag) = shutdown_flag {
            if flag.load(Ordering::SeqCst) {
                log::info!("Shutdown signal received, exiting TUI");
                app.handle_action(Action::ForceQuit);
                for command in app.take_commands() {
                    dispatcher.execute(command);
                }
                return Err(TuiError::Interrupted);
            }
        }

        while let Ok(event) = rx.try_recv() {
            app.handle_event(event, Instant::now());
        }
        app.poll(Instant::now());
        for command in app.take_commands() {
            dispatcher.execute(command);
        }

        if app.should_quit() {
            log::debug!("App requested quit");
            break;
        }

        terminal.draw(|frame| render(frame, app))?;

        if let Some(action) = event_handler.poll(POLL_TIMEOUT, app.key_context())? {
            if !app.handle_action(action) {
                log::trace!("Action not handled: {:?}", action);
            }
        }

        // Frame rate limiting
        let elapsed = last_render.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
        last_render = Instant::now();
    }

    log::info!("TUI exited normally");
    Ok(())
}

/// Set up the terminal for TUI mode.
fn setup_terminal() -> TuiResult<Terminal> {
    log::debug!("Setting up terminal for TUI");

    terminal::enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    log::debug!("Terminal setup complete");
    Ok(terminal)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> TuiResult<()> {
    log::debug!("Restoring terminal");

    let _ = terminal::disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);

    log::debug!("Terminal restored");
    Ok(())
}
