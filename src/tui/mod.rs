//! Terminal User Interface module.
//!
//! This module provides the interactive alarm clock using ratatui with the
//! crossterm backend.
//!
//! # Overview
//!
//! The TUI module consists of:
//! - [`app`]: Application state (screens, alarms, the ringing gate)
//! - [`events`]: Keyboard event handling
//! - [`ui`]: Ratatui rendering
//! - [`run`]: Terminal setup and the main loop
//! - [`theme`]: Color palettes
//!
//! # Architecture
//!
//! The TUI follows a unidirectional data flow:
//! 1. Events are captured from the terminal (crossterm) and from timers and
//!    network tasks (tokio)
//! 2. Key presses are translated to Actions
//! 3. Actions and events modify the App state, which queues Commands
//! 4. The runner executes Commands; the UI renders the App state
//!
//! # Example
//!
//! ```
//! use codealarm::alarm::AlarmTime;
//! use codealarm::identity::{Identity, IdentityStore};
//! use codealarm::tui::{Action, App, AppSettings};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut store = IdentityStore::open(dir.path().join("identity.json")).unwrap();
//! store.save(&Identity { username: "alice".into(), avatar: None }).unwrap();
//!
//! let mut app = App::new(AppSettings::default(), store);
//! app.add_alarm(AlarmTime::new(7, 0).unwrap(), "Morning Challenge");
//!
//! app.handle_action(Action::ToggleAlarm);
//! assert!(!app.alarms().at(0).unwrap().is_active);
//! ```

pub mod app;
pub mod events;
pub mod run;
pub mod theme;
pub mod ui;

pub use app::{Action, App, AppEvent, AppSettings, Command, CountPurpose, KeyContext, Screen};
pub use events::{EventError, EventHandler};
pub use run::{run_tui, Dispatcher, RunContext, TuiError, TuiResult};
pub use theme::Theme;
pub use ui::render;
