//! TUI application state management.
//!
//! # Overview
//!
//! [`App`] is the single owner of everything the interface shows: the
//! stored identity, the alarm list, the scanner, and the challenge gate of
//! a ringing alarm. It never performs I/O itself. Work that has to leave
//! the main thread (network requests, timers) is queued as [`Command`]s
//! which the runner drains with [`App::take_commands`] and executes; the
//! results come back through [`App::handle_event`].
//!
//! # Example
//!
//! ```
//! use codealarm::tui::app::{Action, App, AppSettings, Screen};
//! use codealarm::identity::IdentityStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = IdentityStore::open(dir.path().join("identity.json")).unwrap();
//! let mut app = App::new(AppSettings::default(), store);
//!
//! // Nobody is logged in yet
//! assert_eq!(app.screen(), Screen::Login);
//! app.handle_action(Action::InputChar('a'));
//! assert_eq!(app.login_input(), "a");
//! ```

use std::time::Instant;

use chrono::NaiveDateTime;

use crate::alarm::{Alarm, AlarmId, AlarmScanner, AlarmStore, AlarmTime, ScanOutcome};
use crate::challenge::{audio, ChallengeGate, CheckVerdict, GateError, GateEvent, GateTiming};
use crate::config::{AudioConfig, Config};
use crate::identity::{Identity, IdentityStore, LoginError};
use crate::service::ServiceError;

use super::theme::Theme;

/// Which full-screen view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// No identity stored; asking for a username.
    Login,
    /// Clock and alarm list.
    Main,
    /// An alarm fired and has not been dismissed.
    Ringing,
}

/// How key presses should be interpreted right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    /// Typing into the login field.
    LoginInput,
    /// Navigating the alarm list.
    Main,
    /// Typing into the add-alarm form.
    Form,
    /// The ringing screen.
    Ringing,
    /// A notice is waiting to be dismissed.
    Notice,
}

/// User action triggered by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NavigateUp,
    NavigateDown,
    /// Flip the selected alarm on or off
    ToggleAlarm,
    /// Delete the selected alarm
    RemoveAlarm,
    /// Open the add-alarm form
    OpenAddAlarm,
    Logout,
    /// "I solved a problem"
    ClaimSolved,
    /// Enter in a text field
    Submit,
    /// Esc in a text field
    Cancel,
    /// Move to the next form field
    NextField,
    InputChar(char),
    Backspace,
    /// Close the notice overlay
    DismissNotice,
    /// Any other key on the ringing screen
    Nudge,
    Quit,
    /// Ctrl+C: leave from any screen
    ForceQuit,
}

/// Why a solved count is being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountPurpose {
    /// Populate the header counter at startup or after login.
    Seed,
    /// Starting count of an alarm that just fired.
    Baseline,
    /// Decide whether a ringing alarm may stop.
    Verify,
    /// Update the counter after a dismissal.
    Refresh,
}

/// Work the runner performs on the app's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LookupUser(String),
    FetchSolvedCount {
        username: String,
        purpose: CountPurpose,
    },
    /// Start the ringing animation timer.
    StartFlicker,
    /// Stop the ringing animation timer.
    StopFlicker,
}

/// Results delivered back to the app.
#[derive(Debug)]
pub enum AppEvent {
    /// Clock tick carrying the current local time.
    Tick(NaiveDateTime),
    /// Ringing animation step.
    Flicker,
    LoginResult(Result<Identity, LoginError>),
    /// Reply to [`Command::FetchSolvedCount`] for `username`.
    SolvedCount {
        username: String,
        purpose: CountPurpose,
        result: Result<u32, ServiceError>,
    },
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A blocking message the user must dismiss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

/// Field focused in the add-alarm form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Time,
    Label,
}

/// State of the add-alarm modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmForm {
    pub time: String,
    pub label: String,
    pub focus: FormField,
    pub error: Option<String>,
}

impl AlarmForm {
    fn new(default_label: &str) -> Self {
        Self {
            time: "07:00".to_string(),
            label: default_label.to_string(),
            focus: FormField::Time,
            error: None,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Time => &mut self.time,
            FormField::Label => &mut self.label,
        }
    }

    fn validate(&self) -> Result<(AlarmTime, String), String> {
        if self.time.trim().is_empty() {
            return Err("Time is required".to_string());
        }
        let time: AlarmTime = self.time.parse().map_err(|e| format!("{e}"))?;
        let label = self.label.trim();
        if label.is_empty() {
            return Err("Label is required".to_string());
        }
        Ok((time, label.to_string()))
    }
}

/// Settings the app needs from the configuration.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub theme: Theme,
    pub default_label: String,
    pub gate_timing: GateTiming,
    pub audio: AudioConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl AppSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            theme: Theme::from_arg(config.theme),
            default_label: config.default_label.clone(),
            gate_timing: config.gate_timing(),
            audio: config.audio.clone(),
        }
    }
}

/// Longest username accepted in the login field.
const MAX_USERNAME_LEN: usize = 64;
/// Longest alarm label accepted in the form.
const MAX_LABEL_LEN: usize = 48;

/// TUI application state.
///
/// This struct is NOT thread-safe and should only be accessed from the main thread.
#[derive(Debug)]
pub struct App {
    settings: AppSettings,
    identity_store: IdentityStore,
    identity: Option<Identity>,
    now: NaiveDateTime,
    alarms: AlarmStore,
    scanner: AlarmScanner,
    gate: Option<ChallengeGate>,
    solved_count: Option<u32>,
    baseline_pending: bool,
    selected: usize,
    login_input: String,
    login_pending: bool,
    form: Option<AlarmForm>,
    notice: Option<Notice>,
    status: Option<String>,
    dismissed_sessions: usize,
    commands: Vec<Command>,
    should_quit: bool,
}

impl App {
    /// Create the app, restoring any stored identity.
    ///
    /// When someone is already logged in, a [`CountPurpose::Seed`] fetch is
    /// queued straight away.
    #[must_use]
    pub fn new(settings: AppSettings, identity_store: IdentityStore) -> Self {
        let identity = identity_store.current();
        let mut app = Self {
            settings,
            identity_store,
            identity,
            now: NaiveDateTime::default(),
            alarms: AlarmStore::new(),
            scanner: AlarmScanner::new(),
            gate: None,
            solved_count: None,
            baseline_pending: false,
            selected: 0,
            login_input: String::new(),
            login_pending: false,
            form: None,
            notice: None,
            status: None,
            dismissed_sessions: 0,
            commands: Vec::new(),
            should_quit: false,
        };
        if let Some(identity) = &app.identity {
            log::info!("Restored identity {}", identity.username);
            app.queue_count(CountPurpose::Seed);
        }
        app
    }

    // ==================== Accessors ====================

    #[must_use]
    pub fn screen(&self) -> Screen {
        if self.gate.is_some() {
            Screen::Ringing
        } else if self.identity.is_some() {
            Screen::Main
        } else {
            Screen::Login
        }
    }

    #[must_use]
    pub fn key_context(&self) -> KeyContext {
        if self.notice.is_some() {
            return KeyContext::Notice;
        }
        match self.screen() {
            Screen::Login => KeyContext::LoginInput,
            Screen::Ringing => KeyContext::Ringing,
            Screen::Main if self.form.is_some() => KeyContext::Form,
            Screen::Main => KeyContext::Main,
        }
    }

    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.settings.theme
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    #[must_use]
    pub fn alarms(&self) -> &AlarmStore {
        &self.alarms
    }

    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn selected_alarm(&self) -> Option<&Alarm> {
        self.alarms.at(self.selected)
    }

    #[must_use]
    pub fn gate(&self) -> Option<&ChallengeGate> {
        self.gate.as_ref()
    }

    #[must_use]
    pub fn ringing_label(&self) -> Option<&str> {
        self.scanner.session().map(|s| s.label.as_str())
    }

    /// Last solved count reported by the service, 0 until one arrives.
    #[must_use]
    pub fn solved_count(&self) -> u32 {
        self.solved_count.unwrap_or(0)
    }

    /// Whether the ringing alarm is still waiting for its starting count.
    #[must_use]
    pub fn is_baseline_pending(&self) -> bool {
        self.gate
            .as_ref()
            .is_some_and(|gate| gate.initial_solved_count().is_none())
    }

    /// Whether a baseline request is in flight.
    #[must_use]
    pub fn is_fetching_baseline(&self) -> bool {
        self.baseline_pending
    }

    #[must_use]
    pub fn login_input(&self) -> &str {
        &self.login_input
    }

    #[must_use]
    pub fn is_login_pending(&self) -> bool {
        self.login_pending
    }

    #[must_use]
    pub fn form(&self) -> Option<&AlarmForm> {
        self.form.as_ref()
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// One-line status shown in the footer.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Number of alarms dismissed by a verified solve.
    #[must_use]
    pub fn dismissed_sessions(&self) -> usize {
        self.dismissed_sessions
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Drain queued commands.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    // ==================== Alarm management ====================

    /// Add an alarm directly, bypassing the form.
    pub fn add_alarm(&mut self, time: AlarmTime, label: impl Into<String>) -> AlarmId {
        let alarm = self.alarms.add(time, label);
        self.selected = self.alarms.len() - 1;
        alarm.id
    }

    fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_alarm().map(|a| a.id) {
            self.alarms.toggle(id);
        }
    }

    fn remove_selected(&mut self) {
        if let Some(id) = self.selected_alarm().map(|a| a.id) {
            self.alarms.remove(id);
            self.selected = self.selected.min(self.alarms.len().saturating_sub(1));
        }
    }

    // ==================== Events ====================

    /// Apply a result or timer event.
    pub fn handle_event(&mut self, event: AppEvent, at: Instant) {
        match event {
            AppEvent::Tick(now) => self.on_tick(now),
            AppEvent::Flicker => {
                if let Some(gate) = self.gate.as_mut() {
                    gate.tick_flicker();
                }
            }
            AppEvent::LoginResult(result) => self.on_login_result(result),
            AppEvent::SolvedCount {
                username,
                purpose,
                result,
            } => self.on_solved_count(&username, purpose, result, at),
        }
    }

    fn on_tick(&mut self, now: NaiveDateTime) {
        self.now = now;
        if self.identity.is_none() {
            return;
        }

        if let ScanOutcome::Triggered(session) = self.scanner.tick(now, &self.alarms) {
            log::debug!("Ringing for alarm {}", session.alarm_id);
            let mut gate = ChallengeGate::awaiting_baseline(
                audio::from_config(&self.settings.audio),
                self.settings.gate_timing,
            );
            gate.on_enter();
            self.gate = Some(gate);
            self.form = None;
            self.notice = None;
            self.status = None;
            self.commands.push(Command::StartFlicker);
            self.request_baseline();
        }
    }

    fn request_baseline(&mut self) {
        if !self.baseline_pending {
            self.baseline_pending = true;
            self.queue_count(CountPurpose::Baseline);
        }
    }

    fn on_login_result(&mut self, result: Result<Identity, LoginError>) {
        self.login_pending = false;
        let saved = result.and_then(|identity| {
            self.identity_store.save(&identity)?;
            Ok(identity)
        });
        match saved {
            Ok(identity) => {
                self.status = Some(format!("Logged in as {}", identity.username));
                self.identity = Some(identity);
                self.login_input.clear();
                self.solved_count = None;
                self.queue_count(CountPurpose::Seed);
            }
            Err(e) => {
                log::warn!("Login failed: {}", e);
                self.notice = Some(Notice {
                    kind: NoticeKind::Error,
                    title: "Login failed".to_string(),
                    message: e.user_message(),
                });
            }
        }
    }

    fn on_solved_count(
        &mut self,
        username: &str,
        purpose: CountPurpose,
        result: Result<u32, ServiceError>,
        at: Instant,
    ) {
        if self.identity.as_ref().map(|i| i.username.as_str()) != Some(username) {
            log::debug!("Dropping {:?} count for {}: no longer logged in", purpose, username);
            return;
        }
        match purpose {
            CountPurpose::Seed | CountPurpose::Refresh => match result {
                Ok(count) => self.solved_count = Some(count),
                Err(e) => log::warn!("Could not fetch solved count: {}", e),
            },
            CountPurpose::Baseline => self.on_baseline(result),
            CountPurpose::Verify => {
                let Some(gate) = self.gate.as_mut() else {
                    log::debug!("Verification result arrived with no alarm ringing");
                    return;
                };
                match gate.complete_check(result, at) {
                    CheckVerdict::Solved { latest } | CheckVerdict::NotYetSolved { latest } => {
                        self.solved_count = Some(latest);
                    }
                    CheckVerdict::Unverified | CheckVerdict::Ignored => {}
                }
            }
        }
    }

    /// The count reported when ringing began becomes the baseline. If that
    /// fetch fails, the last count seen before the alarm stands in; with no
    /// count at all the gate keeps waiting and the next claim asks again.
    fn on_baseline(&mut self, result: Result<u32, ServiceError>) {
        self.baseline_pending = false;
        let Some(gate) = self.gate.as_mut() else {
            log::debug!("Baseline arrived with no alarm ringing");
            return;
        };
        match result {
            Ok(count) => {
                gate.set_baseline(count);
                self.solved_count = Some(count);
            }
            Err(e) => match self.solved_count {
                Some(cached) => {
                    log::warn!("Could not fetch baseline ({}); using last known count {}", e, cached);
                    gate.set_baseline(cached);
                }
                None => log::warn!("Could not fetch baseline and no count is known: {}", e),
            },
        }
    }

    /// Advance time-based state: acknowledgment windows and the sound loop.
    ///
    /// Called by the runner on every frame.
    pub fn poll(&mut self, at: Instant) {
        let Some(gate) = self.gate.as_mut() else {
            return;
        };
        match gate.poll(at) {
            Some(GateEvent::Solved) => self.finish_ringing(),
            Some(GateEvent::RejectionCleared) | None => {}
        }
    }

    fn finish_ringing(&mut self) {
        if let Some(mut gate) = self.gate.take() {
            gate.teardown();
        }
        self.baseline_pending = false;
        if self.scanner.dismiss().is_some() {
            self.dismissed_sessions += 1;
        }
        self.commands.push(Command::StopFlicker);
        self.status = Some("Problem solved! Alarm disabled.".to_string());
        self.queue_count(CountPurpose::Refresh);
    }

    fn queue_count(&mut self, purpose: CountPurpose) {
        if let Some(identity) = &self.identity {
            self.commands.push(Command::FetchSolvedCount {
                username: identity.username.clone(),
                purpose,
            });
        }
    }

    // ==================== Actions ====================

    /// Apply a user action. Returns whether it changed anything.
    pub fn handle_action(&mut self, action: Action) -> bool {
        if action == Action::ForceQuit {
            self.quit();
            return true;
        }
        match self.key_context() {
            KeyContext::Notice => self.notice_action(action),
            KeyContext::LoginInput => self.login_action(action),
            KeyContext::Form => self.form_action(action),
            KeyContext::Main => self.main_action(action),
            KeyContext::Ringing => self.ringing_action(action),
        }
    }

    fn notice_action(&mut self, action: Action) -> bool {
        match action {
            Action::DismissNotice | Action::Submit | Action::Cancel => {
                self.notice = None;
                true
            }
            _ => false,
        }
    }

    fn login_action(&mut self, action: Action) -> bool {
        if self.login_pending {
            return false;
        }
        match action {
            Action::InputChar(c) if !c.is_whitespace() => {
                if self.login_input.chars().count() < MAX_USERNAME_LEN {
                    self.login_input.push(c);
                }
                true
            }
            Action::Backspace => self.login_input.pop().is_some(),
            Action::Submit => {
                let username = self.login_input.trim().to_string();
                if username.is_empty() {
                    self.notice = Some(Notice {
                        kind: NoticeKind::Error,
                        title: "Login".to_string(),
                        message: LoginError::EmptyUsername.user_message(),
                    });
                } else {
                    self.login_pending = true;
                    self.commands.push(Command::LookupUser(username));
                }
                true
            }
            Action::Cancel => {
                self.quit();
                true
            }
            _ => false,
        }
    }

    fn form_action(&mut self, action: Action) -> bool {
        let Some(form) = self.form.as_mut() else {
            return false;
        };
        match action {
            Action::InputChar(c) => {
                let limit = match form.focus {
                    FormField::Time => 5,
                    FormField::Label => MAX_LABEL_LEN,
                };
                let field = form.focused_mut();
                if field.chars().count() < limit {
                    field.push(c);
                }
                form.error = None;
                true
            }
            Action::Backspace => {
                form.error = None;
                form.focused_mut().pop().is_some()
            }
            Action::NextField => {
                form.focus = match form.focus {
                    FormField::Time => FormField::Label,
                    FormField::Label => FormField::Time,
                };
                true
            }
            Action::Submit => {
                match form.validate() {
                    Ok((time, label)) => {
                        self.form = None;
                        self.add_alarm(time, label);
                    }
                    Err(message) => form.error = Some(message),
                }
                true
            }
            Action::Cancel => {
                self.form = None;
                true
            }
            _ => false,
        }
    }

    fn main_action(&mut self, action: Action) -> bool {
        match action {
            Action::NavigateUp => {
                self.selected = self.selected.saturating_sub(1);
                true
            }
            Action::NavigateDown => {
                if self.selected + 1 < self.alarms.len() {
                    self.selected += 1;
                }
                true
            }
            Action::ToggleAlarm => {
                self.toggle_selected();
                true
            }
            Action::RemoveAlarm => {
                self.remove_selected();
                true
            }
            Action::OpenAddAlarm => {
                self.form = Some(AlarmForm::new(&self.settings.default_label));
                true
            }
            Action::Logout => {
                self.logout();
                true
            }
            Action::Quit => {
                self.quit();
                true
            }
            _ => false,
        }
    }

    fn ringing_action(&mut self, action: Action) -> bool {
        let Some(gate) = self.gate.as_mut() else {
            return false;
        };
        gate.on_user_action();
        if action != Action::ClaimSolved {
            return false;
        }
        match gate.begin_check() {
            Ok(()) => {
                self.queue_count(CountPurpose::Verify);
                true
            }
            Err(GateError::BaselinePending) => {
                log::debug!("Solve claimed before the baseline is known");
                self.request_baseline();
                true
            }
            Err(e) => {
                log::debug!("Ignoring solve claim: {}", e);
                false
            }
        }
    }

    fn logout(&mut self) {
        if let Err(e) = self.identity_store.forget() {
            log::warn!("Could not clear stored identity: {}", e);
        }
        self.identity = None;
        self.alarms = AlarmStore::new();
        self.scanner = AlarmScanner::new();
        self.selected = 0;
        self.solved_count = None;
        self.form = None;
        self.status = None;
    }

    fn quit(&mut self) {
        if let Some(mut gate) = self.gate.take() {
            gate.teardown();
            self.commands.push(Command::StopFlicker);
        }
        self.baseline_pending = false;
        self.should_quit = true;
    }
}
