//! End-to-end alarm sessions driven through the app controller.

use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use codealarm::challenge::GatePhase;
use codealarm::identity::{Identity, IdentityStore};
use codealarm::service::ServiceError;
use codealarm::tui::app::{Action, App, AppEvent, AppSettings, Command, CountPurpose, Screen};
use tempfile::TempDir;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn next_day(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 16)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// Logged-in app whose startup fetch returned `seed`, commands drained.
fn app_with_seed(seed: Result<u32, ServiceError>) -> (App, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut store = IdentityStore::open(dir.path().join("identity.json")).unwrap();
    store
        .save(&Identity {
            username: "alice".to_string(),
            avatar: None,
        })
        .unwrap();
    let mut settings = AppSettings::default();
    settings.audio.enabled = false;
    let mut app = App::new(settings, store);
    app.take_commands();
    count(&mut app, CountPurpose::Seed, seed, Instant::now());
    (app, dir)
}

fn seeded_app(count: u32) -> (App, TempDir) {
    app_with_seed(Ok(count))
}

fn count(app: &mut App, purpose: CountPurpose, result: Result<u32, ServiceError>, at: Instant) {
    app.handle_event(
        AppEvent::SolvedCount {
            username: "alice".to_string(),
            purpose,
            result,
        },
        at,
    );
}

fn tick(app: &mut App, now: NaiveDateTime) {
    app.handle_event(AppEvent::Tick(now), Instant::now());
}

/// Fire the alarm at `now` and answer its baseline request with `baseline`.
fn ring(app: &mut App, now: NaiveDateTime, baseline: u32) {
    tick(app, now);
    count(app, CountPurpose::Baseline, Ok(baseline), Instant::now());
}

fn verify(app: &mut App, result: Result<u32, ServiceError>, at: Instant) {
    count(app, CountPurpose::Verify, result, at);
}

fn fetch(purpose: CountPurpose) -> Command {
    Command::FetchSolvedCount {
        username: "alice".to_string(),
        purpose,
    }
}

fn verify_command() -> Command {
    fetch(CountPurpose::Verify)
}

#[test]
fn test_solve_dismisses_alarm() {
    let (mut app, _dir) = seeded_app(5);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");

    tick(&mut app, at(6, 59, 59));
    assert_eq!(app.screen(), Screen::Main);

    tick(&mut app, at(7, 0, 0));
    assert_eq!(app.screen(), Screen::Ringing);
    assert_eq!(app.ringing_label(), Some("Morning Challenge"));
    assert_eq!(
        app.take_commands(),
        vec![Command::StartFlicker, fetch(CountPurpose::Baseline)]
    );
    assert_eq!(app.gate().unwrap().initial_solved_count(), None);

    count(&mut app, CountPurpose::Baseline, Ok(5), Instant::now());
    assert_eq!(app.gate().unwrap().initial_solved_count(), Some(5));

    // Still ringing later in the minute, with no second trigger
    tick(&mut app, at(7, 0, 59));
    assert_eq!(app.screen(), Screen::Ringing);
    assert!(app.take_commands().is_empty());

    app.handle_action(Action::ClaimSolved);
    assert_eq!(app.take_commands(), vec![verify_command()]);

    let start = Instant::now();
    verify(&mut app, Ok(6), start);
    assert!(matches!(app.gate().unwrap().phase(), GatePhase::Solved { .. }));
    assert_eq!(app.solved_count(), 6);

    // The success overlay stays up for its full window
    app.poll(start + Duration::from_millis(1_000));
    assert_eq!(app.screen(), Screen::Ringing);

    app.poll(start + Duration::from_millis(1_500));
    assert_eq!(app.screen(), Screen::Main);
    assert_eq!(app.dismissed_sessions(), 1);
    assert_eq!(
        app.take_commands(),
        vec![Command::StopFlicker, fetch(CountPurpose::Refresh)]
    );

    // The alarm stays configured for tomorrow
    assert!(app.alarms().at(0).unwrap().is_active);
}

#[test]
fn test_unchanged_count_keeps_ringing() {
    let (mut app, _dir) = seeded_app(5);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    ring(&mut app, at(7, 0, 0), 5);
    app.take_commands();

    app.handle_action(Action::ClaimSolved);
    app.take_commands();
    let start = Instant::now();
    verify(&mut app, Ok(5), start);
    assert!(matches!(app.gate().unwrap().phase(), GatePhase::Rejected { .. }));

    // Claims during the rejection window do nothing
    app.handle_action(Action::ClaimSolved);
    assert!(app.take_commands().is_empty());

    app.poll(start + Duration::from_millis(2_999));
    assert!(matches!(app.gate().unwrap().phase(), GatePhase::Rejected { .. }));
    app.poll(start + Duration::from_millis(3_000));
    assert_eq!(app.gate().unwrap().phase(), GatePhase::Ringing);
    assert_eq!(app.screen(), Screen::Ringing);

    // The next claim is accepted
    app.handle_action(Action::ClaimSolved);
    assert_eq!(app.take_commands(), vec![verify_command()]);
}

#[test]
fn test_failed_verification_reads_as_not_solved() {
    let (mut app, _dir) = seeded_app(5);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    ring(&mut app, at(7, 0, 0), 5);

    app.handle_action(Action::ClaimSolved);
    verify(&mut app, Err(ServiceError::Status(503)), Instant::now());

    assert!(matches!(app.gate().unwrap().phase(), GatePhase::Rejected { .. }));
    assert_eq!(app.solved_count(), 5);
}

#[test]
fn test_double_claim_sends_one_request() {
    let (mut app, _dir) = seeded_app(5);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    ring(&mut app, at(7, 0, 0), 5);
    app.take_commands();

    app.handle_action(Action::ClaimSolved);
    app.handle_action(Action::ClaimSolved);
    assert_eq!(app.take_commands(), vec![verify_command()]);
}

#[test]
fn test_quit_ignored_while_ringing() {
    let (mut app, _dir) = seeded_app(5);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    tick(&mut app, at(7, 0, 0));

    app.handle_action(Action::Quit);
    app.handle_action(Action::Cancel);
    assert!(!app.should_quit());
    assert_eq!(app.screen(), Screen::Ringing);
}

#[test]
fn test_force_quit_tears_down_ringing() {
    let (mut app, _dir) = seeded_app(5);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    tick(&mut app, at(7, 0, 0));
    app.take_commands();

    app.handle_action(Action::ForceQuit);
    assert!(app.should_quit());
    assert!(app.gate().is_none());
    assert_eq!(app.take_commands(), vec![Command::StopFlicker]);
}

#[test]
fn test_inactive_alarm_never_fires() {
    let (mut app, _dir) = seeded_app(0);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    app.handle_action(Action::ToggleAlarm);

    for s in 0..60 {
        tick(&mut app, at(7, 0, s));
    }
    assert_eq!(app.screen(), Screen::Main);
}

#[test]
fn test_no_refire_in_dismissed_minute_but_fires_next_day() {
    let (mut app, _dir) = seeded_app(5);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    ring(&mut app, at(7, 0, 0), 5);
    app.handle_action(Action::ClaimSolved);
    let start = Instant::now();
    verify(&mut app, Ok(6), start);
    app.poll(start + Duration::from_secs(2));
    assert_eq!(app.screen(), Screen::Main);

    tick(&mut app, at(7, 0, 30));
    assert_eq!(app.screen(), Screen::Main);

    ring(&mut app, next_day(7, 0, 0), 6);
    assert_eq!(app.screen(), Screen::Ringing);
    assert_eq!(app.gate().unwrap().initial_solved_count(), Some(6));
}

#[test]
fn test_first_matching_alarm_wins() {
    let (mut app, _dir) = seeded_app(1);
    app.add_alarm("07:00".parse().unwrap(), "First");
    app.add_alarm("07:00".parse().unwrap(), "Second");

    tick(&mut app, at(7, 0, 0));
    assert_eq!(app.ringing_label(), Some("First"));
}

#[test]
fn test_alarm_fires_while_form_open() {
    let (mut app, _dir) = seeded_app(1);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    app.handle_action(Action::OpenAddAlarm);
    assert!(app.form().is_some());

    tick(&mut app, at(7, 0, 0));
    assert_eq!(app.screen(), Screen::Ringing);
    assert!(app.form().is_none());
}

#[test]
fn test_logged_out_app_does_not_scan() {
    let dir = TempDir::new().unwrap();
    let store = IdentityStore::open(dir.path().join("identity.json")).unwrap();
    let mut app = App::new(AppSettings::default(), store);

    tick(&mut app, at(7, 0, 0));
    assert_eq!(app.screen(), Screen::Login);
    assert_eq!(app.now(), at(7, 0, 0));
}

#[test]
fn test_add_alarm_through_form() {
    let (mut app, _dir) = seeded_app(0);
    app.handle_action(Action::OpenAddAlarm);

    // Replace 07:00 with 06:45
    for _ in 0..5 {
        app.handle_action(Action::Backspace);
    }
    for c in "06:45".chars() {
        app.handle_action(Action::InputChar(c));
    }
    app.handle_action(Action::NextField);
    app.handle_action(Action::InputChar('!'));
    app.handle_action(Action::Submit);

    assert!(app.form().is_none());
    let alarm = app.alarms().at(0).unwrap();
    assert_eq!(alarm.time.to_string(), "06:45");
    assert_eq!(alarm.label, "Morning Challenge!");
    assert!(alarm.is_active);
}

#[test]
fn test_form_rejects_bad_input() {
    let (mut app, _dir) = seeded_app(0);
    app.handle_action(Action::OpenAddAlarm);
    for _ in 0..5 {
        app.handle_action(Action::Backspace);
    }
    for c in "25:00".chars() {
        app.handle_action(Action::InputChar(c));
    }
    app.handle_action(Action::Submit);
    assert!(app.form().unwrap().error.is_some());
    assert!(app.alarms().is_empty());

    // Empty label
    for _ in 0..5 {
        app.handle_action(Action::Backspace);
    }
    for c in "07:15".chars() {
        app.handle_action(Action::InputChar(c));
    }
    app.handle_action(Action::NextField);
    for _ in 0..40 {
        app.handle_action(Action::Backspace);
    }
    app.handle_action(Action::Submit);
    assert_eq!(app.form().unwrap().error.as_deref(), Some("Label is required"));

    app.handle_action(Action::Cancel);
    assert!(app.form().is_none());
    assert!(app.alarms().is_empty());
}

#[test]
fn test_failed_startup_fetch_still_needs_new_solve() {
    let (mut app, _dir) = app_with_seed(Err(ServiceError::Status(503)));
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");

    tick(&mut app, at(7, 0, 0));
    assert_eq!(
        app.take_commands(),
        vec![Command::StartFlicker, fetch(CountPurpose::Baseline)]
    );

    // A claim before the baseline arrives sends nothing new
    app.handle_action(Action::ClaimSolved);
    assert!(app.take_commands().is_empty());
    assert_eq!(app.gate().unwrap().phase(), GatePhase::Ringing);

    count(&mut app, CountPurpose::Baseline, Ok(42), Instant::now());
    app.handle_action(Action::ClaimSolved);
    assert_eq!(app.take_commands(), vec![verify_command()]);

    let start = Instant::now();
    verify(&mut app, Ok(42), start);
    app.poll(start + Duration::from_secs(5));
    assert_eq!(app.screen(), Screen::Ringing);
    assert_eq!(app.dismissed_sessions(), 0);
}

#[test]
fn test_solve_before_alarm_does_not_count() {
    let (mut app, _dir) = seeded_app(5);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");

    // Solved three problems the evening before
    ring(&mut app, at(7, 0, 0), 8);
    app.handle_action(Action::ClaimSolved);
    verify(&mut app, Ok(8), Instant::now());
    assert!(matches!(app.gate().unwrap().phase(), GatePhase::Rejected { .. }));
}

#[test]
fn test_baseline_failure_uses_last_known_count() {
    let (mut app, _dir) = seeded_app(5);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    tick(&mut app, at(7, 0, 0));
    count(
        &mut app,
        CountPurpose::Baseline,
        Err(ServiceError::Status(502)),
        Instant::now(),
    );
    assert_eq!(app.gate().unwrap().initial_solved_count(), Some(5));
}

#[test]
fn test_baseline_retried_when_no_count_is_known() {
    let (mut app, _dir) = app_with_seed(Err(ServiceError::Status(503)));
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    tick(&mut app, at(7, 0, 0));
    app.take_commands();

    count(
        &mut app,
        CountPurpose::Baseline,
        Err(ServiceError::Status(503)),
        Instant::now(),
    );
    assert!(app.is_baseline_pending());
    assert!(!app.is_fetching_baseline());

    app.handle_action(Action::ClaimSolved);
    assert_eq!(app.take_commands(), vec![fetch(CountPurpose::Baseline)]);
    assert!(app.is_fetching_baseline());

    count(&mut app, CountPurpose::Baseline, Ok(3), Instant::now());
    assert!(!app.is_baseline_pending());
    app.handle_action(Action::ClaimSolved);
    assert_eq!(app.take_commands(), vec![verify_command()]);
}
