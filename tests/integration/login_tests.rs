//! Login, logout and identity persistence.

use std::time::{Duration, Instant};

use codealarm::identity::{self, IdentityStore, LoginError};
use codealarm::service::HttpProgressClient;
use codealarm::tui::app::{Action, App, AppEvent, AppSettings, Command, CountPurpose, Screen};
use tempfile::TempDir;

use super::mock_service;

fn client(base_url: &str) -> HttpProgressClient {
    HttpProgressClient::new(base_url, Duration::from_secs(5)).unwrap()
}

fn store_in(dir: &TempDir) -> IdentityStore {
    IdentityStore::open(dir.path().join("identity.json")).unwrap()
}

#[tokio::test]
async fn test_login_persists_identity() {
    let mock = mock_service::start().await;
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);

    let identity = identity::login(&client(&mock.base_url), &mut store, "  alice ")
        .await
        .unwrap();
    assert_eq!(identity.username, "alice");

    // A fresh handle sees the saved identity
    let reopened = store_in(&dir).current().unwrap();
    assert_eq!(reopened.username, "alice");
    assert_eq!(reopened.avatar.as_deref(), Some("https://example.com/alice.png"));
}

#[tokio::test]
async fn test_login_unknown_user_not_persisted() {
    let mock = mock_service::start().await;
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);

    let err = identity::login(&client(&mock.base_url), &mut store, "alicee")
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::InvalidUsername { .. }), "got {err:?}");
    assert_eq!(err.user_message(), "Invalid username. Please try again.");
    assert!(store_in(&dir).current().is_none());
}

#[tokio::test]
async fn test_login_errors_payload_not_persisted() {
    let mock = mock_service::start().await;
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);

    let err = identity::login(&client(&mock.base_url), &mut store, "rejected")
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::InvalidUsername { .. }), "got {err:?}");
    assert!(store.current().is_none());
}

#[tokio::test]
async fn test_login_unreachable_service() {
    let base_url = mock_service::unreachable_base_url().await;
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);

    let err = identity::login(&client(&base_url), &mut store, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::Service(_)), "got {err:?}");
    assert!(store.current().is_none());
}

#[tokio::test]
async fn test_login_replaces_previous_identity() {
    let mock = mock_service::start().await;
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);
    let client = client(&mock.base_url);

    identity::login(&client, &mut store, "alice").await.unwrap();
    identity::login(&client, &mut store, "bob").await.unwrap();

    let current = store_in(&dir).current().unwrap();
    assert_eq!(current.username, "bob");
    assert_eq!(current.avatar, None);
}

// =============================================================================
// Login through the app
// =============================================================================

fn app_in(dir: &TempDir) -> App {
    let mut settings = AppSettings::default();
    settings.audio.enabled = false;
    App::new(settings, store_in(dir))
}

#[tokio::test]
async fn test_app_login_flow() {
    let mock = mock_service::start().await;
    let dir = TempDir::new().unwrap();
    let mut app = app_in(&dir);
    assert_eq!(app.screen(), Screen::Login);
    assert!(app.take_commands().is_empty());

    for c in "alice".chars() {
        app.handle_action(Action::InputChar(c));
    }
    app.handle_action(Action::Submit);
    assert!(app.is_login_pending());
    let commands = app.take_commands();
    assert_eq!(commands, vec![Command::LookupUser("alice".to_string())]);

    // Keys are ignored while the lookup is outstanding
    app.handle_action(Action::InputChar('x'));
    assert_eq!(app.login_input(), "alice");

    let result = identity::verify_username(&client(&mock.base_url), "alice").await;
    app.handle_event(AppEvent::LoginResult(result), Instant::now());

    assert_eq!(app.screen(), Screen::Main);
    assert_eq!(app.identity().unwrap().username, "alice");
    assert_eq!(store_in(&dir).current().unwrap().username, "alice");
    assert_eq!(
        app.take_commands(),
        vec![Command::FetchSolvedCount {
            username: "alice".to_string(),
            purpose: CountPurpose::Seed,
        }]
    );
}

#[tokio::test]
async fn test_app_login_failure_shows_notice() {
    let mock = mock_service::start().await;
    let dir = TempDir::new().unwrap();
    let mut app = app_in(&dir);

    for c in "alice_typo".chars() {
        app.handle_action(Action::InputChar(c));
    }
    app.handle_action(Action::Submit);
    let result = identity::verify_username(&client(&mock.base_url), "alice_typo").await;
    app.handle_event(AppEvent::LoginResult(result), Instant::now());

    assert_eq!(app.screen(), Screen::Login);
    assert!(!app.is_login_pending());
    let notice = app.notice().unwrap();
    assert_eq!(notice.message, "Invalid username. Please try again.");
    assert!(store_in(&dir).current().is_none());

    // Dismiss and try again with the text still there
    app.handle_action(Action::DismissNotice);
    assert!(app.notice().is_none());
    assert_eq!(app.login_input(), "alice_typo");
}

#[test]
fn test_app_empty_username() {
    let dir = TempDir::new().unwrap();
    let mut app = app_in(&dir);

    app.handle_action(Action::InputChar(' '));
    app.handle_action(Action::Submit);

    assert!(app.take_commands().is_empty());
    assert_eq!(app.notice().unwrap().message, "Please enter a username.");
}

#[test]
fn test_app_logout_clears_everything() {
    let dir = TempDir::new().unwrap();
    let mut store = store_in(&dir);
    store
        .save(&identity::Identity {
            username: "alice".to_string(),
            avatar: None,
        })
        .unwrap();

    let mut app = app_in(&dir);
    app.add_alarm("07:00".parse().unwrap(), "Morning Challenge");
    app.handle_event(
        AppEvent::SolvedCount {
            username: "alice".to_string(),
            purpose: CountPurpose::Seed,
            result: Ok(5),
        },
        Instant::now(),
    );

    app.handle_action(Action::Logout);
    assert_eq!(app.screen(), Screen::Login);
    assert!(app.alarms().is_empty());
    assert_eq!(app.solved_count(), 0);
    assert!(store_in(&dir).current().is_none());
}
