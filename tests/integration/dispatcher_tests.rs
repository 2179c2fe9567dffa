//! Commands executed on the runtime report back over the event channel.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use codealarm::clock::SystemClock;
use codealarm::service::HttpProgressClient;
use codealarm::tui::{AppEvent, Command, CountPurpose, Dispatcher, RunContext};

use super::mock_service;

fn context(base_url: &str) -> RunContext {
    RunContext {
        service: Arc::new(HttpProgressClient::new(base_url, Duration::from_secs(5)).unwrap()),
        clock: Arc::new(SystemClock),
        runtime: tokio::runtime::Handle::current(),
        tick_period: Duration::from_secs(1),
        flicker_period: Duration::from_millis(20),
    }
}

/// Wait for the next event without blocking a runtime worker.
async fn next_event(rx: Receiver<AppEvent>) -> (AppEvent, Receiver<AppEvent>) {
    tokio::task::spawn_blocking(move || {
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        (event, rx)
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lookup_reports_login_result() {
    let mock = mock_service::start().await;
    let (tx, rx) = mpsc::channel();
    let mut dispatcher = Dispatcher::new(&context(&mock.base_url), tx);

    dispatcher.execute(Command::LookupUser("alice".to_string()));
    let (event, _rx) = next_event(rx).await;
    match event {
        AppEvent::LoginResult(Ok(identity)) => assert_eq!(identity.username, "alice"),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fetch_reports_count_with_purpose() {
    let mock = mock_service::start().await;
    let (tx, rx) = mpsc::channel();
    let mut dispatcher = Dispatcher::new(&context(&mock.base_url), tx);

    dispatcher.execute(Command::FetchSolvedCount {
        username: "alice".to_string(),
        purpose: CountPurpose::Verify,
    });
    let (event, _rx) = next_event(rx).await;
    match event {
        AppEvent::SolvedCount {
            username,
            purpose,
            result,
        } => {
            assert_eq!(username, "alice");
            assert_eq!(purpose, CountPurpose::Verify);
            assert_eq!(result.unwrap(), 5);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_flicker_timer_lifecycle() {
    let mock = mock_service::start().await;
    let (tx, rx) = mpsc::channel();
    let mut dispatcher = Dispatcher::new(&context(&mock.base_url), tx);

    dispatcher.execute(Command::StartFlicker);
    assert!(dispatcher.is_flickering());
    let (event, rx) = next_event(rx).await;
    assert!(matches!(event, AppEvent::Flicker));

    dispatcher.execute(Command::StopFlicker);
    assert!(!dispatcher.is_flickering());

    // Drain whatever was already in flight, then expect silence
    tokio::time::sleep(Duration::from_millis(50)).await;
    while rx.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
}
