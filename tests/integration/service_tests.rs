//! HTTP client behaviour against the local mock service.

use std::time::Duration;

use codealarm::service::{HttpProgressClient, ProgressService, ServiceError};

use super::mock_service;

fn client(base_url: &str) -> HttpProgressClient {
    HttpProgressClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_lookup_known_user() {
    let mock = mock_service::start().await;
    let profile = client(&mock.base_url).lookup_user("alice").await.unwrap();
    assert_eq!(profile.avatar.as_deref(), Some("https://example.com/alice.png"));
    assert!(!profile.has_errors());
}

#[tokio::test]
async fn test_lookup_without_avatar() {
    let mock = mock_service::start().await;
    let profile = client(&mock.base_url).lookup_user("bob").await.unwrap();
    assert_eq!(profile.avatar, None);
}

#[tokio::test]
async fn test_lookup_unknown_user_is_status_error() {
    let mock = mock_service::start().await;
    let err = client(&mock.base_url).lookup_user("nobody").await.unwrap_err();
    assert!(matches!(err, ServiceError::Status(404)), "got {err:?}");
}

#[tokio::test]
async fn test_lookup_errors_payload_is_rejected() {
    let mock = mock_service::start().await;
    let err = client(&mock.base_url).lookup_user("rejected").await.unwrap_err();
    assert!(matches!(err, ServiceError::Rejected(_)), "got {err:?}");
}

#[tokio::test]
async fn test_solved_count_tracks_solves() {
    let mock = mock_service::start().await;
    let client = client(&mock.base_url);

    assert_eq!(client.solved_count("alice").await.unwrap(), 5);
    mock.state.solve("alice");
    assert_eq!(client.solved_count("alice").await.unwrap(), 6);
}

#[tokio::test]
async fn test_solved_count_missing_field_is_zero() {
    let mock = mock_service::start().await;
    assert_eq!(client(&mock.base_url).solved_count("malformed").await.unwrap(), 0);
}

#[tokio::test]
async fn test_solved_count_server_error() {
    let mock = mock_service::start().await;
    let err = client(&mock.base_url).solved_count("flaky").await.unwrap_err();
    assert!(matches!(err, ServiceError::Status(500)), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_service_is_http_error() {
    let base_url = mock_service::unreachable_base_url().await;
    let err = client(&base_url).solved_count("alice").await.unwrap_err();
    assert!(matches!(err, ServiceError::Http(_)), "got {err:?}");
}
