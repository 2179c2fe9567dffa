//! Local stand-in for the progress service.
//!
//! Known users:
//! - `alice`: solved count starts at 5
//! - `bob`: solved count 1, no avatar
//! - `flaky`: lookup succeeds, solved count answers 500
//! - `malformed`: solved count body has no `solvedProblem` field
//! - `rejected`: lookup answers 200 with an `errors` payload
//!
//! Anyone else gets a 404.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Clone, Default)]
pub struct MockState {
    counts: Arc<Mutex<HashMap<String, u32>>>,
}

impl MockState {
    /// Record one more solved problem for `username`.
    pub fn solve(&self, username: &str) {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(username.to_string())
            .or_default() += 1;
    }
}

pub struct MockService {
    pub base_url: String,
    pub state: MockState,
}

async fn lookup(Path(username): Path<String>) -> (StatusCode, Json<Value>) {
    match username.as_str() {
        "alice" => (
            StatusCode::OK,
            Json(json!({ "username": "alice", "avatar": "https://example.com/alice.png" })),
        ),
        "bob" | "flaky" | "malformed" => (StatusCode::OK, Json(json!({ "username": username.clone() }))),
        "rejected" => (
            StatusCode::OK,
            Json(json!({ "errors": [{ "message": "That user does not exist." }] })),
        ),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))),
    }
}

async fn solved(
    State(state): State<MockState>,
    Path(username): Path<String>,
) -> (StatusCode, Json<Value>) {
    match username.as_str() {
        "flaky" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        "malformed" => (StatusCode::OK, Json(json!({ "totalSolved": 12 }))),
        _ => {
            let counts = state.counts.lock().unwrap();
            let count = counts.get(&username).copied().unwrap_or(0);
            (StatusCode::OK, Json(json!({ "solvedProblem": count })))
        }
    }
}

/// Start the mock on an ephemeral port. Must run inside a tokio runtime.
pub async fn start() -> MockService {
    let state = MockState::default();
    state.counts.lock().unwrap().insert("alice".to_string(), 5);
    state.counts.lock().unwrap().insert("bob".to_string(), 1);

    let app = Router::new()
        .route("/{username}", get(lookup))
        .route("/{username}/solved", get(solved))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockService {
        base_url: format!("http://{addr}"),
        state,
    }
}

/// A base URL nothing is listening on.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
