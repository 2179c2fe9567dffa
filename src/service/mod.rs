//! External progress service.
//!
//! The service resolves usernames and reports how many problems a user has
//! solved. Everything that decides whether a problem was really solved lives
//! behind it; this module only describes the contract ([`ProgressService`])
//! and ships the HTTP implementation ([`HttpProgressClient`]).

pub mod client;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{HttpProgressClient, DEFAULT_BASE_URL};
pub use types::{parse_solved_count, UserProfile};

/// Failure talking to the progress service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport failure, timeout, or a body that could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// The payload carried an application-level error.
    #[error("service rejected user '{0}'")]
    Rejected(String),

    /// The body was not the JSON we expected.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL cannot have paths appended.
    #[error("invalid service base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Contract of the external progress service.
#[async_trait]
pub trait ProgressService: Send + Sync {
    /// Resolve a username. Fails for unknown users.
    async fn lookup_user(&self, username: &str) -> Result<UserProfile, ServiceError>;

    /// Cumulative number of problems the user has solved.
    async fn solved_count(&self, username: &str) -> Result<u32, ServiceError>;
}
