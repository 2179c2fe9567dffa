//! Structured error handling and exit codes.

use serde::Serialize;

use crate::identity::LoginError;
use crate::service::ServiceError;

/// Exit codes for the codealarm application.
///
/// - 0: Success
/// - 1: General error (unexpected failure)
/// - 2: Not logged in (a subcommand needed a stored username)
/// - 3: Service unavailable or rejected the request
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed normally.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No identity is stored.
    NotLoggedIn = 2,
    /// The progress service failed or refused the request.
    ServiceUnavailable = 3,
    /// Interrupted: the run was stopped by a signal.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "CA000",
            Self::GeneralError => "CA001",
            Self::NotLoggedIn => "CA002",
            Self::ServiceUnavailable => "CA003",
            Self::Interrupted => "CA130",
        }
    }

    /// Pick the exit code for an error bubbling out of [`crate::run_app`].
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<NotLoggedIn>().is_some() {
            Self::NotLoggedIn
        } else if err.downcast_ref::<ServiceError>().is_some()
            || err.downcast_ref::<LoginError>().is_some_and(|e| {
                matches!(e, LoginError::InvalidUsername { .. } | LoginError::Service(_))
            })
        {
            Self::ServiceUnavailable
        } else {
            Self::GeneralError
        }
    }
}

/// Raised by subcommands that need a stored identity.
#[derive(Debug, thiserror::Error)]
#[error("not logged in; run `codealarm login <USERNAME>` first")]
pub struct NotLoggedIn;

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "CA001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
