//! Payloads returned by the progress service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ServiceError;

/// Response of the user lookup endpoint.
///
/// Only the avatar is used; the service returns a richer profile that is
/// ignored here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UserProfile {
    #[serde(default)]
    pub avatar: Option<String>,
    /// Present when the service could not resolve the username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl UserProfile {
    /// Whether the payload carries an application-level error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        match &self.errors {
            None | Some(Value::Null) => false,
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }
}

/// Extract `solvedProblem` from a solved-count response body.
///
/// A body that is not JSON is an error. A JSON body whose field is
/// missing, negative or not an integer counts as zero.
pub fn parse_solved_count(body: &str) -> Result<u32, ServiceError> {
    let value: Value = serde_json::from_str(body)?;
    let count = value
        .get("solvedProblem")
        .and_then(Value::as_u64)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0);
    Ok(count)
}
