//! Logged-in identity.
//!
//! The only credential is a username that the progress service recognises.
//! It is kept in the on-device [`KvStore`] together with the avatar
//! reference the lookup returned, and parameterises every later request.

use std::path::PathBuf;

use thiserror::Error;

use crate::service::{ProgressService, ServiceError};
use crate::storage::{KvStore, StoreError};

const USERNAME_KEY: &str = "username";
const AVATAR_KEY: &str = "avatar";

/// The stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub avatar: Option<String>,
}

/// Why a login attempt did not produce an identity.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("username must not be empty")]
    EmptyUsername,

    /// The service did not recognise the username.
    #[error("invalid username '{username}'")]
    InvalidUsername {
        username: String,
        #[source]
        source: ServiceError,
    },

    /// The service could not be reached.
    #[error("could not reach the progress service: {0}")]
    Service(#[source] ServiceError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl LoginError {
    /// Text shown in the dismissible notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyUsername => "Please enter a username.".to_string(),
            Self::InvalidUsername { .. } => "Invalid username. Please try again.".to_string(),
            Self::Service(_) => {
                "Could not reach the progress service. Please try again.".to_string()
            }
            Self::Storage(e) => format!("Could not save your login: {e}"),
        }
    }
}

/// Identity persisted in the key-value store.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    kv: KvStore,
}

impl IdentityStore {
    #[must_use]
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Open the store file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self::new(KvStore::open(path)?))
    }

    /// The stored identity, if someone is logged in.
    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        let username = self.kv.get(USERNAME_KEY)?.trim();
        if username.is_empty() {
            return None;
        }
        Some(Identity {
            username: username.to_string(),
            avatar: self.kv.get(AVATAR_KEY).map(str::to_string),
        })
    }

    /// Persist `identity`, replacing any previous one.
    ///
    /// Username and avatar are written together; on failure the previous
    /// identity is left untouched.
    pub fn save(&mut self, identity: &Identity) -> Result<(), StoreError> {
        self.kv.update(|entries| {
            entries.insert(USERNAME_KEY.to_string(), identity.username.clone());
            match &identity.avatar {
                Some(avatar) => entries.insert(AVATAR_KEY.to_string(), avatar.clone()),
                None => entries.remove(AVATAR_KEY),
            };
        })?;
        log::info!("Logged in as {}", identity.username);
        Ok(())
    }

    /// Drop the stored identity.
    pub fn forget(&mut self) -> Result<(), StoreError> {
        self.kv.update(|entries| {
            entries.remove(USERNAME_KEY);
            entries.remove(AVATAR_KEY);
        })?;
        log::info!("Logged out");
        Ok(())
    }
}

/// Ask the service whether `username` exists.
///
/// Nothing is persisted; see [`login`] for the full flow.
pub async fn verify_username(
    service: &dyn ProgressService,
    username: &str,
) -> Result<Identity, LoginError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(LoginError::EmptyUsername);
    }

    match service.lookup_user(username).await {
        Ok(profile) => Ok(Identity {
            username: username.to_string(),
            avatar: profile.avatar,
        }),
        Err(source @ (ServiceError::Http(_) | ServiceError::InvalidBaseUrl(_))) => {
            log::warn!("User lookup for {} failed: {}", username, source);
            Err(LoginError::Service(source))
        }
        Err(source) => {
            log::info!("User lookup rejected {}: {}", username, source);
            Err(LoginError::InvalidUsername {
                username: username.to_string(),
                source,
            })
        }
    }
}

/// Verify `username` with the service and persist it on success.
pub async fn login(
    service: &dyn ProgressService,
    store: &mut IdentityStore,
    username: &str,
) -> Result<Identity, LoginError> {
    let identity = verify_username(service, username).await?;
    store.save(&identity)?;
    Ok(identity)
}
