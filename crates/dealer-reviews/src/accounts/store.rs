use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_SESSION_TTL;

/// Registered site user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl User {
    /// Name shown on posted reviews.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Opaque session token issued at login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

/// Storage abstraction for users and their sessions.
///
/// Sessions expire `session_ttl` after they are opened; expired tokens never
/// resolve to a user.
pub trait UserStore: Send + Sync {
    fn insert(&self, user: User) -> Result<User, StoreError>;
    fn find(&self, username: &str) -> Result<Option<User>, StoreError>;
    fn open_session(&self, token: SessionToken, username: &str) -> Result<(), StoreError>;
    fn session_user(&self, token: &SessionToken) -> Result<Option<String>, StoreError>;
    fn close_session(&self, token: &SessionToken) -> Result<bool, StoreError>;
    fn session_ttl(&self) -> Duration;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user already exists")]
    Conflict,
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug)]
struct SessionEntry {
    username: String,
    issued_at: Instant,
}

#[derive(Debug, Default)]
struct Accounts {
    users: HashMap<String, User>,
    sessions: HashMap<SessionToken, SessionEntry>,
}

#[derive(Debug, Clone)]
pub struct InMemoryUserStore {
    inner: Arc<Mutex<Accounts>>,
    session_ttl: Duration,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::with_session_ttl(DEFAULT_SESSION_TTL)
    }
}

impl InMemoryUserStore {
    pub fn with_session_ttl(session_ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            session_ttl,
        }
    }

    fn expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.issued_at) >= self.session_ttl
    }

    fn with<T>(&self, f: impl FnOnce(&mut Accounts) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("user store mutex poisoned".to_string()))?;
        f(&mut guard)
    }
}

impl UserStore for InMemoryUserStore {
    fn insert(&self, user: User) -> Result<User, StoreError> {
        self.with(|accounts| {
            if accounts.users.contains_key(&user.username) {
                return Err(StoreError::Conflict);
            }
            accounts.users.insert(user.username.clone(), user.clone());
            Ok(user)
        })
    }

    fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.with(|accounts| Ok(accounts.users.get(username).cloned()))
    }

    fn open_session(&self, token: SessionToken, username: &str) -> Result<(), StoreError> {
        let now = Instant::now();
        self.with(|accounts| {
            let before = accounts.sessions.len();
            accounts
                .sessions
                .retain(|_, entry| !self.expired(entry, now));
            let pruned = before - accounts.sessions.len();
            if pruned > 0 {
                debug!(pruned, "expired sessions pruned");
            }

            accounts.sessions.insert(
                token,
                SessionEntry {
                    username: username.to_string(),
                    issued_at: now,
                },
            );
            Ok(())
        })
    }

    fn session_user(&self, token: &SessionToken) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        self.with(|accounts| {
            let stale = match accounts.sessions.get(token) {
                Some(entry) if !self.expired(entry, now) => {
                    return Ok(Some(entry.username.clone()));
                }
                Some(_) => true,
                None => false,
            };
            if stale {
                accounts.sessions.remove(token);
            }
            Ok(None)
        })
    }

    fn close_session(&self, token: &SessionToken) -> Result<bool, StoreError> {
        self.with(|accounts| Ok(accounts.sessions.remove(token).is_some()))
    }

    fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}
