use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use super::store::{SessionToken, StoreError, User, UserStore};

/// Sign-up form; field names follow the registration page.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub psw: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

/// Sign-in form.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub psw: String,
}

/// Authenticated session handed back to the caller.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub user: User,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("username '{0}' is already registered")]
    UsernameTaken(String),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Registration, login and session lookup over a [`UserStore`].
pub struct AccountService<U> {
    store: Arc<U>,
}

impl<U> AccountService<U>
where
    U: UserStore + 'static,
{
    pub fn new(store: Arc<U>) -> Self {
        Self { store }
    }

    /// Create the user and log them in straight away.
    pub fn register(&self, registration: Registration) -> Result<Session, AccountError> {
        let username = registration.username.trim().to_string();
        if username.is_empty() {
            return Err(AccountError::InvalidInput("username is required"));
        }
        if registration.psw.is_empty() {
            return Err(AccountError::InvalidInput("password is required"));
        }

        let user = User {
            username: username.clone(),
            first_name: registration.firstname.trim().to_string(),
            last_name: registration.lastname.trim().to_string(),
            password_hash: hash_password(&registration.psw),
        };

        let user = match self.store.insert(user) {
            Ok(user) => user,
            Err(StoreError::Conflict) => {
                info!(%username, "registration rejected, user exists");
                return Err(AccountError::UsernameTaken(username));
            }
            Err(other) => return Err(other.into()),
        };

        info!(%username, "new user registered");
        self.open_session(user)
    }

    pub fn login(&self, credentials: Credentials) -> Result<Session, AccountError> {
        let username = credentials.username.trim();
        let user = self
            .store
            .find(username)?
            .filter(|user| verify_password(&credentials.psw, &user.password_hash));

        match user {
            Some(user) => self.open_session(user),
            None => {
                warn!(%username, "failed login attempt");
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    /// Ends the session; unknown tokens are ignored.
    pub fn logout(&self, token: &SessionToken) -> Result<(), AccountError> {
        if self.store.close_session(token)? {
            info!("user logged out");
        }
        Ok(())
    }

    pub fn authenticate(&self, token: &SessionToken) -> Result<Option<User>, AccountError> {
        match self.store.session_user(token)? {
            Some(username) => Ok(self.store.find(&username)?),
            None => Ok(None),
        }
    }

    /// Lifetime of a login, used for the session cookie's `Max-Age`.
    pub fn session_ttl(&self) -> Duration {
        self.store.session_ttl()
    }

    fn open_session(&self, user: User) -> Result<Session, AccountError> {
        let token = SessionToken(Uuid::new_v4().simple().to_string());
        self.store.open_session(token.clone(), &user.username)?;
        Ok(Session { token, user })
    }
}
