//! Account placeholder store.
//!
//! Holds users in memory behind the [`UserRepository`] trait so a database
//! backend can replace it without touching callers. No HTTP route uses it.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::Utc;
use domain::User;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    #[error("invalid user: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("username '{0}' is already taken")]
    Duplicate(String),

    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("lock poisoned")]
    Poisoned,
}

impl From<argon2::password_hash::Error> for DatastoreError {
    fn from(err: argon2::password_hash::Error) -> Self {
        DatastoreError::Hash(err)
    }
}

/// Input for [`UserRepository::add_user`]
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Repository trait for data access abstraction
pub trait UserRepository: Send + Sync {
    /// Validate, hash the password and store a new user
    fn add_user(&self, user: NewUser) -> Result<User, DatastoreError>;

    fn get_user(&self, username: &str) -> Result<Option<User>, DatastoreError>;

    /// `Ok(None)` for an unknown user or a wrong password
    fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>, DatastoreError>;
}

/// In-memory implementation of the UserRepository trait
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn add_user(&self, user: NewUser) -> Result<User, DatastoreError> {
        user.validate()?;

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(user.password.as_bytes(), &salt)?
            .to_string();

        let mut users = self.users.write().map_err(|_| DatastoreError::Poisoned)?;
        if users.contains_key(&user.username) {
            return Err(DatastoreError::Duplicate(user.username));
        }
        let record = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: user.username.clone(),
            password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.username, record.clone());
        Ok(record)
    }

    fn get_user(&self, username: &str) -> Result<Option<User>, DatastoreError> {
        let users = self.users.read().map_err(|_| DatastoreError::Poisoned)?;
        Ok(users.get(username).cloned())
    }

    fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>, DatastoreError> {
        let Some(user) = self.get_user(username)? else {
            return Ok(None);
        };
        let parsed = PasswordHash::new(&user.password_hash)?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(Some(user)),
            Err(argon2::password_hash::Error::Password) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Open the user store for `database_url`.
///
/// Only the in-memory backend exists, so the URL is logged and otherwise
/// ignored.
pub fn connect(database_url: Option<&str>) -> Arc<dyn UserRepository> {
    match database_url {
        Some(url) => tracing::info!(
            database = %redact(url),
            "no database backend available, using in-memory user store"
        ),
        None => tracing::info!("using in-memory user store"),
    }
    Arc::new(InMemoryUserRepository::new())
}

/// Drop credentials from a connection string before logging it
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
