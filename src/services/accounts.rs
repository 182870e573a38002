use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, PasswordError, MIN_PASSWORD_LENGTH};
use crate::database::{DatabaseError, UserRepository};
use crate::models::user::{normalize_email, validate_email_format};
use crate::models::{NewUser, Role, User, ValidationErrors};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("An account with that email already exists")]
    EmailTaken,

    #[error("No user found with that email")]
    UnknownEmail,

    #[error("Incorrect email or password")]
    WrongPassword,

    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    #[error("database error: {0}")]
    Database(DatabaseError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DatabaseError> for AccountError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(_) => AccountError::EmailTaken,
            other => AccountError::Database(other),
        }
    }
}

/// Signup and login over the user directory.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<User, AccountError> {
        let mut errors = ValidationErrors::new();

        let name = request.name.as_deref().map(str::trim).unwrap_or("").to_string();
        if name.is_empty() {
            errors.push("name", "Name is required");
        }

        let email = normalize_email(request.email.as_deref().unwrap_or(""));
        validate_email_format(&email, &mut errors);

        let password = request.password.unwrap_or_default();
        if password.is_empty() {
            errors.push("password", "Password is required");
        } else if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push("password", PasswordError::TooShort.to_string());
        }

        if !errors.is_empty() {
            return Err(AccountError::Validation(errors));
        }

        // Anything other than an explicit farmer signs up as a buyer.
        let role = request.role.and_then(|r| r.parse::<Role>().ok()).unwrap_or_default();
        let password_hash = run_blocking(move || hash_password(&password)).await??;

        let user = self
            .users
            .create(NewUser { name, email, role, password_hash })
            .await?;
        tracing::info!("new {} account {}", user.role, user.id);
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<User, AccountError> {
        let email = normalize_email(request.email.as_deref().unwrap_or(""));
        let password = request.password.unwrap_or_default();

        let mut errors = ValidationErrors::new();
        if email.is_empty() {
            errors.push("email", "Please provide email and password");
        }
        if password.is_empty() {
            errors.push("password", "Please provide email and password");
        }
        if !errors.is_empty() {
            return Err(AccountError::Validation(errors));
        }

        let user = self.users.find_by_email(&email).await?.ok_or(AccountError::UnknownEmail)?;

        let stored = user.password_hash.clone();
        let matches = run_blocking(move || verify_password(&password, &stored)).await??;
        if !matches {
            tracing::debug!("wrong password for {}", user.id);
            return Err(AccountError::WrongPassword);
        }
        Ok(user)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<User>, AccountError> {
        Ok(self.users.find_by_id(id).await?)
    }
}

/// argon2 is CPU-bound; keep it off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, AccountError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AccountError::Internal(e.to_string()))
}
