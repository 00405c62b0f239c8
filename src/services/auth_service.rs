//! Domain service for registration and authentication.

use thiserror::Error;

use crate::db::PublicUser;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a user with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for a bad username, password or favorite,
    /// and [`AuthError::UsernameTaken`] if the name exists.
    async fn register(
        &self,
        username: &str,
        password: &str,
        favorite: Option<String>,
    ) -> Result<PublicUser, AuthError>;

    /// Verifies credentials and returns the user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<PublicUser, AuthError>;

    async fn get_user_info(&self, username: &str) -> Result<PublicUser, AuthError>;

    async fn list_users(&self) -> Result<Vec<PublicUser>, AuthError>;
}
