//! Document store implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::api::validation::{validate_password, validate_username};
use crate::db::{PublicUser, Store, UserRepository};
use crate::services::auth_service::{AuthError, AuthService};

pub struct JsonAuthService {
    store: Store,
    users: UserRepository,
}

impl JsonAuthService {
    #[must_use]
    pub const fn new(store: Store, users: UserRepository) -> Self {
        Self { store, users }
    }
}

#[async_trait]
impl AuthService for JsonAuthService {
    async fn register(
        &self,
        username: &str,
        password: &str,
        favorite: Option<String>,
    ) -> Result<PublicUser, AuthError> {
        validate_username(username).map_err(|e| AuthError::Validation(e.to_string()))?;
        validate_password(password).map_err(|e| AuthError::Validation(e.to_string()))?;

        let favorite = favorite.filter(|f| !f.trim().is_empty());
        if let Some(coffee) = &favorite {
            let prices = self.store.load_prices().await?;
            if !prices.contains(coffee) {
                return Err(AuthError::Validation(format!("Unknown coffee: {coffee}")));
            }
        }

        if !self.users.create(username, password, favorite).await? {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }

        info!("Registered user: {username}");

        self.users
            .get(username)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn login(&self, username: &str, password: &str) -> Result<PublicUser, AuthError> {
        let is_valid = self.users.verify_password(username, password).await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.users
            .get(username)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn get_user_info(&self, username: &str) -> Result<PublicUser, AuthError> {
        self.users
            .get(username)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn list_users(&self) -> Result<Vec<PublicUser>, AuthError> {
        Ok(self.users.list().await?)
    }
}
