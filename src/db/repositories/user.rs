use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Serialize;
use tokio::task;

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::models::UserRecord;

/// User data safe to hand out (no password hash).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    pub username: String,
    pub total_spent: f64,
    pub favorite: Option<String>,
}

impl PublicUser {
    #[must_use]
    pub fn from_record(username: &str, record: &UserRecord) -> Self {
        Self {
            username: username.to_string(),
            total_spent: record.total_spent,
            favorite: record.favorite.clone(),
        }
    }
}

pub struct UserRepository {
    store: Store,
    security: SecurityConfig,
}

impl UserRepository {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    pub async fn get(&self, username: &str) -> Result<Option<PublicUser>> {
        let users = self.store.load_users().await?;
        Ok(users
            .get(username)
            .map(|record| PublicUser::from_record(username, record)))
    }

    /// All users in document order.
    pub async fn list(&self) -> Result<Vec<PublicUser>> {
        let users = self.store.load_users().await?;
        Ok(users
            .iter()
            .map(|(name, record)| PublicUser::from_record(name, record))
            .collect())
    }

    /// Creates a user with a zero balance. Returns `false` if the name is taken.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        favorite: Option<String>,
    ) -> Result<bool> {
        // Hash outside the write lock; it is the slow part.
        let password = password.to_string();
        let security = self.security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let _guard = self.store.lock_writes().await;
        let mut users = self.store.load_users().await?;
        if users.contains_key(username) {
            return Ok(false);
        }

        users.insert(username, UserRecord::new(password_hash, favorite));
        self.store.save_users(&users).await?;
        Ok(true)
    }

    /// Verify password for a user
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let users = self.store.load_users().await?;
        let Some(record) = users.get(username) else {
            return Ok(false);
        };

        let password_hash = record.password_hash.clone();
        let password = password.to_string();

        task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .context("Password verification task panicked")?
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Params are read from the PHC string, so hashes made under older settings still verify.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
