use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::models::{
    CoffeePrices, HistoryDocument, InvalidDocument, UsersDocument, validate_history,
    validate_prices, validate_users,
};

pub mod backend;
pub mod repositories;

pub use backend::{Collection, DocumentBackend, JsonFileBackend, MemoryBackend};
pub use repositories::user::{PublicUser, UserRepository};

/// Data directory value that selects the in-process backend.
pub const MEMORY_DATA_DIR: &str = ":memory:";

/// Typed access to the fund's documents.
///
/// Every read-modify-write cycle must hold [`Store::lock_writes`] from the
/// first load until the last save; documents are always overwritten whole.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn DocumentBackend>,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub async fn open(data_dir: &str) -> Result<Self> {
        if data_dir == MEMORY_DATA_DIR {
            info!("Using in-memory document store");
            return Ok(Self::in_memory());
        }

        let backend = JsonFileBackend::open(data_dir).await?;
        info!("Document store opened at {}", backend.dir().display());
        Ok(Self::with_backend(Arc::new(backend)))
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    #[must_use]
    pub fn with_backend(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Single-writer critical section shared by every clone of this store.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    async fn load<T: DeserializeOwned + Default>(&self, collection: Collection) -> Result<T> {
        let Some(raw) = self.backend.get(collection).await? else {
            return Ok(T::default());
        };

        if raw.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&raw)
            .with_context(|| format!("Malformed {collection} document"))
    }

    fn encode<T: Serialize>(collection: Collection, value: &T) -> Result<String> {
        serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {collection} document"))
    }

    fn check(collection: Collection, result: Result<(), InvalidDocument>) -> Result<()> {
        result.with_context(|| format!("Malformed {collection} document"))
    }

    pub async fn load_users(&self) -> Result<UsersDocument> {
        let users: UsersDocument = self.load(Collection::Users).await?;
        Self::check(Collection::Users, validate_users(&users))?;
        Ok(users)
    }

    pub async fn load_prices(&self) -> Result<CoffeePrices> {
        let prices: CoffeePrices = self.load(Collection::CoffeePrices).await?;
        Self::check(Collection::CoffeePrices, validate_prices(&prices))?;
        Ok(prices)
    }

    pub async fn load_history(&self) -> Result<HistoryDocument> {
        let history: HistoryDocument = self.load(Collection::History).await?;
        Self::check(Collection::History, validate_history(&history))?;
        Ok(history)
    }

    pub async fn save_users(&self, users: &UsersDocument) -> Result<()> {
        Self::check(Collection::Users, validate_users(users))?;
        let raw = Self::encode(Collection::Users, users)?;
        self.backend.put(Collection::Users, raw).await
    }

    pub async fn save_prices(&self, prices: &CoffeePrices) -> Result<()> {
        Self::check(Collection::CoffeePrices, validate_prices(prices))?;
        let raw = Self::encode(Collection::CoffeePrices, prices)?;
        self.backend.put(Collection::CoffeePrices, raw).await
    }

    /// Writes `users` and `history` together; neither is written if either fails to encode.
    pub async fn save_ledger(&self, users: &UsersDocument, history: &HistoryDocument) -> Result<()> {
        Self::check(Collection::Users, validate_users(users))?;
        Self::check(Collection::History, validate_history(history))?;

        let documents = vec![
            (Collection::History, Self::encode(Collection::History, history)?),
            (Collection::Users, Self::encode(Collection::Users, users)?),
        ];
        self.backend.put_many(documents).await
    }

    /// Reads every collection once; used by health checks.
    pub async fn ping(&self) -> Result<()> {
        self.load_users().await?;
        self.load_prices().await?;
        self.load_history().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;

    #[tokio::test]
    async fn empty_store_loads_empty_documents() {
        let store = Store::in_memory();
        assert!(store.load_users().await.unwrap().is_empty());
        assert!(store.load_prices().await.unwrap().is_empty());
        assert!(store.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_document_is_rejected_at_load() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .put(Collection::CoffeePrices, r#"{"latte": "cheap"}"#.to_string())
            .await
            .unwrap();
        let store = Store::with_backend(backend);

        let err = store.load_prices().await.unwrap_err();
        assert!(err.to_string().contains("coffee_prices"));
    }

    #[tokio::test]
    async fn invalid_users_are_never_written() {
        let store = Store::in_memory();
        let mut users = UsersDocument::new();
        let mut record = UserRecord::new("h".to_string(), None);
        record.total_spent = f64::NAN;
        users.insert("ann", record);

        assert!(store.save_users(&users).await.is_err());
        assert!(store.load_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_preserves_user_order() {
        let dir = std::env::temp_dir().join(format!("coffeefund-store-{}", uuid::Uuid::new_v4()));
        let store = Store::open(dir.to_str().unwrap()).await.unwrap();

        let mut users = UsersDocument::new();
        users.insert("zoe", UserRecord::new("h1".to_string(), None));
        users.insert("adam", UserRecord::new("h2".to_string(), Some("latte".to_string())));
        store.save_users(&users).await.unwrap();

        let loaded = store.load_users().await.unwrap();
        assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["zoe", "adam"]);

        let _ = std::fs::remove_dir_all(dir);
    }
}
