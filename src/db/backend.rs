use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::constants::files;

/// The three whole-document collections the fund persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    CoffeePrices,
    History,
}

impl Collection {
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Users => files::USERS,
            Self::CoffeePrices => files::COFFEE_PRICES,
            Self::History => files::HISTORY,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::CoffeePrices => "coffee_prices",
            Self::History => "history",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw key-value access to serialized documents. No partial updates.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Returns `None` when the document has never been written.
    async fn get(&self, collection: Collection) -> Result<Option<String>>;

    async fn put(&self, collection: Collection, document: String) -> Result<()>;

    /// Writes several documents as one step as far as the backend allows.
    async fn put_many(&self, documents: Vec<(Collection, String)>) -> Result<()> {
        for (collection, document) in documents {
            self.put(collection, document).await?;
        }
        Ok(())
    }
}

/// One pretty-printed JSON file per collection inside a data directory.
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    fn staging_path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!(".{}.tmp", collection.file_name()))
    }

    fn backup_path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!(".{}.bak", collection.file_name()))
    }

    async fn stage(&self, collection: Collection, document: &str) -> Result<PathBuf> {
        let staging = self.staging_path(collection);
        fs::write(&staging, document)
            .await
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        Ok(staging)
    }

    async fn commit(&self, collection: Collection, staging: &Path) -> Result<()> {
        let target = self.path(collection);
        fs::rename(staging, &target)
            .await
            .with_context(|| format!("Failed to replace {}", target.display()))?;
        debug!("Wrote {} document to {}", collection, target.display());
        Ok(())
    }

    /// Moves the current document aside. `None` if there was nothing to keep.
    async fn back_up(&self, collection: Collection) -> Result<Option<PathBuf>> {
        let target = self.path(collection);
        let exists = fs::try_exists(&target)
            .await
            .with_context(|| format!("Failed to inspect {}", target.display()))?;
        if !exists {
            return Ok(None);
        }

        let backup = self.backup_path(collection);
        fs::rename(&target, &backup)
            .await
            .with_context(|| format!("Failed to back up {}", target.display()))?;
        Ok(Some(backup))
    }

    /// Puts every touched document back the way it was and drops unused staging files.
    async fn roll_back(
        &self,
        touched: &[(Collection, Option<PathBuf>)],
        pending: &[(Collection, PathBuf)],
    ) {
        for (collection, backup) in touched.iter().rev() {
            let target = self.path(*collection);
            let restored = match backup {
                Some(backup) => fs::rename(backup, &target).await,
                None => fs::remove_file(&target).await,
            };
            match restored {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to restore {}: {}", target.display(), e),
            }
        }

        for (_, staging) in pending {
            let _ = fs::remove_file(staging).await;
        }
    }

    /// Renames staged files over their targets. On failure every target is restored.
    async fn commit_all(&self, staged: &[(Collection, PathBuf)]) -> Result<()> {
        let mut touched: Vec<(Collection, Option<PathBuf>)> = Vec::with_capacity(staged.len());

        for (index, (collection, staging)) in staged.iter().enumerate() {
            let backup = match self.back_up(*collection).await {
                Ok(backup) => backup,
                Err(e) => {
                    self.roll_back(&touched, &staged[index..]).await;
                    return Err(e);
                }
            };
            touched.push((*collection, backup));

            if let Err(e) = self.commit(*collection, staging).await {
                self.roll_back(&touched, &staged[index..]).await;
                return Err(e);
            }
        }

        for backup in touched.into_iter().filter_map(|(_, backup)| backup) {
            let _ = fs::remove_file(backup).await;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for JsonFileBackend {
    async fn get(&self, collection: Collection) -> Result<Option<String>> {
        let path = self.path(collection);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn put(&self, collection: Collection, document: String) -> Result<()> {
        let staging = self.stage(collection, &document).await?;
        self.commit(collection, &staging).await
    }

    async fn put_many(&self, documents: Vec<(Collection, String)>) -> Result<()> {
        // Stage everything first so a failed write leaves every target untouched.
        let mut staged = Vec::with_capacity(documents.len());
        for (collection, document) in &documents {
            match self.stage(*collection, document).await {
                Ok(path) => staged.push((*collection, path)),
                Err(e) => {
                    for (_, path) in &staged {
                        let _ = fs::remove_file(path).await;
                    }
                    return Err(e);
                }
            }
        }

        self.commit_all(&staged).await
    }
}

/// Process-local backend used by tests and `data_dir = ":memory:"`.
#[derive(Default)]
pub struct MemoryBackend {
    documents: RwLock<HashMap<Collection, String>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn get(&self, collection: Collection) -> Result<Option<String>> {
        Ok(self.documents.read().await.get(&collection).cloned())
    }

    async fn put(&self, collection: Collection, document: String) -> Result<()> {
        self.documents.write().await.insert(collection, document);
        Ok(())
    }

    async fn put_many(&self, documents: Vec<(Collection, String)>) -> Result<()> {
        let mut guard = self.documents.write().await;
        for (collection, document) in documents {
            guard.insert(collection, document);
        }
        Ok(())
    }
}
