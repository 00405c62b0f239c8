use std::sync::Arc;

use crate::config::Config;
use crate::db::{Store, UserRepository};
use crate::services::{AuthService, FundService, JsonAuthService, JsonFundService};

/// Services shared by the web server and the CLI, built once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub fund_service: Arc<dyn FundService>,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::open(&config.general.data_dir).await?;
        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let users = UserRepository::new(store.clone(), config.security.clone());

        Self {
            fund_service: Arc::new(JsonFundService::new(store.clone())),
            auth_service: Arc::new(JsonAuthService::new(store.clone(), users)),
            config: Arc::new(config),
            store,
        }
    }
}
