use std::{future::Future, sync::Arc};

use crate::config::AppConfig;
use crate::notifier::Notifier;
use crate::store::{timed, PgStore, Store, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub notifier: Notifier,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = PgStore::connect(&config.database_url).await?;
        if let Err(e) = store.migrate().await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let notifier = Notifier::from_config(&config)?;

        Ok(Self::from_parts(Arc::new(store), notifier, config))
    }

    pub fn from_parts(store: Arc<dyn Store>, notifier: Notifier, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Runs a store call under the configured store timeout.
    pub async fn db<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        timed(self.config.timeouts.store, fut).await
    }
}
