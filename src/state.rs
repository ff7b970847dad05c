use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::store::{MemoryStore, PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgStore::new(db)) as Arc<dyn Store>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using the in-memory store");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// A fresh, isolated state backed by its own in-memory store.
    #[cfg(test)]
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(Arc::new(MemoryStore::new()), Arc::new(config))
    }
}
