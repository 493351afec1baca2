//! Ledger/history persistence
//!
//! The whole [`LedgerStore`] is one JSON document under a fixed key of the
//! `key_value_store` table. Writes replace the document.

use hsa_common::db::{delete_value, get_json, put_json};
use hsa_common::Result;
use sqlx::SqlitePool;

use crate::stores::LedgerStore;

/// Key of the ledger document
pub const LEDGER_STORE_KEY: &str = "receipt-storage";

#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the persisted ledger; empty when nothing was saved yet
    pub async fn load(&self) -> Result<LedgerStore> {
        let store: Option<LedgerStore> = get_json(&self.pool, LEDGER_STORE_KEY).await?;

        match store {
            Some(store) => {
                tracing::debug!(
                    items = store.items().len(),
                    history = store.history().len(),
                    "Loaded ledger"
                );
                Ok(store)
            }
            None => {
                tracing::debug!("No persisted ledger, starting empty");
                Ok(LedgerStore::default())
            }
        }
    }

    pub async fn save(&self, store: &LedgerStore) -> Result<()> {
        put_json(&self.pool, LEDGER_STORE_KEY, store).await?;
        tracing::info!(
            items = store.items().len(),
            history = store.history().len(),
            "Saved ledger"
        );
        Ok(())
    }

    /// Drop the persisted document; returns whether one existed
    pub async fn reset(&self) -> Result<bool> {
        delete_value(&self.pool, LEDGER_STORE_KEY).await
    }
}
