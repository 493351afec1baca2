//! hsa-assist library interface
//!
//! Receipt classification client, review engine and ledger reconciliation
//! for the HSA expense assistant. Exposed as a library for the CLI and for
//! integration testing.

pub mod db;
pub mod error;
pub mod models;
pub mod review;
pub mod services;
pub mod stores;
pub mod summary;
pub mod utils;
pub mod workflow;

pub use crate::error::{AssistError, AssistResult, ValidationFailure};

use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::db::LedgerRepository;
use crate::stores::{ChatTranscript, LedgerStore, ReviewStore};

/// Application state shared by the workflow components
///
/// Each operation is the sole mutator of the store it touches while it
/// runs. Chat and review are volatile; the ledger is written through
/// `repository` when one is attached.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<RwLock<ChatTranscript>>,
    pub review: Arc<RwLock<ReviewStore>>,
    pub ledger: Arc<RwLock<LedgerStore>>,
    repository: Option<LedgerRepository>,
}

impl AppState {
    /// In-memory state with nothing persisted
    pub fn volatile() -> Self {
        Self::with_ledger(LedgerStore::default(), None)
    }

    /// Restore the durable ledger from `pool` and start fresh volatile stores
    pub async fn load(pool: SqlitePool) -> hsa_common::Result<Self> {
        let repository = LedgerRepository::new(pool);
        let ledger = repository.load().await?;
        Ok(Self::with_ledger(ledger, Some(repository)))
    }

    fn with_ledger(ledger: LedgerStore, repository: Option<LedgerRepository>) -> Self {
        Self {
            chat: Arc::new(RwLock::new(ChatTranscript::new())),
            review: Arc::new(RwLock::new(ReviewStore::new())),
            ledger: Arc::new(RwLock::new(ledger)),
            repository,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.repository.is_some()
    }

    /// Write `snapshot` through to the database, if attached
    pub async fn persist_ledger(&self, snapshot: &LedgerStore) -> hsa_common::Result<()> {
        match &self.repository {
            Some(repository) => repository.save(snapshot).await,
            None => Ok(()),
        }
    }

    /// Empty the ledger and history, in memory and on disk
    pub async fn clear_ledger(&self) -> hsa_common::Result<()> {
        {
            let mut ledger = self.ledger.write().await;
            ledger.clear_items();
            ledger.clear_history();
        }
        if let Some(repository) = &self.repository {
            let existed = repository.reset().await?;
            tracing::info!(existed, "Persisted ledger removed");
        }
        Ok(())
    }
}
