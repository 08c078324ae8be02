//! Application state.

use std::sync::Arc;

use crate::config::Config;
use crate::documents::DocumentStore;
use crate::error::Result;
use crate::intake::IntakeService;
use crate::storage::{SharedStorage, Storage};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// The intake pipeline and its store.
    pub intake: IntakeService,
}

impl AppState {
    /// Create state from already opened stores.
    #[must_use]
    pub fn new(config: Config, storage: Storage, documents: DocumentStore) -> Self {
        let intake = IntakeService::new(
            SharedStorage::new(storage),
            documents,
            config.intake.min_expiry_date,
            config.intake.max_upload_bytes,
        );
        Self {
            config: Arc::new(config),
            intake,
        }
    }

    /// Open the database and document directory named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either store cannot be opened.
    pub fn open(config: Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        let documents = DocumentStore::open(config.upload_dir())?;
        Ok(Self::new(config, storage, documents))
    }

    /// The shared record store.
    #[must_use]
    pub fn storage(&self) -> &SharedStorage {
        self.intake.storage()
    }
}
