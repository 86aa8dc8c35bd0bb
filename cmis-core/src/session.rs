//! Client session
//!
//! Owns the binding and the repository description. Documents and folders
//! borrow the session, so it necessarily outlives every handle it produces.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::binding::{Binding, RepositoryInfo};
use crate::config::SessionConfig;
use crate::content::ProgressCallback;
use crate::document::Document;
use crate::error::{CmisError, Result};
use crate::folder::Folder;
use crate::object::{CmisObject, ObjectId};

/// Connected repository session
pub struct Session {
    binding: Arc<dyn Binding>,
    config: SessionConfig,
    info: RepositoryInfo,
    /// Default callback for transfers started without one
    progress: Mutex<Option<ProgressCallback>>,
}

impl Session {
    /// Open a session over a binding
    pub async fn open(binding: Arc<dyn Binding>, config: SessionConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(CmisError::InvalidState(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        let info = binding.repository_info().await?;
        tracing::info!(
            "Opened session on repository {} ({}), root folder {}",
            config.repository_id.as_deref().unwrap_or(&info.id),
            info.name,
            info.root_folder_id
        );

        Ok(Self {
            binding,
            config,
            info,
            progress: Mutex::new(None),
        })
    }

    /// Get the binding
    pub fn binding(&self) -> &dyn Binding {
        self.binding.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Repository description fetched when the session was opened
    pub fn info(&self) -> &RepositoryInfo {
        &self.info
    }

    /// Fetch a fresh snapshot of any object
    pub async fn object(&self, id: &ObjectId) -> Result<CmisObject<'_>> {
        let data = self.binding.fetch_object(id).await?;
        Ok(CmisObject::from_data(self, data))
    }

    /// Fetch a document
    pub async fn document(&self, id: &ObjectId) -> Result<Document<'_>> {
        self.object(id).await?.into_document()
    }

    /// Fetch a folder
    pub async fn folder(&self, id: &ObjectId) -> Result<Folder<'_>> {
        self.object(id).await?.into_folder()
    }

    /// Fetch the repository root folder
    pub async fn root_folder(&self) -> Result<Folder<'_>> {
        self.folder(&self.info.root_folder_id).await
    }

    /// The slot only ever holds a whole value, so a poisoned lock is still usable.
    fn progress_slot(&self) -> MutexGuard<'_, Option<ProgressCallback>> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the callback used by transfers that are not given one
    pub fn set_progress_callback(&self, callback: ProgressCallback) {
        *self.progress_slot() = Some(callback);
    }

    pub fn clear_progress_callback(&self) {
        *self.progress_slot() = None;
    }

    /// Currently registered default callback
    pub fn progress_callback(&self) -> Option<ProgressCallback> {
        self.progress_slot().clone()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("repository", &self.info.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
