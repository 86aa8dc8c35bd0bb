//! Folder handles, containment and tree removal
//!
//! Folders only reflect containment; the repository owns child lifetime.
//! Paths are recomputed from parent links on every call because objects can
//! be moved out of band.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::ops::ControlFlow;

use crate::binding::{Binding, ContentStream};
use crate::content::ContentTransfer;
use crate::document::{join_path, Document};
use crate::error::{CmisError, Result};
use crate::object::{BaseType, CmisObject, ObjectData, ObjectId};
use crate::properties::{props, Properties};
use crate::session::Session;

/// Policy for documents that are also filed in folders outside the removed tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnfileObjects {
    /// Detach from this folder, keep the document
    Unfile,
    /// Delete only when this folder is the sole parent, otherwise detach
    DeleteSingleFiled,
    /// Always delete
    #[default]
    Delete,
}

/// Options for [`FolderOps::remove_tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveTreeOptions {
    /// Delete whole version series rather than only the listed version
    pub all_versions: bool,
    pub unfile: UnfileObjects,
    /// Keep going after a per-object failure
    pub continue_on_error: bool,
}

impl Default for RemoveTreeOptions {
    fn default() -> Self {
        Self {
            all_versions: true,
            unfile: UnfileObjects::Delete,
            continue_on_error: false,
        }
    }
}

/// Snapshot of a folder
#[derive(Debug, Clone)]
pub struct Folder<'s> {
    session: &'s Session,
    data: ObjectData,
}

impl<'s> Folder<'s> {
    pub(crate) fn new(session: &'s Session, data: ObjectData) -> Self {
        Self { session, data }
    }

    pub fn session(&self) -> &'s Session {
        self.session
    }

    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    pub fn id(&self) -> &ObjectId {
        &self.data.id
    }

    pub fn name(&self) -> &str {
        self.data.name()
    }

    pub fn properties(&self) -> &Properties {
        &self.data.properties
    }

    /// Parent folder ID, absent only for the root
    pub fn parent_id(&self) -> Option<ObjectId> {
        self.properties().id(props::PARENT_ID)
    }

    pub fn is_root_folder(&self) -> bool {
        self.parent_id().is_none()
    }
}

impl std::fmt::Display for Folder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Folder Object:")?;
        writeln!(f)?;
        writeln!(f, "Id: {}", self.id())?;
        writeln!(f, "Name: {}", self.name())?;
        write!(
            f,
            "Parent Id: {}",
            self.parent_id().map(|p| p.to_string()).unwrap_or_default()
        )
    }
}

/// Operations available on folders
#[async_trait]
pub trait FolderOps<'s> {
    /// Direct children, documents and folders
    async fn children(&self) -> Result<Vec<CmisObject<'s>>>;

    /// Fresh snapshot of the parent folder; `None` for the root
    async fn folder_parent(&self) -> Result<Option<Folder<'s>>>;

    /// Absolute path, walked through the repository
    async fn path(&self) -> Result<String>;

    /// Folders are single-filed, so this is `[path]`
    async fn paths(&self) -> Result<Vec<String>>;

    async fn create_folder(&self, properties: &Properties) -> Result<Folder<'s>>;

    /// Create a document, uploading `content` when given
    async fn create_document(
        &self,
        properties: &Properties,
        content: Option<ContentStream>,
    ) -> Result<Document<'s>>;

    /// Remove this folder and everything below it, children first.
    ///
    /// Returns the ids that could not be removed; empty means full success.
    async fn remove_tree(&self, options: RemoveTreeOptions) -> Result<Vec<ObjectId>>;
}

#[async_trait]
impl<'s> FolderOps<'s> for Folder<'s> {
    async fn children(&self) -> Result<Vec<CmisObject<'s>>> {
        let records = self.session.binding().children(self.id()).await?;
        Ok(records
            .into_iter()
            .map(|d| CmisObject::from_data(self.session, d))
            .collect())
    }

    async fn folder_parent(&self) -> Result<Option<Folder<'s>>> {
        match self.parent_id() {
            None => Ok(None),
            Some(parent_id) => {
                let data = self.session.binding().fetch_object(&parent_id).await?;
                CmisObject::from_data(self.session, data)
                    .into_folder()
                    .map(Some)
            }
        }
    }

    async fn path(&self) -> Result<String> {
        let binding = self.session.binding();
        let mut segments = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.data.clone();

        loop {
            if !visited.insert(current.id.clone()) {
                return Err(CmisError::protocol(format!(
                    "cycle in parent links at {}",
                    current.id
                )));
            }
            match current.properties.id(props::PARENT_ID) {
                None => break,
                Some(parent_id) => {
                    segments.push(current.name().to_string());
                    current = binding.fetch_object(&parent_id).await?;
                }
            }
        }

        segments.reverse();
        Ok(format!("/{}", segments.join("/")))
    }

    async fn paths(&self) -> Result<Vec<String>> {
        Ok(vec![self.path().await?])
    }

    async fn create_folder(&self, properties: &Properties) -> Result<Folder<'s>> {
        let data = self
            .session
            .binding()
            .create_folder(self.id(), properties)
            .await?;
        tracing::debug!("Created folder {} in {}", data.id, self.id());
        CmisObject::from_data(self.session, data).into_folder()
    }

    async fn create_document(
        &self,
        properties: &Properties,
        content: Option<ContentStream>,
    ) -> Result<Document<'s>> {
        let binding = self.session.binding();
        let data = binding.create_document(self.id(), properties).await?;
        tracing::debug!("Created document {} in {}", data.id, self.id());

        let data = match content {
            None => data,
            Some(stream) => {
                let transfer = ContentTransfer::new(self.session);
                match transfer.upload(&data, stream, true, None).await {
                    Ok(updated) => updated,
                    Err(e) => {
                        // Do not leave an empty document behind
                        if let Err(cleanup) = binding.delete_object(&data.id, true).await {
                            tracing::warn!(
                                "Failed to remove {} after upload error: {}",
                                data.id,
                                cleanup
                            );
                        }
                        return Err(e);
                    }
                }
            }
        };

        CmisObject::from_data(self.session, data).into_document()
    }

    async fn remove_tree(&self, options: RemoveTreeOptions) -> Result<Vec<ObjectId>> {
        if self.is_root_folder() || *self.id() == self.session.info().root_folder_id {
            return Err(CmisError::InvalidState(
                "the root folder cannot be removed".to_string(),
            ));
        }

        let mut failed = Vec::new();
        let flow = remove_folder(self.session.binding(), self.id().clone(), &options, &mut failed).await;

        if failed.is_empty() {
            tracing::info!("Removed tree {}", self.id());
        } else if flow.is_break() {
            tracing::info!(
                "Stopped removing tree {} at first failure ({})",
                self.id(),
                failed.len()
            );
        } else {
            tracing::info!(
                "Removed tree {} with {} failure(s)",
                self.id(),
                failed.len()
            );
        }
        Ok(failed)
    }
}

/// Record a per-object failure and decide whether traversal goes on.
fn record_failure(
    failed: &mut Vec<ObjectId>,
    id: &ObjectId,
    err: &CmisError,
    options: &RemoveTreeOptions,
) -> ControlFlow<()> {
    tracing::warn!("removeTree: could not remove {}: {}", id, err);
    failed.push(id.clone());
    if options.continue_on_error {
        ControlFlow::Continue(())
    } else {
        ControlFlow::Break(())
    }
}

/// Depth-first removal of one folder: children in listing order, then the folder.
fn remove_folder<'a>(
    binding: &'a dyn Binding,
    folder_id: ObjectId,
    options: &'a RemoveTreeOptions,
    failed: &'a mut Vec<ObjectId>,
) -> BoxFuture<'a, ControlFlow<()>> {
    async move {
        let children = match binding.children(&folder_id).await {
            Ok(children) => children,
            Err(e) => return record_failure(failed, &folder_id, &e, options),
        };

        let failed_before = failed.len();
        for child in children {
            let flow = match child.base_type {
                BaseType::Folder => remove_folder(binding, child.id.clone(), options, failed).await,
                BaseType::Document => match remove_document(binding, &folder_id, &child, options).await {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(e) => record_failure(failed, &child.id, &e, options),
                },
            };
            if flow.is_break() {
                return ControlFlow::Break(());
            }
        }

        if failed.len() > failed_before {
            // Something below is still there, so the folder cannot be empty
            failed.push(folder_id);
            return ControlFlow::Continue(());
        }

        tracing::debug!("removeTree: deleting folder {}", folder_id);
        match binding.delete_object(&folder_id, options.all_versions).await {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => record_failure(failed, &folder_id, &e, options),
        }
    }
    .boxed()
}

/// Apply the unfile policy to one document filed in `folder_id`.
async fn remove_document(
    binding: &dyn Binding,
    folder_id: &ObjectId,
    document: &ObjectData,
    options: &RemoveTreeOptions,
) -> Result<()> {
    let parents = binding.object_parents(&document.id).await?;
    let multi_filed = parents.iter().any(|p| p.id != *folder_id);

    match (multi_filed, options.unfile) {
        (true, UnfileObjects::Unfile | UnfileObjects::DeleteSingleFiled) => {
            tracing::debug!("removeTree: unfiling {} from {}", document.id, folder_id);
            binding
                .remove_object_from_folder(&document.id, folder_id)
                .await
        }
        // Unfiling from the sole parent would orphan the document
        _ => {
            tracing::debug!("removeTree: deleting document {}", document.id);
            binding
                .delete_object(&document.id, options.all_versions)
                .await
        }
    }
}
