//! In-memory repository
//!
//! A complete [`Binding`] that keeps everything in process memory. It
//! enforces the server-side rules the object model depends on (one private
//! working copy per series, only empty folders can be deleted, unique names
//! per folder) and records the calls it receives so tests can assert on
//! traversal order and on bytes that were or were not sent.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::binding::{
    Binding, Capabilities, ContentMeta, ContentStream, RepositoryInfo, UploadSink,
};
use crate::error::{CmisError, Result, TransportError};
use crate::object::{BaseType, ObjectData, ObjectId};
use crate::properties::{props, Properties};
use crate::versioning::CheckInRequest;

/// 2024-01-01T00:00:00Z; creation dates advance one second per object
const CLOCK_ORIGIN: i64 = 1_704_067_200;

/// Operation that can be made to fail for a given object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Fetch,
    Children,
    Parents,
    Delete,
    Unfile,
    CheckOut,
    CancelCheckOut,
    CheckIn,
    Upload,
}

#[derive(Debug, Clone)]
struct StoredContent {
    data: Bytes,
    content_type: String,
    filename: String,
}

#[derive(Debug)]
struct Entry {
    data: ObjectData,
    /// Insertion order, used for stable child listings
    seq: u64,
    content: Option<StoredContent>,
    renditions: HashMap<String, StoredContent>,
}

#[derive(Debug)]
struct Series {
    /// Oldest first
    versions: Vec<ObjectId>,
    pwc: Option<ObjectId>,
    /// Folders the series is filed in
    parents: Vec<ObjectId>,
    major: u32,
    minor: u32,
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<ObjectId, Entry>,
    series: HashMap<String, Series>,
    clock: u64,
    failures: HashSet<(FailPoint, ObjectId)>,
    /// Object → number of chunks accepted before the upload breaks
    upload_failures: HashMap<ObjectId, usize>,
    deletions: Vec<ObjectId>,
    unfilings: Vec<(ObjectId, ObjectId)>,
    write_calls: usize,
    aborted_uploads: usize,
}

impl State {
    fn tick(&mut self) -> (u64, DateTime<Utc>) {
        self.clock += 1;
        let date = DateTime::from_timestamp(CLOCK_ORIGIN + self.clock as i64, 0).unwrap_or_default();
        (self.clock, date)
    }

    fn check_failure(&self, point: FailPoint, id: &ObjectId) -> Result<()> {
        if self.failures.contains(&(point, id.clone())) {
            return Err(CmisError::PermissionDenied(format!(
                "injected {:?} failure on {}",
                point, id
            )));
        }
        Ok(())
    }

    fn entry(&self, id: &ObjectId) -> Result<&Entry> {
        self.objects
            .get(id)
            .ok_or_else(|| CmisError::ObjectNotFound(id.clone()))
    }

    fn folder(&self, id: &ObjectId) -> Result<&Entry> {
        let entry = self.entry(id)?;
        if !entry.data.is_folder() {
            return Err(CmisError::InvalidState(format!("{} is not a folder", id)));
        }
        Ok(entry)
    }

    fn series_id(&self, id: &ObjectId) -> Result<String> {
        let entry = self.entry(id)?;
        if !entry.data.is_document() {
            return Err(CmisError::InvalidState(format!("{} is not a document", id)));
        }
        entry
            .data
            .properties
            .string(props::VERSION_SERIES_ID)
            .map(str::to_string)
            .ok_or_else(|| CmisError::protocol(format!("{} has no version series", id)))
    }

    fn series(&self, series_id: &str) -> Result<&Series> {
        self.series
            .get(series_id)
            .ok_or_else(|| CmisError::protocol(format!("unknown version series {}", series_id)))
    }

    fn series_mut(&mut self, series_id: &str) -> Result<&mut Series> {
        self.series
            .get_mut(series_id)
            .ok_or_else(|| CmisError::protocol(format!("unknown version series {}", series_id)))
    }

    /// Subfolders plus the latest version of every series filed here
    fn children_of(&self, folder_id: &ObjectId) -> Vec<&Entry> {
        let mut children: Vec<&Entry> = self
            .objects
            .values()
            .filter(|e| e.data.is_folder() && e.data.properties.string(props::PARENT_ID) == Some(folder_id.as_str()))
            .collect();
        for series in self.series.values() {
            if !series.parents.contains(folder_id) {
                continue;
            }
            if let Some(latest) = series.versions.last().and_then(|id| self.objects.get(id)) {
                children.push(latest);
            }
        }
        children.sort_by_key(|e| e.seq);
        children
    }

    fn ensure_unique_name(&self, folder_id: &ObjectId, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(CmisError::InvalidState(format!("{} is required", props::NAME)));
        }
        if self.children_of(folder_id).iter().any(|e| e.data.name() == name) {
            return Err(CmisError::Conflict(format!(
                "an object named '{}' already exists in {}",
                name, folder_id
            )));
        }
        Ok(())
    }

    fn insert(&mut self, data: ObjectData, content: Option<StoredContent>) {
        let seq = self.clock;
        self.objects.insert(
            data.id.clone(),
            Entry {
                data,
                seq,
                content,
                renditions: HashMap::new(),
            },
        );
    }

    /// Validate that `pwc_id` is the current working copy of its series
    fn current_pwc(&self, pwc_id: &ObjectId) -> Result<String> {
        let series_id = self.series_id(pwc_id)?;
        if self.series(&series_id)?.pwc.as_ref() != Some(pwc_id) {
            return Err(CmisError::InvalidState(format!(
                "{} is not the current private working copy",
                pwc_id
            )));
        }
        Ok(series_id)
    }

    /// Recompute latest/checked-out flags on every member of a series
    fn refresh_series(&mut self, series_id: &str) {
        let Some(series) = self.series.get(series_id) else {
            return;
        };
        let latest = series.versions.last().cloned();
        let pwc = series.pwc.clone();
        let members: Vec<ObjectId> = series.versions.iter().cloned().chain(pwc.clone()).collect();

        for id in members {
            if let Some(entry) = self.objects.get_mut(&id) {
                let p = &mut entry.data.properties;
                p.set_boolean(props::IS_LATEST_VERSION, latest.as_ref() == Some(&id));
                p.set_boolean(props::IS_VERSION_SERIES_CHECKED_OUT, pwc.is_some());
                match &pwc {
                    Some(pwc_id) => p.set_id(props::VERSION_SERIES_CHECKED_OUT_ID, pwc_id.as_str()),
                    None => {
                        p.remove(props::VERSION_SERIES_CHECKED_OUT_ID);
                    }
                }
            }
        }
    }

    fn remove_series(&mut self, series_id: &str) {
        if let Some(series) = self.series.remove(series_id) {
            for id in series.versions.iter().chain(series.pwc.iter()) {
                self.objects.remove(id);
            }
        }
    }
}

/// Copy a record under a new identity
fn clone_as(data: &ObjectData, id: ObjectId) -> ObjectData {
    let mut copy = data.clone();
    copy.properties.set_id(props::OBJECT_ID, id.as_str());
    copy.id = id;
    copy
}

fn new_id() -> ObjectId {
    ObjectId::new(uuid::Uuid::new_v4().to_string())
}

fn apply_content(data: &mut ObjectData, content: &StoredContent, date: DateTime<Utc>) {
    let p = &mut data.properties;
    p.set_string(props::CONTENT_STREAM_MIME_TYPE, content.content_type.clone());
    p.set_string(props::CONTENT_STREAM_FILE_NAME, content.filename.clone());
    p.set_integer(props::CONTENT_STREAM_LENGTH, content.data.len() as i64);
    p.set_datetime(props::LAST_MODIFICATION_DATE, date);
}

/// In-memory repository
#[derive(Clone)]
pub struct MemoryRepository {
    state: Arc<RwLock<State>>,
    info: RepositoryInfo,
}

impl MemoryRepository {
    /// Create a repository holding only an empty root folder
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::default())
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        let root_id = new_id();
        let mut state = State::default();
        let (_, date) = state.tick();

        let mut root = ObjectData::new(root_id.clone(), BaseType::Folder);
        root.properties.set_string(props::NAME, "");
        root.properties.set_string(props::PATH, "/");
        root.properties.set_datetime(props::CREATION_DATE, date);
        state.insert(root, None);

        Self {
            state: Arc::new(RwLock::new(state)),
            info: RepositoryInfo {
                id: uuid::Uuid::new_v4().to_string(),
                name: "In-memory repository".to_string(),
                root_folder_id: root_id,
                capabilities,
            },
        }
    }

    /// Get the root folder ID
    pub fn root_id(&self) -> ObjectId {
        self.info.root_folder_id.clone()
    }

    /// Make `point` fail for `id` until cleared
    pub async fn fail(&self, point: FailPoint, id: &ObjectId) {
        self.state.write().await.failures.insert((point, id.clone()));
    }

    pub async fn clear_failures(&self) {
        let mut state = self.state.write().await;
        state.failures.clear();
        state.upload_failures.clear();
    }

    /// Break uploads to `id` after `chunks` accepted writes
    pub async fn fail_upload_after(&self, id: &ObjectId, chunks: usize) {
        self.state
            .write()
            .await
            .upload_failures
            .insert(id.clone(), chunks);
    }

    /// Attach a named rendition to a document
    pub async fn add_rendition(
        &self,
        id: &ObjectId,
        stream_id: &str,
        data: impl Into<Bytes>,
        content_type: &str,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = state
            .objects
            .get_mut(id)
            .ok_or_else(|| CmisError::ObjectNotFound(id.clone()))?;
        entry.renditions.insert(
            stream_id.to_string(),
            StoredContent {
                data: data.into(),
                content_type: content_type.to_string(),
                filename: stream_id.to_string(),
            },
        );
        Ok(())
    }

    /// File an existing document in an additional folder
    pub async fn add_parent(&self, id: &ObjectId, folder_id: &ObjectId) -> Result<()> {
        let mut state = self.state.write().await;
        if !self.info.capabilities.multifiling {
            return Err(CmisError::NotSupported("multi-filing is disabled".to_string()));
        }
        state.folder(folder_id)?;
        let series_id = state.series_id(id)?;
        let series = state.series_mut(&series_id)?;
        if !series.parents.contains(folder_id) {
            series.parents.push(folder_id.clone());
        }
        Ok(())
    }

    /// Delete attempts in call order, including failed ones
    pub async fn deletions(&self) -> Vec<ObjectId> {
        self.state.read().await.deletions.clone()
    }

    /// Unfile attempts in call order as `(object, folder)`
    pub async fn unfilings(&self) -> Vec<(ObjectId, ObjectId)> {
        self.state.read().await.unfilings.clone()
    }

    /// Number of upload chunks received
    pub async fn write_calls(&self) -> usize {
        self.state.read().await.write_calls
    }

    pub async fn aborted_uploads(&self) -> usize {
        self.state.read().await.aborted_uploads
    }

    pub async fn contains(&self, id: &ObjectId) -> bool {
        self.state.read().await.objects.contains_key(id)
    }

    /// Stored primary content of an object
    pub async fn content(&self, id: &ObjectId) -> Option<Bytes> {
        let state = self.state.read().await;
        state
            .objects
            .get(id)
            .and_then(|e| e.content.as_ref())
            .map(|c| c.data.clone())
    }

    /// Whether the series containing `id` has a working copy
    pub async fn is_checked_out(&self, id: &ObjectId) -> Result<bool> {
        let state = self.state.read().await;
        let series_id = state.series_id(id)?;
        Ok(state.series(&series_id)?.pwc.is_some())
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Binding for MemoryRepository {
    async fn repository_info(&self) -> Result<RepositoryInfo> {
        Ok(self.info.clone())
    }

    async fn fetch_object(&self, id: &ObjectId) -> Result<ObjectData> {
        let state = self.state.read().await;
        state.check_failure(FailPoint::Fetch, id)?;
        Ok(state.entry(id)?.data.clone())
    }

    async fn object_parents(&self, id: &ObjectId) -> Result<Vec<ObjectData>> {
        let state = self.state.read().await;
        state.check_failure(FailPoint::Parents, id)?;
        let entry = state.entry(id)?;

        let parent_ids: Vec<ObjectId> = match entry.data.base_type {
            BaseType::Folder => entry
                .data
                .properties
                .string(props::PARENT_ID)
                .map(|p| vec![ObjectId::from(p)])
                .unwrap_or_default(),
            BaseType::Document => {
                let series_id = state.series_id(id)?;
                state.series(&series_id)?.parents.clone()
            }
        };

        parent_ids
            .iter()
            .map(|p| state.entry(p).map(|e| e.data.clone()))
            .collect()
    }

    async fn children(&self, folder_id: &ObjectId) -> Result<Vec<ObjectData>> {
        let state = self.state.read().await;
        state.check_failure(FailPoint::Children, folder_id)?;
        state.folder(folder_id)?;
        Ok(state
            .children_of(folder_id)
            .into_iter()
            .map(|e| e.data.clone())
            .collect())
    }

    async fn create_folder(&self, parent_id: &ObjectId, properties: &Properties) -> Result<ObjectData> {
        let mut state = self.state.write().await;
        state.folder(parent_id)?;
        state.ensure_unique_name(parent_id, properties.string(props::NAME).unwrap_or(""))?;

        let (_, date) = state.tick();
        let mut data = ObjectData::new(new_id(), BaseType::Folder).with_properties(properties);
        data.properties.set_id(props::PARENT_ID, parent_id.as_str());
        data.properties.set_datetime(props::CREATION_DATE, date);
        data.properties.set_datetime(props::LAST_MODIFICATION_DATE, date);

        state.insert(data.clone(), None);
        Ok(data)
    }

    async fn create_document(&self, parent_id: &ObjectId, properties: &Properties) -> Result<ObjectData> {
        let mut state = self.state.write().await;
        state.folder(parent_id)?;
        state.ensure_unique_name(parent_id, properties.string(props::NAME).unwrap_or(""))?;

        let (_, date) = state.tick();
        let series_id = uuid::Uuid::new_v4().to_string();
        let mut data = ObjectData::new(new_id(), BaseType::Document).with_properties(properties);
        let p = &mut data.properties;
        p.set_id(props::VERSION_SERIES_ID, series_id.clone());
        p.set_string(props::VERSION_LABEL, "1.0");
        p.set_boolean(props::IS_MAJOR_VERSION, true);
        p.set_boolean(props::IS_PRIVATE_WORKING_COPY, false);
        p.set_datetime(props::CREATION_DATE, date);
        p.set_datetime(props::LAST_MODIFICATION_DATE, date);

        state.series.insert(
            series_id.clone(),
            Series {
                versions: vec![data.id.clone()],
                pwc: None,
                parents: vec![parent_id.clone()],
                major: 1,
                minor: 0,
            },
        );
        let id = data.id.clone();
        state.insert(data, None);
        state.refresh_series(&series_id);
        Ok(state.entry(&id)?.data.clone())
    }

    async fn delete_object(&self, id: &ObjectId, all_versions: bool) -> Result<()> {
        let mut state = self.state.write().await;
        state.deletions.push(id.clone());
        state.check_failure(FailPoint::Delete, id)?;

        if state.entry(id)?.data.is_folder() {
            if *id == self.info.root_folder_id {
                return Err(CmisError::NotSupported("the root folder cannot be deleted".to_string()));
            }
            if !state.children_of(id).is_empty() {
                return Err(CmisError::Conflict(format!("folder {} is not empty", id)));
            }
            state.objects.remove(id);
            return Ok(());
        }

        let series_id = state.series_id(id)?;
        if all_versions {
            state.remove_series(&series_id);
            return Ok(());
        }

        let series = state.series_mut(&series_id)?;
        if series.pwc.as_ref() == Some(id) {
            series.pwc = None;
        } else {
            series.versions.retain(|v| v != id);
        }
        if series.versions.is_empty() {
            state.remove_series(&series_id);
        } else {
            state.objects.remove(id);
            state.refresh_series(&series_id);
        }
        Ok(())
    }

    async fn remove_object_from_folder(&self, id: &ObjectId, folder_id: &ObjectId) -> Result<()> {
        let mut state = self.state.write().await;
        state.unfilings.push((id.clone(), folder_id.clone()));
        state.check_failure(FailPoint::Unfile, id)?;

        let series_id = state.series_id(id)?;
        let unfiling = self.info.capabilities.unfiling;
        let series = state.series_mut(&series_id)?;
        if !series.parents.contains(folder_id) {
            return Err(CmisError::InvalidState(format!("{} is not filed in {}", id, folder_id)));
        }
        if series.parents.len() == 1 && !unfiling {
            return Err(CmisError::NotSupported("repository does not support unfiling".to_string()));
        }
        series.parents.retain(|p| p != folder_id);
        Ok(())
    }

    async fn check_out(&self, id: &ObjectId) -> Result<ObjectData> {
        let mut state = self.state.write().await;
        state.check_failure(FailPoint::CheckOut, id)?;

        let series_id = state.series_id(id)?;
        if state.series(&series_id)?.pwc.is_some() {
            return Err(CmisError::Conflict(format!(
                "version series {} is already checked out",
                series_id
            )));
        }

        let (_, date) = state.tick();
        let source = state.entry(id)?;
        let content = source.content.clone();
        let mut pwc = clone_as(&source.data, new_id());
        let p = &mut pwc.properties;
        p.set_boolean(props::IS_PRIVATE_WORKING_COPY, true);
        p.set_boolean(props::IS_MAJOR_VERSION, false);
        p.set_string(props::VERSION_LABEL, "pwc");
        p.remove(props::CHECKIN_COMMENT);
        p.set_datetime(props::CREATION_DATE, date);

        let pwc_id = pwc.id.clone();
        state.series_mut(&series_id)?.pwc = Some(pwc_id.clone());
        state.insert(pwc, content);
        state.refresh_series(&series_id);
        Ok(state.entry(&pwc_id)?.data.clone())
    }

    async fn cancel_check_out(&self, pwc_id: &ObjectId) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_failure(FailPoint::CancelCheckOut, pwc_id)?;

        let series_id = state.current_pwc(pwc_id)?;
        state.series_mut(&series_id)?.pwc = None;
        state.objects.remove(pwc_id);
        state.refresh_series(&series_id);
        Ok(())
    }

    async fn check_in(&self, pwc_id: &ObjectId, request: &CheckInRequest) -> Result<ObjectData> {
        let mut state = self.state.write().await;
        state.check_failure(FailPoint::CheckIn, pwc_id)?;

        let series_id = state.current_pwc(pwc_id)?;
        let label = {
            let series = state.series_mut(&series_id)?;
            if request.major {
                series.major += 1;
                series.minor = 0;
            } else {
                series.minor += 1;
            }
            format!("{}.{}", series.major, series.minor)
        };

        let (_, date) = state.tick();
        let pwc = state
            .objects
            .remove(pwc_id)
            .ok_or_else(|| CmisError::ObjectNotFound(pwc_id.clone()))?;
        let mut version = clone_as(&pwc.data, new_id()).with_properties(&request.properties);
        let p = &mut version.properties;
        p.set_boolean(props::IS_PRIVATE_WORKING_COPY, false);
        p.set_boolean(props::IS_MAJOR_VERSION, request.major);
        p.set_string(props::VERSION_LABEL, label);
        p.set_string(props::CHECKIN_COMMENT, request.comment.clone());
        p.set_datetime(props::CREATION_DATE, date);

        let version_id = version.id.clone();
        {
            let series = state.series_mut(&series_id)?;
            series.pwc = None;
            series.versions.push(version_id.clone());
        }
        state.insert(version, pwc.content);
        state.refresh_series(&series_id);
        Ok(state.entry(&version_id)?.data.clone())
    }

    async fn all_versions(&self, id: &ObjectId) -> Result<Vec<ObjectData>> {
        let state = self.state.read().await;
        let series_id = state.series_id(id)?;
        let series = state.series(&series_id)?;
        series
            .versions
            .iter()
            .chain(series.pwc.iter())
            .map(|v| state.entry(v).map(|e| e.data.clone()))
            .collect()
    }

    async fn begin_upload(&self, id: &ObjectId, meta: &ContentMeta) -> Result<Box<dyn UploadSink>> {
        let state = self.state.read().await;
        state.check_failure(FailPoint::Upload, id)?;
        let entry = state.entry(id)?;
        if !entry.data.is_document() {
            return Err(CmisError::InvalidState(format!("{} is not a document", id)));
        }
        let has_content = entry.content.as_ref().is_some_and(|c| !c.data.is_empty());
        if !meta.overwrite && has_content {
            return Err(CmisError::Conflict(format!("{} already has content", id)));
        }

        Ok(Box::new(MemoryUploadSink {
            state: self.state.clone(),
            id: id.clone(),
            meta: meta.clone(),
            buffer: BytesMut::new(),
            chunks: 0,
            fail_after: state.upload_failures.get(id).copied(),
        }))
    }

    async fn open_download(&self, id: &ObjectId, stream_id: Option<&str>) -> Result<ContentStream> {
        let state = self.state.read().await;
        state.check_failure(FailPoint::Fetch, id)?;
        let entry = state.entry(id)?;

        let content = match stream_id {
            None => entry
                .content
                .as_ref()
                .ok_or_else(|| CmisError::InvalidState(format!("{} has no content stream", id)))?,
            Some(name) => entry
                .renditions
                .get(name)
                .ok_or_else(|| CmisError::ObjectNotFound(ObjectId::from(name)))?,
        };

        Ok(ContentStream::from_bytes(
            content.data.clone(),
            content.content_type.clone(),
            content.filename.clone(),
        ))
    }
}

/// Upload buffered until `finish`
struct MemoryUploadSink {
    state: Arc<RwLock<State>>,
    id: ObjectId,
    meta: ContentMeta,
    buffer: BytesMut,
    chunks: usize,
    fail_after: Option<usize>,
}

#[async_trait]
impl UploadSink for MemoryUploadSink {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        self.state.write().await.write_calls += 1;
        if self.fail_after.is_some_and(|limit| self.chunks >= limit) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset during upload",
            ))
            .into());
        }
        self.buffer.extend_from_slice(&chunk);
        self.chunks += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<ObjectData> {
        let mut state = self.state.write().await;
        let (_, date) = state.tick();
        let content = StoredContent {
            data: std::mem::take(&mut self.buffer).freeze(),
            content_type: self.meta.content_type.clone(),
            filename: self.meta.filename.clone(),
        };
        let entry = state
            .objects
            .get_mut(&self.id)
            .ok_or_else(|| CmisError::ObjectNotFound(self.id.clone()))?;
        apply_content(&mut entry.data, &content, date);
        entry.content = Some(content);
        Ok(entry.data.clone())
    }

    async fn abort(&mut self) {
        self.buffer.clear();
        self.state.write().await.aborted_uploads += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Properties {
        let mut p = Properties::new();
        p.set_string(props::NAME, name);
        p
    }

    #[tokio::test]
    async fn test_children_listed_in_creation_order() {
        let repo = MemoryRepository::new();
        let root = repo.root_id();
        let b = repo.create_document(&root, &named("b.txt")).await.unwrap();
        let a = repo.create_folder(&root, &named("a")).await.unwrap();

        let children = repo.children(&root).await.unwrap();
        let ids: Vec<_> = children.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let repo = MemoryRepository::new();
        let root = repo.root_id();
        repo.create_folder(&root, &named("dup")).await.unwrap();
        let err = repo.create_document(&root, &named("dup")).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_non_empty_folder_cannot_be_deleted() {
        let repo = MemoryRepository::new();
        let root = repo.root_id();
        let folder = repo.create_folder(&root, &named("f")).await.unwrap();
        repo.create_document(&folder.id, &named("d")).await.unwrap();

        let err = repo.delete_object(&folder.id, true).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Conflict);
        assert!(repo.contains(&folder.id).await);
    }

    #[tokio::test]
    async fn test_second_checkout_conflicts_server_side() {
        let repo = MemoryRepository::new();
        let doc = repo.create_document(&repo.root_id(), &named("d")).await.unwrap();
        let pwc = repo.check_out(&doc.id).await.unwrap();
        assert_eq!(pwc.properties.boolean(props::IS_PRIVATE_WORKING_COPY), Some(true));

        let err = repo.check_out(&doc.id).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_check_in_numbers_versions() {
        let repo = MemoryRepository::new();
        let doc = repo.create_document(&repo.root_id(), &named("d")).await.unwrap();

        let pwc = repo.check_out(&doc.id).await.unwrap();
        let minor = repo.check_in(&pwc.id, &CheckInRequest::new(false, "")).await.unwrap();
        assert_eq!(minor.properties.string(props::VERSION_LABEL), Some("1.1"));

        let pwc = repo.check_out(&minor.id).await.unwrap();
        let major = repo.check_in(&pwc.id, &CheckInRequest::new(true, "release")).await.unwrap();
        assert_eq!(major.properties.string(props::VERSION_LABEL), Some("2.0"));
        assert_eq!(major.properties.string(props::CHECKIN_COMMENT), Some("release"));

        // Only the latest version is listed in the folder
        let children = repo.children(&repo.root_id()).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, major.id);
    }
}
