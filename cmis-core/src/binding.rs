//! Protocol binding abstraction
//!
//! The object model never builds requests itself. Everything that reaches the
//! repository goes through [`Binding`], which a protocol-specific layer (or
//! the in-memory reference repository) implements.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

use crate::error::Result;
use crate::object::{ObjectData, ObjectId};
use crate::properties::Properties;
use crate::versioning::CheckInRequest;

/// Whether and when a document's content stream may be replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Updatability {
    None,
    Anytime,
    PwcOnly,
}

/// Repository capabilities relevant to the object model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub content_stream_updatability: Updatability,
    pub multifiling: bool,
    pub unfiling: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            content_stream_updatability: Updatability::Anytime,
            multifiling: true,
            unfiling: true,
        }
    }
}

/// Repository description returned when a session is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: String,
    pub name: String,
    pub root_folder_id: ObjectId,
    pub capabilities: Capabilities,
}

/// Declared metadata of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMeta {
    pub content_type: String,
    pub filename: String,
    /// Total size, if the source knows it
    pub length: Option<u64>,
    pub overwrite: bool,
}

/// Boxed byte source
pub type ContentReader = Pin<Box<dyn AsyncRead + Send>>;

/// A readable content stream with its declared metadata
///
/// Used both as the source of an upload and as the result of a download.
pub struct ContentStream {
    reader: ContentReader,
    pub content_type: String,
    pub filename: String,
    /// Total size, if known
    pub length: Option<u64>,
}

impl ContentStream {
    /// Wrap any async reader
    pub fn new(
        reader: impl AsyncRead + Send + 'static,
        content_type: impl Into<String>,
        filename: impl Into<String>,
        length: Option<u64>,
    ) -> Self {
        Self {
            reader: Box::pin(reader),
            content_type: content_type.into(),
            filename: filename.into(),
            length,
        }
    }

    /// In-memory content of known length
    pub fn from_bytes(
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let data: Bytes = data.into();
        let length = data.len() as u64;
        Self::new(std::io::Cursor::new(data), content_type, filename, Some(length))
    }

    /// Metadata to announce to the binding for an upload
    pub fn meta(&self, overwrite: bool) -> ContentMeta {
        ContentMeta {
            content_type: self.content_type.clone(),
            filename: self.filename.clone(),
            length: self.length,
            overwrite,
        }
    }
}

impl AsyncRead for ContentStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        self.get_mut().reader.as_mut().poll_read(cx, buf)
    }
}

impl std::fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream")
            .field("content_type", &self.content_type)
            .field("filename", &self.filename)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Server-side end of an upload in progress
#[async_trait]
pub trait UploadSink: Send {
    /// Send one chunk
    async fn write(&mut self, chunk: Bytes) -> Result<()>;

    /// Complete the upload and return the updated document record
    async fn finish(&mut self) -> Result<ObjectData>;

    /// Give up on the upload; what the server keeps is binding-defined
    async fn abort(&mut self);
}

/// Repository calls consumed by the object model
///
/// Implementations report server-side rule violations with the matching
/// error kind, e.g. a second checkout of the same series is `Conflict`.
#[async_trait]
pub trait Binding: Send + Sync {
    /// Describe the repository
    async fn repository_info(&self) -> Result<RepositoryInfo>;

    /// Get an object by ID
    async fn fetch_object(&self, id: &ObjectId) -> Result<ObjectData>;

    /// Folders the object is filed in
    async fn object_parents(&self, id: &ObjectId) -> Result<Vec<ObjectData>>;

    /// Direct children of a folder
    async fn children(&self, folder_id: &ObjectId) -> Result<Vec<ObjectData>>;

    /// Create a folder under `parent_id`
    async fn create_folder(&self, parent_id: &ObjectId, properties: &Properties) -> Result<ObjectData>;

    /// Create a document without content under `parent_id`
    async fn create_document(&self, parent_id: &ObjectId, properties: &Properties) -> Result<ObjectData>;

    /// Delete an object; for documents `all_versions` selects the whole series
    async fn delete_object(&self, id: &ObjectId, all_versions: bool) -> Result<()>;

    /// Remove one filing of an object without deleting it
    async fn remove_object_from_folder(&self, id: &ObjectId, folder_id: &ObjectId) -> Result<()>;

    /// Create the private working copy of a document's series
    async fn check_out(&self, id: &ObjectId) -> Result<ObjectData>;

    /// Discard a private working copy
    async fn cancel_check_out(&self, pwc_id: &ObjectId) -> Result<()>;

    /// Promote a private working copy to a new version
    async fn check_in(&self, pwc_id: &ObjectId, request: &CheckInRequest) -> Result<ObjectData>;

    /// Every version of the object's series, in any order
    async fn all_versions(&self, id: &ObjectId) -> Result<Vec<ObjectData>>;

    /// Start replacing a document's content stream
    async fn begin_upload(&self, id: &ObjectId, meta: &ContentMeta) -> Result<Box<dyn UploadSink>>;

    /// Open the primary content stream, or the rendition named by `stream_id`
    async fn open_download(&self, id: &ObjectId, stream_id: Option<&str>) -> Result<ContentStream>;
}
