//! Document handles and their operations
//!
//! A [`Document`] is a snapshot of one version, or of the private working
//! copy of its series. Snapshots are never refreshed behind the caller's
//! back: every operation that changes server state returns a new handle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWrite;

use crate::binding::ContentStream;
use crate::content::{ContentTransfer, ProgressCallback};
use crate::error::{CmisError, Result};
use crate::folder::{Folder, FolderOps};
use crate::object::{ObjectData, ObjectId};
use crate::properties::{props, Properties};
use crate::session::Session;
use crate::versioning::{CheckInRequest, CheckoutState, VersionHistory};

/// Snapshot of a document version or private working copy
#[derive(Debug, Clone)]
pub struct Document<'s> {
    session: &'s Session,
    data: ObjectData,
}

impl<'s> Document<'s> {
    pub(crate) fn new(session: &'s Session, data: ObjectData) -> Self {
        Self { session, data }
    }

    pub fn session(&self) -> &'s Session {
        self.session
    }

    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    pub fn into_data(self) -> ObjectData {
        self.data
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

    pub fn content_type(&self) -> Option<&str> {
        self.properties().string(props::CONTENT_STREAM_MIME_TYPE)
    }

    pub fn content_filename(&self) -> Option<&str> {
        self.properties().string(props::CONTENT_STREAM_FILE_NAME)
    }

    /// Content length in bytes, 0 when no content is set
    pub fn content_length(&self) -> i64 {
        self.properties()
            .integer(props::CONTENT_STREAM_LENGTH)
            .unwrap_or(0)
    }

    pub fn is_private_working_copy(&self) -> bool {
        self.properties()
            .boolean(props::IS_PRIVATE_WORKING_COPY)
            .unwrap_or(false)
    }

    pub fn version_series_id(&self) -> Option<&str> {
        self.properties().string(props::VERSION_SERIES_ID)
    }

    pub fn version_label(&self) -> Option<&str> {
        self.properties().string(props::VERSION_LABEL)
    }

    pub fn is_major_version(&self) -> bool {
        self.properties()
            .boolean(props::IS_MAJOR_VERSION)
            .unwrap_or(false)
    }

    pub fn is_latest_version(&self) -> bool {
        self.properties()
            .boolean(props::IS_LATEST_VERSION)
            .unwrap_or(false)
    }

    pub fn checkin_comment(&self) -> Option<&str> {
        self.properties().string(props::CHECKIN_COMMENT)
    }

    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.properties().datetime(props::CREATION_DATE)
    }

    /// Series state as of this snapshot
    pub fn checkout_state(&self) -> CheckoutState {
        let checked_out = self.is_private_working_copy()
            || self
                .properties()
                .boolean(props::IS_VERSION_SERIES_CHECKED_OUT)
                .unwrap_or(false);
        if checked_out {
            CheckoutState::CheckedOut
        } else {
            CheckoutState::Released
        }
    }

    fn transfer(&self) -> ContentTransfer<'s> {
        ContentTransfer::new(self.session)
    }
}

impl std::fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Document Object:")?;
        writeln!(f)?;
        writeln!(f, "Id: {}", self.id())?;
        writeln!(f, "Name: {}", self.name())?;
        writeln!(f, "Content Type: {}", self.content_type().unwrap_or(""))?;
        writeln!(f, "Content Filename: {}", self.content_filename().unwrap_or(""))?;
        writeln!(f, "Content Length: {}", self.content_length())?;
        write!(
            f,
            "Version: {}{}",
            self.version_label().unwrap_or("-"),
            if self.is_private_working_copy() {
                " (private working copy)"
            } else {
                ""
            }
        )
    }
}

/// Operations available on documents
#[async_trait]
pub trait DocumentOps<'s> {
    /// Folders this document is filed in; empty when unfiled
    async fn parents(&self) -> Result<Vec<Folder<'s>>>;

    /// One path per parent folder
    async fn paths(&self) -> Result<Vec<String>>;

    /// Open the primary content stream or the rendition named by `stream_id`
    async fn content_stream(&self, stream_id: Option<&str>) -> Result<ContentStream>;

    /// Copy content into `writer` with progress reporting
    async fn download_to(
        &self,
        stream_id: Option<&str>,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
        progress: Option<&ProgressCallback>,
    ) -> Result<u64>;

    /// Replace the content stream; returns the updated snapshot
    async fn set_content_stream(
        &self,
        stream: ContentStream,
        overwrite: bool,
        progress: Option<&ProgressCallback>,
    ) -> Result<Document<'s>>;

    /// Check out the series, returning its private working copy
    async fn check_out(&self) -> Result<Document<'s>>;

    /// Discard this private working copy
    async fn cancel_checkout(&self) -> Result<()>;

    /// Promote this private working copy to a new version
    async fn check_in(
        &self,
        request: CheckInRequest,
        content: Option<ContentStream>,
    ) -> Result<Document<'s>>;

    /// Every version of the series, most recent first
    async fn all_versions(&self) -> Result<VersionHistory<'s>>;
}

#[async_trait]
impl<'s> DocumentOps<'s> for Document<'s> {
    async fn parents(&self) -> Result<Vec<Folder<'s>>> {
        let records = self.session.binding().object_parents(self.id()).await?;
        Ok(records
            .into_iter()
            .filter(|d| d.is_folder())
            .map(|d| Folder::new(self.session, d))
            .collect())
    }

    async fn paths(&self) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        for parent in self.parents().await? {
            let base = parent.path().await?;
            paths.push(join_path(&base, self.name()));
        }
        Ok(paths)
    }

    async fn content_stream(&self, stream_id: Option<&str>) -> Result<ContentStream> {
        self.transfer().download(&self.data, stream_id).await
    }

    async fn download_to(
        &self,
        stream_id: Option<&str>,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
        progress: Option<&ProgressCallback>,
    ) -> Result<u64> {
        self.transfer()
            .download_to(&self.data, stream_id, writer, progress)
            .await
    }

    async fn set_content_stream(
        &self,
        stream: ContentStream,
        overwrite: bool,
        progress: Option<&ProgressCallback>,
    ) -> Result<Document<'s>> {
        let updated = self
            .transfer()
            .upload(&self.data, stream, overwrite, progress)
            .await?;
        Ok(Document::new(self.session, updated))
    }

    async fn check_out(&self) -> Result<Document<'s>> {
        // Series flags on a released version may be stale; the repository decides
        if self.is_private_working_copy() {
            return Err(CmisError::Conflict(format!(
                "{} is already a private working copy",
                self.id()
            )));
        }

        let mut pwc = self.session.binding().check_out(self.id()).await?;
        if !pwc.properties.contains(props::IS_PRIVATE_WORKING_COPY) {
            pwc.properties.set_boolean(props::IS_PRIVATE_WORKING_COPY, true);
        }
        tracing::info!("Checked out {} as {}", self.id(), pwc.id);
        Ok(Document::new(self.session, pwc))
    }

    async fn cancel_checkout(&self) -> Result<()> {
        if !self.is_private_working_copy() {
            return Err(CmisError::InvalidState(format!(
                "{} is not a private working copy",
                self.id()
            )));
        }

        self.session.binding().cancel_check_out(self.id()).await?;
        tracing::info!("Cancelled checkout {}", self.id());
        Ok(())
    }

    async fn check_in(
        &self,
        request: CheckInRequest,
        content: Option<ContentStream>,
    ) -> Result<Document<'s>> {
        if !self.is_private_working_copy() {
            return Err(CmisError::InvalidState(format!(
                "{} is not a private working copy",
                self.id()
            )));
        }

        // Content goes to the working copy first; a failed upload leaves the
        // series checked out and creates no version.
        if let Some(stream) = content {
            self.transfer().upload(&self.data, stream, true, None).await?;
        }

        let version = self
            .session
            .binding()
            .check_in(self.id(), &request)
            .await?;
        tracing::info!(
            "Checked in {} as {} (version {})",
            self.id(),
            version.id,
            version
                .properties
                .string(props::VERSION_LABEL)
                .unwrap_or("?")
        );
        Ok(Document::new(self.session, version))
    }

    async fn all_versions(&self) -> Result<VersionHistory<'s>> {
        let records = self.session.binding().all_versions(self.id()).await?;
        Ok(VersionHistory::new(self.session, records))
    }
}

/// Append a name to a folder path
pub(crate) fn join_path(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}
