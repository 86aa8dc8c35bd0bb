//! Content stream transfer
//!
//! Moves bytes between the caller and the repository for one document,
//! reporting progress through a [`ProgressCallback`]. A callback asking to
//! stop aborts the transfer within one chunk and surfaces as
//! [`CmisError::Cancelled`]. Nothing in memory is mutated unless the whole
//! transfer succeeds.

use bytes::Bytes;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::binding::{ContentStream, UploadSink, Updatability};
use crate::error::{CmisError, Result, ServerState};
use crate::object::ObjectData;
use crate::properties::props;
use crate::session::Session;

/// Snapshot handed to a progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Cumulative bytes transferred
    pub transferred: u64,
    /// Best-known total, 0 when unknown
    pub expected: u64,
}

type ProgressFn = dyn Fn(TransferProgress) -> ControlFlow<()> + Send + Sync;

/// Caller-supplied progress observer
///
/// Invoked synchronously on the task driving the transfer; returning
/// `ControlFlow::Break` cancels it.
#[derive(Clone)]
pub struct ProgressCallback(Arc<ProgressFn>);

impl ProgressCallback {
    pub fn new(f: impl Fn(TransferProgress) -> ControlFlow<()> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Adapt a four-argument callback `(sent, expected, reserved, reserved)`
    /// where any non-zero return cancels.
    pub fn from_raw(f: impl Fn(u64, u64, u64, u64) -> i32 + Send + Sync + 'static) -> Self {
        Self::new(move |p| {
            if f(p.transferred, p.expected, 0, 0) != 0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    /// Invoke the callback
    pub fn report(&self, progress: TransferProgress) -> ControlFlow<()> {
        (self.0)(progress)
    }
}

impl std::fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProgressCallback")
    }
}

/// Throttles callback invocations to the configured interval
struct ProgressReporter {
    callback: Option<ProgressCallback>,
    expected: u64,
    interval: u64,
    last_reported: u64,
}

impl ProgressReporter {
    fn new(callback: Option<ProgressCallback>, expected: u64, interval: u64) -> Self {
        Self {
            callback,
            expected,
            interval,
            last_reported: 0,
        }
    }

    fn emit(&mut self, transferred: u64) -> ControlFlow<()> {
        self.last_reported = transferred;
        match &self.callback {
            Some(cb) => cb.report(TransferProgress {
                transferred,
                expected: self.expected,
            }),
            None => ControlFlow::Continue(()),
        }
    }

    fn start(&mut self) -> ControlFlow<()> {
        self.emit(0)
    }

    fn advance(&mut self, transferred: u64) -> ControlFlow<()> {
        if transferred - self.last_reported >= self.interval.max(1) {
            self.emit(transferred)
        } else {
            ControlFlow::Continue(())
        }
    }

    /// Final report; the transfer is already complete so a stop request is moot.
    fn finish(&mut self, transferred: u64) {
        if transferred != self.last_reported {
            let _ = self.emit(transferred);
        }
    }
}

/// Content transfer bound to a session
pub struct ContentTransfer<'s> {
    session: &'s Session,
}

impl<'s> ContentTransfer<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    fn callback(&self, explicit: Option<&ProgressCallback>) -> Option<ProgressCallback> {
        explicit.cloned().or_else(|| self.session.progress_callback())
    }

    /// Check that the repository lets this document's content be replaced.
    fn check_updatable(&self, document: &ObjectData) -> Result<()> {
        let is_pwc = document
            .properties
            .boolean(props::IS_PRIVATE_WORKING_COPY)
            .unwrap_or(false);
        match self.session.info().capabilities.content_stream_updatability {
            Updatability::Anytime => Ok(()),
            Updatability::PwcOnly if is_pwc => Ok(()),
            Updatability::PwcOnly => Err(CmisError::NotSupported(format!(
                "content of {} can only be set on a private working copy",
                document.id
            ))),
            Updatability::None => Err(CmisError::NotSupported(
                "repository does not allow content stream updates".to_string(),
            )),
        }
    }

    /// Replace the content stream of `document`, returning the updated record.
    pub async fn upload(
        &self,
        document: &ObjectData,
        mut stream: ContentStream,
        overwrite: bool,
        progress: Option<&ProgressCallback>,
    ) -> Result<ObjectData> {
        self.check_updatable(document)?;

        let current_length = document
            .properties
            .integer(props::CONTENT_STREAM_LENGTH)
            .unwrap_or(0);
        if !overwrite && current_length > 0 {
            return Err(CmisError::Conflict(format!(
                "{} already has a content stream of {} bytes",
                document.id, current_length
            )));
        }

        let mut reporter = ProgressReporter::new(
            self.callback(progress),
            stream.length.unwrap_or(0),
            self.session.config().progress_interval,
        );
        if reporter.start().is_break() {
            tracing::warn!("Upload to {} cancelled before start", document.id);
            return Err(CmisError::Cancelled {
                bytes_sent: 0,
                server_state: ServerState::Unchanged,
            });
        }

        tracing::debug!(
            "Uploading {} ({}) to {}",
            stream.filename,
            stream.content_type,
            document.id
        );
        let meta = stream.meta(overwrite);
        let mut sink = self
            .session
            .binding()
            .begin_upload(&document.id, &meta)
            .await?;

        let sent = match self.pump(&mut stream, sink.as_mut(), &mut reporter).await {
            Ok(sent) => sent,
            Err(e) => {
                sink.abort().await;
                if let CmisError::Cancelled { bytes_sent, .. } = &e {
                    tracing::warn!(
                        "Upload to {} cancelled after {} bytes, server state unknown",
                        document.id,
                        bytes_sent
                    );
                }
                return Err(e);
            }
        };

        let updated = sink.finish().await?;
        reporter.finish(sent);
        tracing::debug!("Uploaded {} bytes to {}", sent, document.id);
        Ok(updated)
    }

    async fn pump(
        &self,
        stream: &mut ContentStream,
        sink: &mut dyn UploadSink,
        reporter: &mut ProgressReporter,
    ) -> Result<u64> {
        let mut buf = vec![0u8; self.session.config().chunk_size];
        let mut sent = 0u64;
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                return Ok(sent);
            }
            sink.write(Bytes::copy_from_slice(&buf[..n])).await?;
            sent += n as u64;
            if reporter.advance(sent).is_break() {
                return Err(CmisError::Cancelled {
                    bytes_sent: sent,
                    server_state: ServerState::Unknown,
                });
            }
        }
    }

    /// Open the primary content stream or the named rendition.
    pub async fn download(&self, document: &ObjectData, stream_id: Option<&str>) -> Result<ContentStream> {
        tracing::debug!(
            "Opening content of {} (stream {})",
            document.id,
            stream_id.unwrap_or("primary")
        );
        self.session
            .binding()
            .open_download(&document.id, stream_id)
            .await
    }

    /// Copy a content stream into `writer`, returning the number of bytes copied.
    pub async fn download_to<W>(
        &self,
        document: &ObjectData,
        stream_id: Option<&str>,
        writer: &mut W,
        progress: Option<&ProgressCallback>,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let mut reporter = ProgressReporter::new(
            self.callback(progress),
            0,
            self.session.config().progress_interval,
        );
        if reporter.start().is_break() {
            return Err(CmisError::Cancelled {
                bytes_sent: 0,
                server_state: ServerState::Unchanged,
            });
        }

        let mut source = self.download(document, stream_id).await?;
        reporter.expected = source.length.unwrap_or(0);

        let received = copy_with_progress(&mut source, writer, self.session.config().chunk_size, &mut reporter).await?;
        writer.flush().await?;
        reporter.finish(received);
        Ok(received)
    }
}

async fn copy_with_progress<R, W>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
    reporter: &mut ProgressReporter,
) -> Result<u64>
where
    R: AsyncRead + Unpin + Send + ?Sized,
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    let mut buf = vec![0u8; chunk_size];
    let mut received = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(received);
        }
        writer.write_all(&buf[..n]).await?;
        received += n as u64;
        if reporter.advance(received).is_break() {
            // Downloads never change server state
            return Err(CmisError::Cancelled {
                bytes_sent: received,
                server_state: ServerState::Unchanged,
            });
        }
    }
}
