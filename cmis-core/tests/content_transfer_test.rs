//! Content stream transfer tests
//!
//! Tests cover:
//! - Non-overwrite conflicts issue zero bytes
//! - Progress reporting and caller cancellation
//! - Transport failure mid-upload leaves the snapshot untouched
//! - Capability gating
//! - Downloads of primary content and renditions

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cmis_core::{
    props, Capabilities, ContentStream, Document, DocumentOps, ErrorKind, FolderOps,
    MemoryRepository, ProgressCallback, Properties, ServerState, Session, SessionConfig,
    TransferProgress, Updatability,
};
use tokio::io::AsyncReadExt;

async fn setup_with(capabilities: Capabilities, config: SessionConfig) -> (Arc<MemoryRepository>, Session) {
    let repo = Arc::new(MemoryRepository::with_capabilities(capabilities));
    let session = Session::open(repo.clone(), config).await.unwrap();
    (repo, session)
}

async fn setup() -> (Arc<MemoryRepository>, Session) {
    setup_with(Capabilities::default(), SessionConfig::default().with_chunk_size(4)).await
}

fn named(name: &str) -> Properties {
    let mut p = Properties::new();
    p.set_string(props::NAME, name);
    p
}

async fn empty_doc<'s>(session: &'s Session, name: &str) -> Document<'s> {
    let root = session.root_folder().await.unwrap();
    root.create_document(&named(name), None).await.unwrap()
}

fn text(data: &'static [u8]) -> ContentStream {
    ContentStream::from_bytes(data, "text/plain", "file.txt")
}

/// Callback that records every report and stops on the `stop_at`-th call.
fn stopping_at(stop_at: usize) -> (ProgressCallback, Arc<Mutex<Vec<TransferProgress>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let calls = AtomicUsize::new(0);
    let log = seen.clone();
    let cb = ProgressCallback::new(move |p| {
        log.lock().unwrap().push(p);
        if calls.fetch_add(1, Ordering::SeqCst) + 1 == stop_at {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    (cb, seen)
}

// ============================================================
// Upload
// ============================================================

#[tokio::test]
async fn test_upload_sets_content_and_returns_new_snapshot() {
    let (repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    assert_eq!(doc.content_length(), 0);

    let updated = doc.set_content_stream(text(b"hello world"), false, None).await.unwrap();
    assert_eq!(updated.content_length(), 11);
    assert_eq!(updated.content_type(), Some("text/plain"));
    assert_eq!(updated.content_filename(), Some("file.txt"));
    // Old snapshot untouched
    assert_eq!(doc.content_length(), 0);

    assert_eq!(repo.content(doc.id()).await.unwrap(), &b"hello world"[..]);
    // 11 bytes in 4-byte chunks
    assert_eq!(repo.write_calls().await, 3);
}

#[tokio::test]
async fn test_no_overwrite_conflict_issues_zero_bytes() {
    let (repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    let doc = doc.set_content_stream(text(b"first"), true, None).await.unwrap();
    let writes_before = repo.write_calls().await;

    let (cb, seen) = stopping_at(usize::MAX);
    let err = doc
        .set_content_stream(text(b"second"), false, Some(&cb))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(repo.write_calls().await, writes_before);
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(repo.content(doc.id()).await.unwrap(), &b"first"[..]);
}

#[tokio::test]
async fn test_overwrite_replaces_content() {
    let (repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    let doc = doc.set_content_stream(text(b"first"), true, None).await.unwrap();

    let doc = doc.set_content_stream(text(b"second!"), true, None).await.unwrap();
    assert_eq!(doc.content_length(), 7);
    assert_eq!(repo.content(doc.id()).await.unwrap(), &b"second!"[..]);
}

#[tokio::test]
async fn test_progress_reports_cumulative_bytes() {
    let (_repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    let (cb, seen) = stopping_at(usize::MAX);

    doc.set_content_stream(text(b"0123456789"), true, Some(&cb)).await.unwrap();

    let seen = seen.lock().unwrap();
    let sent: Vec<u64> = seen.iter().map(|p| p.transferred).collect();
    assert_eq!(sent, vec![0, 4, 8, 10]);
    assert!(seen.iter().all(|p| p.expected == 10));
}

#[tokio::test]
async fn test_unknown_length_reports_zero_expected() {
    let (_repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    let (cb, seen) = stopping_at(usize::MAX);

    let stream = ContentStream::new(std::io::Cursor::new(b"abcdef".to_vec()), "text/plain", "x", None);
    doc.set_content_stream(stream, true, Some(&cb)).await.unwrap();

    assert!(seen.lock().unwrap().iter().all(|p| p.expected == 0));
}

#[tokio::test]
async fn test_cancel_on_second_callback_stops_writes() {
    let (repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    let (cb, seen) = stopping_at(2);

    let err = doc
        .set_content_stream(text(b"0123456789abcdef"), true, Some(&cb))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(err.server_state(), Some(ServerState::Unknown));
    assert_eq!(seen.lock().unwrap().len(), 2);
    // One chunk went out before the callback asked to stop, nothing after
    assert_eq!(repo.write_calls().await, 1);
    assert_eq!(repo.aborted_uploads().await, 1);
    assert!(repo.content(doc.id()).await.is_none());
}

#[tokio::test]
async fn test_cancel_before_start_leaves_server_unchanged() {
    let (repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    let cb = ProgressCallback::from_raw(|_, _, _, _| 1);

    let err = doc.set_content_stream(text(b"data"), true, Some(&cb)).await.unwrap_err();
    assert_eq!(err.server_state(), Some(ServerState::Unchanged));
    assert_eq!(repo.write_calls().await, 0);
    assert_eq!(repo.aborted_uploads().await, 0);
}

#[tokio::test]
async fn test_transport_failure_mid_upload() {
    let (repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    repo.fail_upload_after(doc.id(), 2).await;

    let err = doc
        .set_content_stream(text(b"0123456789abcdef"), true, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert_eq!(doc.content_length(), 0);
    assert!(repo.content(doc.id()).await.is_none());
    assert_eq!(repo.aborted_uploads().await, 1);
}

#[tokio::test]
async fn test_session_default_callback_is_used() {
    let (_repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    let (cb, seen) = stopping_at(usize::MAX);
    session.set_progress_callback(cb);

    doc.set_content_stream(text(b"12345678"), true, None).await.unwrap();
    assert_eq!(seen.lock().unwrap().last().unwrap().transferred, 8);

    session.clear_progress_callback();
    let count = seen.lock().unwrap().len();
    doc.set_content_stream(text(b"12345678"), true, None).await.unwrap();
    assert_eq!(seen.lock().unwrap().len(), count);
}

#[tokio::test]
async fn test_progress_interval_throttles_callbacks() {
    let config = SessionConfig::default().with_chunk_size(2).with_progress_interval(6);
    let (_repo, session) = setup_with(Capabilities::default(), config).await;
    let doc = empty_doc(&session, "a.txt").await;
    let (cb, seen) = stopping_at(usize::MAX);

    doc.set_content_stream(text(b"0123456789"), true, Some(&cb)).await.unwrap();
    let sent: Vec<u64> = seen.lock().unwrap().iter().map(|p| p.transferred).collect();
    assert_eq!(sent, vec![0, 6, 10]);
}

// ============================================================
// Capabilities
// ============================================================

#[tokio::test]
async fn test_updatability_none_is_not_supported() {
    let caps = Capabilities {
        content_stream_updatability: Updatability::None,
        ..Capabilities::default()
    };
    let (repo, session) = setup_with(caps, SessionConfig::default()).await;
    let doc = empty_doc(&session, "a.txt").await;

    let err = doc.set_content_stream(text(b"x"), true, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSupported);
    assert_eq!(repo.write_calls().await, 0);
}

#[tokio::test]
async fn test_pwc_only_updatability() {
    let caps = Capabilities {
        content_stream_updatability: Updatability::PwcOnly,
        ..Capabilities::default()
    };
    let (_repo, session) = setup_with(caps, SessionConfig::default()).await;
    let doc = empty_doc(&session, "a.txt").await;

    let err = doc.set_content_stream(text(b"x"), true, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSupported);

    let pwc = doc.check_out().await.unwrap();
    let pwc = pwc.set_content_stream(text(b"draft"), true, None).await.unwrap();
    assert_eq!(pwc.content_length(), 5);
}

#[tokio::test]
async fn test_create_document_with_failed_upload_leaves_nothing() {
    let caps = Capabilities {
        content_stream_updatability: Updatability::None,
        ..Capabilities::default()
    };
    let (_repo, session) = setup_with(caps, SessionConfig::default()).await;
    let root = session.root_folder().await.unwrap();

    let err = root
        .create_document(&named("a.txt"), Some(text(b"x")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSupported);
    assert!(root.children().await.unwrap().is_empty());
}

// ============================================================
// Download
// ============================================================

#[tokio::test]
async fn test_download_primary_stream() {
    let (_repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    let doc = doc.set_content_stream(text(b"payload"), true, None).await.unwrap();

    let mut stream = doc.content_stream(None).await.unwrap();
    assert_eq!(stream.content_type, "text/plain");
    assert_eq!(stream.length, Some(7));
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    assert_eq!(out, b"payload");
}

#[tokio::test]
async fn test_download_without_content_is_invalid_state() {
    let (_repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;

    let err = doc.content_stream(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let mut out: Vec<u8> = Vec::new();
    let err = doc.download_to(None, &mut out, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_download_rendition() {
    let (repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    repo.add_rendition(doc.id(), "thumbnail", &b"PNG"[..], "image/png")
        .await
        .unwrap();

    let mut stream = doc.content_stream(Some("thumbnail")).await.unwrap();
    assert_eq!(stream.content_type, "image/png");
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    assert_eq!(out, b"PNG");

    let err = doc.content_stream(Some("missing")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ObjectNotFound);
}

#[tokio::test]
async fn test_download_to_writer_with_progress() {
    let (_repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    let doc = doc.set_content_stream(text(b"0123456789"), true, None).await.unwrap();
    let (cb, seen) = stopping_at(usize::MAX);

    let mut out: Vec<u8> = Vec::new();
    let copied = doc.download_to(None, &mut out, Some(&cb)).await.unwrap();
    assert_eq!(copied, 10);
    assert_eq!(out, b"0123456789");
    assert_eq!(seen.lock().unwrap().last().unwrap().transferred, 10);
}

#[tokio::test]
async fn test_download_cancel() {
    let (_repo, session) = setup().await;
    let doc = empty_doc(&session, "a.txt").await;
    let doc = doc.set_content_stream(text(b"0123456789"), true, None).await.unwrap();
    let (cb, _seen) = stopping_at(2);

    let mut out: Vec<u8> = Vec::new();
    let err = doc.download_to(None, &mut out, Some(&cb)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(err.server_state(), Some(ServerState::Unchanged));
    assert_eq!(out.len(), 4);
}
