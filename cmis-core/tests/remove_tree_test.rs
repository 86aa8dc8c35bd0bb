//! Folder tree removal tests
//!
//! Tests cover:
//! - Root folder rejection
//! - Depth-first order (children before their folder)
//! - Unfile policies for single- and multi-filed documents
//! - continueOnError on and off
//! - allVersions targeting

use std::sync::Arc;

use cmis_core::{
    props, CheckInRequest, DocumentOps, ErrorKind, FailPoint, Folder, FolderOps,
    MemoryRepository, ObjectId, Properties, RemoveTreeOptions, Session, SessionConfig,
    UnfileObjects,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn setup() -> (Arc<MemoryRepository>, Session) {
    init_tracing();
    let repo = Arc::new(MemoryRepository::new());
    let session = Session::open(repo.clone(), SessionConfig::default())
        .await
        .unwrap();
    (repo, session)
}

fn named(name: &str) -> Properties {
    let mut p = Properties::new();
    p.set_string(props::NAME, name);
    p
}

/// Folder `tree` under root holding documents `a`, `b`, `c` in that order.
async fn three_documents<'s>(session: &'s Session) -> (Folder<'s>, Vec<ObjectId>) {
    let root = session.root_folder().await.unwrap();
    let tree = root.create_folder(&named("tree")).await.unwrap();
    let mut ids = Vec::new();
    for name in ["a", "b", "c"] {
        let doc = tree.create_document(&named(name), None).await.unwrap();
        ids.push(doc.id().clone());
    }
    (tree, ids)
}

fn options(unfile: UnfileObjects, continue_on_error: bool) -> RemoveTreeOptions {
    RemoveTreeOptions {
        unfile,
        continue_on_error,
        ..Default::default()
    }
}

// ============================================================
// Preconditions
// ============================================================

#[tokio::test]
async fn test_root_folder_is_rejected() {
    let (repo, session) = setup().await;
    let root = session.root_folder().await.unwrap();
    root.create_document(&named("keep"), None).await.unwrap();

    let err = root.remove_tree(RemoveTreeOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert!(repo.deletions().await.is_empty());
}

#[tokio::test]
async fn test_empty_folder_is_removed() {
    let (repo, session) = setup().await;
    let root = session.root_folder().await.unwrap();
    let empty = root.create_folder(&named("empty")).await.unwrap();

    let failed = empty.remove_tree(RemoveTreeOptions::default()).await.unwrap();
    assert!(failed.is_empty());
    assert!(!repo.contains(empty.id()).await);
}

// ============================================================
// Traversal order
// ============================================================

#[tokio::test]
async fn test_depth_first_children_before_folder() {
    let (repo, session) = setup().await;
    let root = session.root_folder().await.unwrap();
    let top = root.create_folder(&named("top")).await.unwrap();
    let d1 = top.create_document(&named("d1"), None).await.unwrap();
    let sub = top.create_folder(&named("sub")).await.unwrap();
    let d2 = sub.create_document(&named("d2"), None).await.unwrap();
    let d3 = top.create_document(&named("d3"), None).await.unwrap();

    let failed = top.remove_tree(RemoveTreeOptions::default()).await.unwrap();
    assert!(failed.is_empty());

    assert_eq!(
        repo.deletions().await,
        vec![
            d1.id().clone(),
            d2.id().clone(),
            sub.id().clone(),
            d3.id().clone(),
            top.id().clone(),
        ]
    );
    assert_eq!(root.children().await.unwrap().len(), 0);
}

// ============================================================
// Unfile policy
// ============================================================

#[tokio::test]
async fn test_single_filed_unfile_equals_delete() {
    for policy in [UnfileObjects::Unfile, UnfileObjects::DeleteSingleFiled, UnfileObjects::Delete] {
        let (repo, session) = setup().await;
        let (tree, ids) = three_documents(&session).await;

        let failed = tree.remove_tree(options(policy, false)).await.unwrap();
        assert!(failed.is_empty(), "policy {:?}", policy);
        for id in &ids {
            assert!(!repo.contains(id).await, "policy {:?} kept {}", policy, id);
        }
        assert!(repo.unfilings().await.is_empty());
        assert!(!repo.contains(tree.id()).await);
    }
}

#[tokio::test]
async fn test_multi_filed_document_policies() {
    let cases = [
        (UnfileObjects::Unfile, true),
        (UnfileObjects::DeleteSingleFiled, true),
        (UnfileObjects::Delete, false),
    ];

    for (policy, survives) in cases {
        let (repo, session) = setup().await;
        let root = session.root_folder().await.unwrap();
        let tree = root.create_folder(&named("tree")).await.unwrap();
        let elsewhere = root.create_folder(&named("elsewhere")).await.unwrap();
        let shared = tree.create_document(&named("shared"), None).await.unwrap();
        let single = tree.create_document(&named("single"), None).await.unwrap();
        repo.add_parent(shared.id(), elsewhere.id()).await.unwrap();

        let failed = tree.remove_tree(options(policy, false)).await.unwrap();
        assert!(failed.is_empty(), "policy {:?}", policy);
        assert_eq!(repo.contains(shared.id()).await, survives, "policy {:?}", policy);
        assert!(!repo.contains(single.id()).await);
        assert!(!repo.contains(tree.id()).await);

        if survives {
            let parents = shared.parents().await.unwrap();
            assert_eq!(parents.len(), 1);
            assert_eq!(parents[0].id(), elsewhere.id());
        }
    }
}

// ============================================================
// Partial failure
// ============================================================

#[tokio::test]
async fn test_stop_on_first_failure() {
    let (repo, session) = setup().await;
    let (tree, ids) = three_documents(&session).await;
    repo.fail(FailPoint::Delete, &ids[1]).await;

    let failed = tree.remove_tree(options(UnfileObjects::Delete, false)).await.unwrap();
    assert_eq!(failed, vec![ids[1].clone()]);

    // The sibling after the failure was never attempted
    assert_eq!(repo.deletions().await, vec![ids[0].clone(), ids[1].clone()]);
    assert!(repo.contains(&ids[2]).await);
    assert!(repo.contains(tree.id()).await);
}

#[tokio::test]
async fn test_continue_on_error_attempts_all_siblings() {
    let (repo, session) = setup().await;
    let (tree, ids) = three_documents(&session).await;
    repo.fail(FailPoint::Delete, &ids[1]).await;

    let failed = tree.remove_tree(options(UnfileObjects::Delete, true)).await.unwrap();

    assert_eq!(repo.deletions().await, ids);
    assert!(!repo.contains(&ids[0]).await);
    assert!(repo.contains(&ids[1]).await);
    assert!(!repo.contains(&ids[2]).await);
    // The folder still holds the failed child
    assert_eq!(failed, vec![ids[1].clone(), tree.id().clone()]);
}

#[tokio::test]
async fn test_continue_on_error_collects_every_failure() {
    let (repo, session) = setup().await;
    let root = session.root_folder().await.unwrap();
    let top = root.create_folder(&named("top")).await.unwrap();
    let sub = top.create_folder(&named("sub")).await.unwrap();
    let bad_deep = sub.create_document(&named("bad-deep"), None).await.unwrap();
    let ok = top.create_document(&named("ok"), None).await.unwrap();
    let bad = top.create_document(&named("bad"), None).await.unwrap();
    repo.fail(FailPoint::Delete, bad_deep.id()).await;
    repo.fail(FailPoint::Parents, bad.id()).await;

    let failed = top.remove_tree(options(UnfileObjects::Delete, true)).await.unwrap();

    assert_eq!(
        failed,
        vec![
            bad_deep.id().clone(),
            sub.id().clone(),
            bad.id().clone(),
            top.id().clone(),
        ]
    );
    assert!(!repo.contains(ok.id()).await);
}

#[tokio::test]
async fn test_unenumerable_folder_is_reported() {
    let (repo, session) = setup().await;
    let root = session.root_folder().await.unwrap();
    let top = root.create_folder(&named("top")).await.unwrap();
    repo.fail(FailPoint::Children, top.id()).await;

    let failed = top.remove_tree(RemoveTreeOptions::default()).await.unwrap();
    assert_eq!(failed, vec![top.id().clone()]);
    assert!(repo.deletions().await.is_empty());
}

// ============================================================
// allVersions
// ============================================================

#[tokio::test]
async fn test_all_versions_false_keeps_older_versions() {
    let (repo, session) = setup().await;
    let root = session.root_folder().await.unwrap();
    let tree = root.create_folder(&named("tree")).await.unwrap();
    let v1 = tree.create_document(&named("doc"), None).await.unwrap();
    let v2 = v1
        .check_out()
        .await
        .unwrap()
        .check_in(CheckInRequest::new(false, ""), None)
        .await
        .unwrap();

    let opts = RemoveTreeOptions {
        all_versions: false,
        ..Default::default()
    };
    let failed = tree.remove_tree(opts).await.unwrap();

    // Only the listed (latest) version went; the older one now heads the
    // series and is still filed, so the folder stays.
    assert!(!repo.contains(v2.id()).await);
    assert!(repo.contains(v1.id()).await);
    assert_eq!(failed, vec![tree.id().clone()]);
}

#[tokio::test]
async fn test_all_versions_true_removes_series() {
    let (repo, session) = setup().await;
    let root = session.root_folder().await.unwrap();
    let tree = root.create_folder(&named("tree")).await.unwrap();
    let v1 = tree.create_document(&named("doc"), None).await.unwrap();
    let v2 = v1
        .check_out()
        .await
        .unwrap()
        .check_in(CheckInRequest::new(true, ""), None)
        .await
        .unwrap();

    let failed = tree.remove_tree(RemoveTreeOptions::default()).await.unwrap();
    assert!(failed.is_empty());
    assert!(!repo.contains(v1.id()).await);
    assert!(!repo.contains(v2.id()).await);
}
