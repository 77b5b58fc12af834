//! Integration tests for transactional rollback on partial failure

mod common;

use ::common::prelude::*;

#[tokio::test]
async fn test_failed_copy_directory_leaves_no_trace() {
    let (store, fs, faulty) = common::setup_faulty_env().await;
    fs.write_file("/src/a.txt", "first").await.unwrap();
    let b = fs.write_file("/src/b.txt", "second").await.unwrap();
    let before = store.blobs().await.unwrap();

    // a.txt is copied (and referenced) before b.txt fails
    faulty.fail_get(b.blob_id().unwrap());
    let err = fs.copy_directory("/src", "/dst").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    assert_eq!(
        fs.get_info("/dst").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(store.blobs().await.unwrap(), before);
    assert_eq!(common::ref_count(&fs, "/src/a.txt").await, 1);
}

#[tokio::test]
async fn test_failed_copy_file_leaves_destination_alone() {
    let (_store, fs, faulty) = common::setup_faulty_env().await;
    let src = fs.write_file("/src.txt", "source").await.unwrap();
    fs.write_file("/dst.txt", "kept").await.unwrap();

    faulty.fail_get(src.blob_id().unwrap());
    assert!(fs.copy_file("/src.txt", "/dst.txt").await.is_err());

    faulty.heal();
    assert_eq!(fs.read_file("/dst.txt").await.unwrap().bytes, "kept");
    assert_eq!(common::ref_count(&fs, "/src.txt").await, 1);
}

#[tokio::test]
async fn test_failed_write_creates_nothing() {
    let (store, fs, faulty) = common::setup_faulty_env().await;

    faulty.fail_puts(true);
    let err = fs.write_file("/new/dir/file.txt", "data").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    faulty.heal();
    assert_eq!(
        fs.get_info("/new").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(store.blobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reclamation_failure_does_not_undo_delete() {
    let (store, fs, faulty) = common::setup_faulty_env().await;
    let node = fs.write_file("/dir/a.txt", "bytes").await.unwrap();
    let blob_id = node.blob_id().unwrap().clone();

    faulty.fail_delete(&blob_id);
    fs.delete_directory("/dir").await.unwrap();

    // the tree change is committed, the blob waits for the collector
    assert!(fs.get_info("/dir").await.is_err());
    let blob = store.blob(&blob_id).await.unwrap().unwrap();
    assert!(blob.is_orphaned());
    assert!(store.blob_storage().exists(&blob_id).await.unwrap());
    assert_eq!(store.stats().await.unwrap().orphan_count, 1);
}

#[tokio::test]
async fn test_move_file_under_a_file_changes_nothing() {
    let (store, fs) = common::setup_test_env().await;
    fs.write_file("/a.txt", "a").await.unwrap();
    fs.write_file("/plain.txt", "p").await.unwrap();
    let nodes = common::node_rows(&store).await;
    let blobs = store.blobs().await.unwrap();

    let err = fs
        .move_file("/a.txt", "/plain.txt/sub/a.txt")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    assert_eq!(common::node_rows(&store).await, nodes);
    assert_eq!(store.blobs().await.unwrap(), blobs);
}

#[tokio::test]
async fn test_move_file_failing_after_insert_rolls_back() {
    let (store, fs) = common::setup_test_env().await;
    fs.write_file("/a.txt", "a").await.unwrap();
    let nodes = common::node_rows(&store).await;
    let blobs = store.blobs().await.unwrap();

    // the new node and its parent are in place when the old node can't go
    common::fail_when(&store, "keep_source", "DELETE ON nodes", "OLD.path = '/a.txt'").await;
    let err = fs.move_file("/a.txt", "/docs/a.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    assert_eq!(common::node_rows(&store).await, nodes);
    assert_eq!(store.blobs().await.unwrap(), blobs);
    assert_eq!(fs.read_file("/a.txt").await.unwrap().bytes, "a");
}

#[tokio::test]
async fn test_move_directory_failing_mid_subtree_rolls_back() {
    let (store, fs) = common::setup_test_env().await;
    fs.write_file("/src/a.txt", "a").await.unwrap();
    fs.write_file("/src/nested/b.txt", "b").await.unwrap();
    let nodes = common::node_rows(&store).await;
    let blobs = store.blobs().await.unwrap();

    // /dst, /dst/a.txt and /dst/nested are inserted before this one fails
    common::fail_when(
        &store,
        "block_last",
        "INSERT ON nodes",
        "NEW.path = '/dst/nested/b.txt'",
    )
    .await;
    let err = fs.move_directory("/src", "/dst").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    assert_eq!(common::node_rows(&store).await, nodes);
    assert_eq!(store.blobs().await.unwrap(), blobs);
    assert_eq!(
        fs.get_info("/dst").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_delete_directory_failing_after_subtree_delete_rolls_back() {
    let (store, fs) = common::setup_test_env().await;
    let a = fs.write_file("/dir/a.txt", "only here").await.unwrap();
    let b = fs.write_file("/dir/sub/b.txt", "shared").await.unwrap();
    fs.write_file("/keep.txt", "shared").await.unwrap();
    let nodes = common::node_rows(&store).await;
    let blobs = store.blobs().await.unwrap();

    // the nodes are gone and a.txt's blob is released before b.txt's fails
    let condition = format!(
        "OLD.blob_id = '{}' AND NEW.reference_count < OLD.reference_count",
        b.blob_id().unwrap()
    );
    common::fail_when(
        &store,
        "block_release",
        "UPDATE OF reference_count ON blobs",
        &condition,
    )
    .await;
    let err = fs.delete_directory("/dir").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    assert_eq!(common::node_rows(&store).await, nodes);
    assert_eq!(store.blobs().await.unwrap(), blobs);
    assert!(store
        .blob_storage()
        .exists(a.blob_id().unwrap())
        .await
        .unwrap());
    assert_eq!(fs.read_file("/dir/a.txt").await.unwrap().bytes, "only here");
}
