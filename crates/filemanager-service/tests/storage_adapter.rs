//! Integration tests for the disk-backed adapter.

mod common;

use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;

use filemanager_core::error::ErrorKind;
use filemanager_core::traits::disk::Disk;
use filemanager_core::types::{AdapterMode, UploadedFile};
use filemanager_service::{FileManagerAdapter, StorageAdapter};
use filemanager_storage::providers::MemoryDisk;

use common::{ChunkedDisk, StuckDirDisk, names, storage_adapter, test_config};

#[tokio::test]
async fn test_create_folder_round_trip() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));

    let docs = adapter.create_folder("docs", None).await.unwrap();
    assert_eq!(docs.identifier(), "uploads/docs");
    assert_eq!(docs.path(), "/docs");
    assert!(docs.is_folder());

    let sub = adapter.create_folder("x", Some("/docs")).await.unwrap();
    let fetched = adapter.get_item(sub.identifier()).await.unwrap().unwrap();
    assert_eq!(fetched.name(), "x");
    assert_eq!(fetched.parent_path().as_deref(), Some("/docs"));
    assert_eq!(fetched.depth(), 1);
    assert_eq!(adapter.mode_name(), AdapterMode::Storage);
}

#[tokio::test]
async fn test_duplicate_folder_is_conflict() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));

    adapter.create_folder("docs", None).await.unwrap();
    let err = adapter.create_folder("docs", None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(err.message, "A file or folder named \"docs\" already exists here.");

    let folders = adapter.get_folders(None).await.unwrap();
    assert_eq!(names(&folders), vec!["docs"]);
}

#[tokio::test]
async fn test_create_folder_in_missing_parent() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    let err = adapter.create_folder("x", Some("nope")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_listing_order_and_hidden_entries() {
    let config = test_config("storage");
    let (adapter, disk) = storage_adapter(&config);

    adapter.create_folder("beta", None).await.unwrap();
    adapter.create_folder("Alpha", None).await.unwrap();
    adapter
        .upload_file(UploadedFile::new("B.txt", "b"), None)
        .await
        .unwrap();
    adapter
        .upload_file(UploadedFile::new("a.txt", "a"), None)
        .await
        .unwrap();
    disk.write("uploads/.env", Bytes::from("SECRET=1")).await.unwrap();

    let items = adapter.get_items(None).await.unwrap();
    assert_eq!(names(&items), vec!["Alpha", "beta", "a.txt", "B.txt"]);

    let mut shown = config.clone();
    shown.filemanager.show_hidden = true;
    let adapter = StorageAdapter::new("public", disk.clone(), &shown).unwrap();
    let items = adapter.get_items(None).await.unwrap();
    assert!(names(&items).contains(&".env".to_string()));
}

#[tokio::test]
async fn test_traversal_never_leaves_root() {
    let (adapter, disk) = storage_adapter(&test_config("storage"));
    disk.write("secret.txt", Bytes::from("top secret")).await.unwrap();
    adapter
        .upload_file(UploadedFile::new("public.txt", "hi"), None)
        .await
        .unwrap();

    for path in ["..", "../..", "%2e%2e", "..\\..", "uploads/../.."] {
        let items = adapter.get_items(Some(path)).await.unwrap();
        assert_eq!(names(&items), vec!["public.txt"], "listing {path}");
    }
    for id in ["../secret.txt", "%2e%2e/secret.txt", "..\\secret.txt"] {
        assert!(adapter.get_contents(id, None).await.unwrap().is_none());
        assert!(!adapter.exists(id).await.unwrap());
    }
    assert!(adapter.get_item("/").await.unwrap().is_none());
}

#[tokio::test]
async fn test_upload_collision_appends_timestamp() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));

    let first = adapter
        .upload_file(UploadedFile::new("doc.pdf", "original"), None)
        .await
        .unwrap();
    let second = adapter
        .upload_file(UploadedFile::new("doc.pdf", "replacement"), None)
        .await
        .unwrap();

    assert_eq!(first.name(), "doc.pdf");
    let stamp = second
        .name()
        .strip_prefix("doc_")
        .and_then(|rest| rest.strip_suffix(".pdf"))
        .unwrap();
    assert!(!stamp.is_empty() && stamp.chars().all(|c| c.is_ascii_digit()));

    let original = adapter
        .get_contents(first.identifier(), None)
        .await
        .unwrap();
    assert_eq!(original.as_deref(), Some("original"));
}

#[tokio::test]
async fn test_upload_then_size_stream_and_url() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    let content = "hello, file manager";

    let item = adapter
        .upload_file(UploadedFile::new("note.txt", content), None)
        .await
        .unwrap();

    assert_eq!(
        adapter.get_size(item.identifier()).await.unwrap(),
        Some(content.len() as u64)
    );

    let mut stream = adapter.get_stream(item.identifier()).await.unwrap().unwrap();
    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(collected, content.as_bytes());

    let url = adapter.get_url(item.identifier()).await.unwrap().unwrap();
    assert!(url.starts_with("https://files.test/uploads/note.txt?expires="));

    assert!(adapter.get_size("uploads/missing.txt").await.unwrap().is_none());
    assert!(adapter.get_url("uploads").await.unwrap().is_none());
}

#[tokio::test]
async fn test_rejected_upload_is_validation_error() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    let err = adapter
        .upload_file(UploadedFile::new("shell.php.jpg", "<?php echo 1;"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(adapter.get_items(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_contents_truncates() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    let item = adapter
        .upload_file(UploadedFile::new("long.txt", "hello world"), None)
        .await
        .unwrap();

    let preview = adapter
        .get_contents(item.identifier(), Some(5))
        .await
        .unwrap()
        .unwrap();
    assert!(preview.starts_with("hello\n"));
    assert!(preview.contains("truncated"));
}

#[tokio::test]
async fn test_get_contents_streams_only_the_preview() {
    let config = test_config("storage");
    let disk = Arc::new(ChunkedDisk::new(4));
    let adapter = StorageAdapter::new("public", disk.clone(), &config).unwrap();
    let item = adapter
        .upload_file(UploadedFile::new("big.txt", "x".repeat(10_000)), None)
        .await
        .unwrap();

    let preview = adapter
        .get_contents(item.identifier(), Some(6))
        .await
        .unwrap()
        .unwrap();
    assert!(preview.starts_with("xxxxxx\n\n"));
    assert!(preview.contains("showing 6 of 10000 bytes"));
    assert_eq!(disk.served(), 8);
}

#[tokio::test]
async fn test_percent_escapes_in_names_are_rejected() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));

    let err = adapter.create_folder("%2e%2e", None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = adapter
        .upload_file(UploadedFile::new("report%202024.txt", "r"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let docs = adapter.create_folder("docs", None).await.unwrap();
    let err = adapter.rename(docs.identifier(), "%41").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(adapter.get_items(None).await.unwrap().iter().all(|i| i.name() == "docs"));
}

#[tokio::test]
async fn test_literal_percent_names_round_trip() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));

    let folder = adapter.create_folder("100% done", None).await.unwrap();
    let fetched = adapter.get_item(folder.identifier()).await.unwrap().unwrap();
    assert_eq!(fetched.name(), "100% done");

    let file = adapter
        .upload_file(UploadedFile::new("50%.txt", "half"), Some(folder.identifier()))
        .await
        .unwrap();
    assert_eq!(adapter.get_size(file.identifier()).await.unwrap(), Some(4));

    adapter.delete(folder.identifier()).await.unwrap();
    assert!(!adapter.exists(folder.identifier()).await.unwrap());
}

#[tokio::test]
async fn test_folder_tree_end_to_end() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    adapter.create_folder("A", None).await.unwrap();
    adapter.create_folder("B", Some("A")).await.unwrap();
    adapter
        .upload_file(UploadedFile::new("f.txt", "x"), Some("A"))
        .await
        .unwrap();

    let tree = adapter.get_folder_tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "A");
    assert_eq!(tree[0].path, "/A");
    assert_eq!(tree[0].file_count, 1);
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].name, "B");
    assert!(tree[0].children[0].children.is_empty());
}

#[tokio::test]
async fn test_tree_and_copy_respect_depth_cap() {
    let mut config = test_config("storage");
    config.filemanager.max_depth = 2;
    let (adapter, _disk) = storage_adapter(&config);
    adapter.create_folder("A", None).await.unwrap();
    adapter.create_folder("B", Some("A")).await.unwrap();
    adapter.create_folder("C", Some("A/B")).await.unwrap();

    let tree = adapter.get_folder_tree().await.unwrap();
    assert_eq!(tree[0].children[0].name, "B");
    assert!(tree[0].children[0].children.is_empty());

    let err = adapter.rename("uploads/A", "Z").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Storage);
    assert!(err.message.contains("nested deeper than 2 levels"));
    assert!(adapter.exists("uploads/A/B/C").await.unwrap());
    assert!(!adapter.exists("uploads/Z").await.unwrap());
}

#[tokio::test]
async fn test_rename_folder_moves_contents() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    adapter.create_folder("old", None).await.unwrap();
    adapter.create_folder("inner", Some("old")).await.unwrap();
    adapter
        .upload_file(UploadedFile::new("a.txt", "a"), Some("old/inner"))
        .await
        .unwrap();
    adapter.create_folder("taken", None).await.unwrap();

    let err = adapter.rename("uploads/old", "taken").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    adapter.rename("uploads/old", "new").await.unwrap();
    assert!(!adapter.exists("uploads/old").await.unwrap());
    assert_eq!(
        adapter
            .get_contents("uploads/new/inner/a.txt", None)
            .await
            .unwrap()
            .as_deref(),
        Some("a")
    );
}

#[tokio::test]
async fn test_rename_file_and_invalid_names() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    adapter
        .upload_file(UploadedFile::new("a.txt", "a"), None)
        .await
        .unwrap();

    adapter.rename("uploads/a.txt", "b.txt").await.unwrap();
    assert!(adapter.exists("uploads/b.txt").await.unwrap());

    for bad in ["", "..", "x/y"] {
        let err = adapter.rename("uploads/b.txt", bad).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation, "{bad:?}");
    }
    let err = adapter.rename("uploads/none.txt", "c.txt").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_move_into_itself_is_rejected() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    adapter.create_folder("A", None).await.unwrap();
    adapter.create_folder("B", Some("A")).await.unwrap();

    for target in ["A", "A/B"] {
        let err = adapter.move_item("uploads/A", Some(target)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidHierarchy, "into {target}");
    }
    assert!(adapter.exists("uploads/A/B").await.unwrap());

    // A sibling sharing the prefix is a legal target.
    adapter.create_folder("AB", None).await.unwrap();
    adapter.move_item("uploads/A", Some("AB")).await.unwrap();
    assert!(adapter.exists("uploads/AB/A/B").await.unwrap());
}

#[tokio::test]
async fn test_move_file() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    adapter.create_folder("dest", None).await.unwrap();
    adapter
        .upload_file(UploadedFile::new("a.txt", "a"), None)
        .await
        .unwrap();
    adapter
        .upload_file(UploadedFile::new("a.txt", "other"), Some("dest"))
        .await
        .unwrap();

    let err = adapter.move_item("uploads/a.txt", Some("dest")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // Same location is a no-op.
    adapter.move_item("uploads/a.txt", None).await.unwrap();

    adapter.delete("uploads/dest/a.txt").await.unwrap();
    adapter.move_item("uploads/a.txt", Some("/dest/")).await.unwrap();
    assert!(!adapter.exists("uploads/a.txt").await.unwrap());
    assert!(adapter.exists("uploads/dest/a.txt").await.unwrap());
}

#[tokio::test]
async fn test_failed_source_delete_keeps_both_trees() {
    let config = test_config("storage");
    let inner = MemoryDisk::default();
    let disk = Arc::new(StuckDirDisk {
        inner: inner.clone(),
        stuck: "uploads/src".to_string(),
    });
    let adapter = StorageAdapter::new("public", disk, &config).unwrap();
    adapter.create_folder("src", None).await.unwrap();
    adapter
        .upload_file(UploadedFile::new("a.txt", "a"), Some("src"))
        .await
        .unwrap();

    let err = adapter.rename("uploads/src", "dst").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Storage);
    assert!(err.message.contains("could not be removed"));
    assert!(inner.exists("uploads/src/a.txt").await.unwrap());
    assert!(inner.exists("uploads/dst/a.txt").await.unwrap());
}

#[tokio::test]
async fn test_delete_twice_and_delete_many() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    adapter.create_folder("docs", None).await.unwrap();
    adapter
        .upload_file(UploadedFile::new("a.txt", "a"), Some("docs"))
        .await
        .unwrap();

    adapter.delete("uploads/docs").await.unwrap();
    let err = adapter.delete("uploads/docs").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(!adapter.exists("uploads/docs/a.txt").await.unwrap());

    let err = adapter.delete("").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    for name in ["x.txt", "y.txt"] {
        adapter
            .upload_file(UploadedFile::new(name, "1"), None)
            .await
            .unwrap();
    }
    let ids = vec![
        "uploads/x.txt".to_string(),
        "uploads/missing.txt".to_string(),
        "uploads/y.txt".to_string(),
    ];
    assert_eq!(adapter.delete_many(&ids).await.unwrap(), 2);
}

#[tokio::test]
async fn test_breadcrumbs() {
    let (adapter, _disk) = storage_adapter(&test_config("storage"));
    let crumbs = adapter.get_breadcrumbs(Some("docs/sub")).await.unwrap();

    assert_eq!(crumbs.len(), 3);
    assert_eq!(crumbs[0].id, None);
    assert_eq!(crumbs[0].name, "Root");
    assert_eq!(crumbs[0].path, "/");
    assert_eq!(crumbs[1].id.as_deref(), Some("uploads/docs"));
    assert_eq!(crumbs[1].path, "/docs");
    assert_eq!(crumbs[2].id.as_deref(), Some("uploads/docs/sub"));
    assert_eq!(crumbs[2].path, "/docs/sub");

    let root_only = adapter.get_breadcrumbs(None).await.unwrap();
    assert_eq!(root_only.len(), 1);
}
