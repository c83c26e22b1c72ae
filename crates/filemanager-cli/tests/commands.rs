//! End-to-end command runs against a local disk in storage mode.

use std::collections::HashMap;
use std::path::Path;

use clap::Parser;

use filemanager_cli::Cli;
use filemanager_core::config::AppConfig;
use filemanager_core::config::disk::DiskConfig;
use filemanager_core::error::ErrorKind;

fn local_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.filemanager.mode = "storage".to_string();
    config.filemanager.disk = "local".to_string();
    config.disks = HashMap::from([(
        "local".to_string(),
        DiskConfig {
            driver: "local".to_string(),
            root: root.display().to_string(),
            url: None,
            signing_key: None,
        },
    )]);
    config
}

async fn run(config: &AppConfig, args: &[&str]) -> filemanager_core::AppResult<()> {
    let argv = std::iter::once("filemanager").chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv).unwrap();
    cli.execute(config.clone()).await
}

#[tokio::test]
async fn test_storage_commands_round_trip() {
    let disk_root = tempfile::tempdir().unwrap();
    let local = tempfile::tempdir().unwrap();
    let config = local_config(disk_root.path());
    let source = local.path().join("notes.txt");
    std::fs::write(&source, "remember the milk").unwrap();

    run(&config, &["mkdir", "docs"]).await.unwrap();
    run(&config, &["upload", source.to_str().unwrap(), "--to", "docs"])
        .await
        .unwrap();
    assert!(disk_root.path().join("uploads/docs/notes.txt").is_file());

    run(&config, &["ls", "docs"]).await.unwrap();
    run(&config, &["--format", "json", "tree"]).await.unwrap();
    run(&config, &["info", "uploads/docs/notes.txt"]).await.unwrap();
    run(&config, &["cat", "uploads/docs/notes.txt", "--max", "8"])
        .await
        .unwrap();
    run(&config, &["url", "uploads/docs/notes.txt"]).await.unwrap();

    run(&config, &["rename", "uploads/docs", "papers"]).await.unwrap();
    assert!(disk_root.path().join("uploads/papers/notes.txt").is_file());

    run(&config, &["rm", "uploads/papers"]).await.unwrap();
    assert!(!disk_root.path().join("uploads/papers").exists());
}

#[tokio::test]
async fn test_failures_surface_user_messages() {
    let disk_root = tempfile::tempdir().unwrap();
    let config = local_config(disk_root.path());

    let err = run(&config, &["info", "uploads/missing.txt"]).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    run(&config, &["mkdir", "docs"]).await.unwrap();
    let err = run(&config, &["mkdir", "docs"]).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // Deleting several ids is best-effort.
    run(&config, &["rm", "uploads/docs", "uploads/nope"]).await.unwrap();
}

#[tokio::test]
async fn test_migrate_in_storage_mode_is_a_no_op() {
    let disk_root = tempfile::tempdir().unwrap();
    let config = local_config(disk_root.path());
    run(&config, &["migrate"]).await.unwrap();
}
