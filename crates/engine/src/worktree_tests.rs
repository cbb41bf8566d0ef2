// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::process::Command as StdCommand;
use ty_core::TaskConfig;

fn init_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let run = |args: &[&str]| {
        let status = StdCommand::new("git")
            .arg("-C")
            .arg(dir.path())
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    };
    run(&["init", "-q", "-b", "main"]);
    run(&["config", "user.email", "test@example.com"]);
    run(&["config", "user.name", "test"]);
    std::fs::write(dir.path().join("README.md"), "hello\n").unwrap();
    run(&["add", "."]);
    run(&["commit", "-q", "-m", "init"]);
    dir
}

fn engine_config(data_dir: &Path) -> EngineConfig {
    EngineConfig::load(data_dir)
}

#[tokio::test]
async fn ensure_worktree_creates_directory_and_branch() {
    let repo = init_repo();
    let data_dir = tempfile::tempdir().unwrap();
    let store = Store::open(data_dir.path().join("store")).unwrap();
    let config = engine_config(data_dir.path());
    let task = store
        .create_task(TaskConfig { project: "demo".into(), ..Default::default() })
        .unwrap();

    let manager = WorktreeManager::new(&store, &config);
    let wt = manager.ensure_worktree(repo.path(), &task).await.unwrap();

    assert!(wt.path.is_dir());
    assert_eq!(wt.branch, format!("ty/task-{}", task.id));
    let reloaded = store.get_task(task.id).unwrap();
    assert_eq!(reloaded.worktree_path, Some(wt.path.to_string_lossy().into_owned()));
    assert_eq!(reloaded.port, Some(wt.port));
}

#[tokio::test]
async fn ensure_worktree_is_idempotent() {
    let repo = init_repo();
    let data_dir = tempfile::tempdir().unwrap();
    let store = Store::open(data_dir.path().join("store")).unwrap();
    let config = engine_config(data_dir.path());
    let task = store
        .create_task(TaskConfig { project: "demo".into(), ..Default::default() })
        .unwrap();

    let manager = WorktreeManager::new(&store, &config);
    let first = manager.ensure_worktree(repo.path(), &task).await.unwrap();
    let task = store.get_task(task.id).unwrap();
    let second = manager.ensure_worktree(repo.path(), &task).await.unwrap();

    assert_eq!(first.path, second.path);
    assert_eq!(first.port, second.port);
}

#[tokio::test]
async fn release_worktree_removes_directory_and_clears_fields() {
    let repo = init_repo();
    let data_dir = tempfile::tempdir().unwrap();
    let store = Store::open(data_dir.path().join("store")).unwrap();
    let config = engine_config(data_dir.path());
    let task = store
        .create_task(TaskConfig { project: "demo".into(), ..Default::default() })
        .unwrap();

    let manager = WorktreeManager::new(&store, &config);
    let wt = manager.ensure_worktree(repo.path(), &task).await.unwrap();
    manager.release_worktree(repo.path(), task.id).await.unwrap();

    assert!(!wt.path.exists());
    let reloaded = store.get_task(task.id).unwrap();
    assert!(reloaded.worktree_path.is_none());
    assert!(reloaded.port.is_none());
}

#[tokio::test]
async fn release_worktree_without_one_is_a_no_op() {
    let repo = init_repo();
    let data_dir = tempfile::tempdir().unwrap();
    let store = Store::open(data_dir.path().join("store")).unwrap();
    let config = engine_config(data_dir.path());
    let task = store
        .create_task(TaskConfig { project: "demo".into(), ..Default::default() })
        .unwrap();

    let manager = WorktreeManager::new(&store, &config);
    manager.release_worktree(repo.path(), task.id).await.unwrap();
}
