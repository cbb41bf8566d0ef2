// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worktree Manager (SPEC_FULL §4.C): one git worktree per task, laid out at
//! `<data_dir>/worktrees/<project>/task-<id>/` on a dedicated branch, plus a
//! port reserved from the pool for the task's dev server.
//!
//! Grounded on the teacher's `workspace.rs` (per-pipeline workspace
//! directory creation and teardown), generalized from pipeline-scoped
//! directories to task-scoped git worktrees since the teacher has no git
//! integration of its own.

use std::path::{Path, PathBuf};
use std::process::Output;

use tokio::process::Command;
use ty_adapters::subprocess::{run_with_timeout, GIT_WORKTREE_TIMEOUT};
use ty_core::{Task, TaskId};
use ty_storage::{Store, TaskPatch};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::port_pool::allocate_port;

/// Resolved worktree location for a task.
#[derive(Debug, Clone)]
pub struct Worktree {
    pub path: PathBuf,
    pub branch: String,
    pub port: u16,
}

/// Main repo root a task's project is checked out at. SPEC_FULL doesn't
/// track per-project repo roots in the data model yet (that's carried by
/// the CLI's `--repo`/`TASK_REPO` resolution), so it's passed in rather than
/// looked up here.
pub struct WorktreeManager<'a> {
    store: &'a Store,
    config: &'a EngineConfig,
}

impl<'a> WorktreeManager<'a> {
    pub fn new(store: &'a Store, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    fn task_dir(&self, task: &Task) -> PathBuf {
        self.config.worktrees_dir.join(&task.project).join(format!("task-{}", task.id))
    }

    fn branch_name(task: &Task) -> String {
        format!("ty/task-{}", task.id)
    }

    /// Idempotent: if the task already has a worktree recorded and the
    /// directory still exists, return it unchanged rather than recreating.
    pub async fn ensure_worktree(&self, repo: &Path, task: &Task) -> Result<Worktree, EngineError> {
        if let (Some(path), Some(branch), Some(port)) =
            (&task.worktree_path, &task.branch_name, task.port)
        {
            let path = PathBuf::from(path);
            if path.is_dir() {
                return Ok(Worktree { path, branch: branch.clone(), port });
            }
        }

        let path = self.task_dir(task);
        let branch = Self::branch_name(task);
        let port = allocate_port(self.store, self.config.port_range)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let output = run_with_timeout(
            git_command(
                repo,
                &["worktree", "add", "-b", &branch, &path.to_string_lossy(), &self.config.default_branch],
            ),
            GIT_WORKTREE_TIMEOUT,
            "git worktree add",
        )
        .await
        .map_err(EngineError::Worktree)?;
        check_git(&output, "git worktree add")?;

        self.store.update_task(
            task.id,
            TaskPatch {
                worktree_path: Some(Some(path.to_string_lossy().into_owned())),
                branch_name: Some(Some(branch.clone())),
                port: Some(Some(port)),
                ..Default::default()
            },
        )?;

        Ok(Worktree { path, branch, port })
    }

    /// Tear down the worktree directory and branch. Best-effort: a worktree
    /// that's already gone (e.g. manually removed) is not an error.
    pub async fn release_worktree(&self, repo: &Path, task_id: TaskId) -> Result<(), EngineError> {
        let task = self.store.get_task(task_id)?;
        let Some(path) = &task.worktree_path else {
            return Ok(());
        };

        let output = run_with_timeout(
            git_command(repo, &["worktree", "remove", "--force", path]),
            GIT_WORKTREE_TIMEOUT,
            "git worktree remove",
        )
        .await
        .map_err(EngineError::Worktree)?;
        // A worktree the user already deleted by hand isn't a failure here.
        if !output.status.success() && !stderr(&output).contains("is not a working tree") {
            return Err(EngineError::Worktree(format!(
                "git worktree remove failed: {}",
                stderr(&output)
            )));
        }

        self.store.update_task(
            task_id,
            TaskPatch {
                worktree_path: Some(None),
                branch_name: Some(None),
                port: Some(None),
                ..Default::default()
            },
        )?;
        Ok(())
    }
}

pub(crate) fn git_command(repo: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(repo).args(args);
    cmd
}

pub(crate) fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub(crate) fn check_git(output: &Output, description: &str) -> Result<(), EngineError> {
    if output.status.success() {
        Ok(())
    } else {
        Err(EngineError::Worktree(format!("{description} failed: {}", stderr(output))))
    }
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
