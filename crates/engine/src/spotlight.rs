// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spotlight (SPEC_FULL §4.C): mirrors a task's worktree contents into the
//! main repo checkout so the operator can preview the agent's work without
//! switching branches, then restores the main repo exactly as it found it.
//!
//! New module: the teacher has no analogous feature (its workspaces are the
//! only checkout there is). Grounded on the teacher's `workspace.rs` for the
//! general shape of "stage files under a path, then tear down cleanly," and
//! on the teacher's `subprocess`-via-`tokio::process::Command` git shell-out
//! idiom used throughout `worktree.rs`.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use ty_adapters::subprocess::{run_with_timeout, GIT_WORKTREE_TIMEOUT};

use crate::error::EngineError;
use crate::worktree::{check_git, git_command, stderr};

const MARKER_FILE: &str = ".spotlight-active";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotlightAction {
    Start,
    Sync,
    Stop,
    Status,
}

#[derive(Debug, Clone)]
pub struct SpotlightMarker {
    pub started_at: chrono::DateTime<Utc>,
    pub stash_created: bool,
}

impl SpotlightMarker {
    fn render(&self) -> String {
        format!("started={}\nstash_created={}\n", self.started_at.to_rfc3339(), self.stash_created)
    }

    fn parse(raw: &str) -> Option<Self> {
        let mut started_at = None;
        let mut stash_created = None;
        for line in raw.lines() {
            let (key, value) = line.split_once('=')?;
            match key {
                "started" => started_at = chrono::DateTime::parse_from_rfc3339(value).ok().map(|d| d.with_timezone(&Utc)),
                "stash_created" => stash_created = value.parse::<bool>().ok(),
                _ => {}
            }
        }
        Some(Self { started_at: started_at?, stash_created: stash_created? })
    }
}

#[derive(Debug, Clone)]
pub struct SpotlightResult {
    pub active: bool,
    pub marker: Option<SpotlightMarker>,
    /// Files copied (start/sync) or none (stop/status).
    pub synced: usize,
    /// Candidate destinations rejected by the path-traversal guard.
    pub rejected: usize,
}

fn marker_path(worktree: &Path) -> PathBuf {
    worktree.join(MARKER_FILE)
}

fn read_marker(worktree: &Path) -> Option<SpotlightMarker> {
    let raw = std::fs::read_to_string(marker_path(worktree)).ok()?;
    SpotlightMarker::parse(&raw)
}

/// Run the requested Spotlight action against `worktree`, mirroring into
/// `main_repo`.
pub async fn spotlight_sync(
    worktree: &Path,
    main_repo: &Path,
    action: SpotlightAction,
) -> Result<SpotlightResult, EngineError> {
    match action {
        SpotlightAction::Status => {
            let marker = read_marker(worktree);
            Ok(SpotlightResult { active: marker.is_some(), marker, synced: 0, rejected: 0 })
        }
        SpotlightAction::Start => {
            if let Some(marker) = read_marker(worktree) {
                return Ok(SpotlightResult { active: true, marker: Some(marker), synced: 0, rejected: 0 });
            }
            let stash_created = stash_dirty_state(main_repo).await?;
            let marker = SpotlightMarker { started_at: Utc::now(), stash_created };
            std::fs::write(marker_path(worktree), marker.render())?;
            let (synced, rejected) = copy_worktree_files(worktree, main_repo).await?;
            Ok(SpotlightResult { active: true, marker: Some(marker), synced, rejected })
        }
        SpotlightAction::Sync => {
            let Some(marker) = read_marker(worktree) else {
                return Err(EngineError::Invalid("spotlight is not active for this worktree".into()));
            };
            let (synced, rejected) = copy_worktree_files(worktree, main_repo).await?;
            Ok(SpotlightResult { active: true, marker: Some(marker), synced, rejected })
        }
        SpotlightAction::Stop => {
            let Some(marker) = read_marker(worktree) else {
                return Ok(SpotlightResult { active: false, marker: None, synced: 0, rejected: 0 });
            };
            if marker.stash_created {
                restore_stash(main_repo).await?;
            }
            std::fs::remove_file(marker_path(worktree)).ok();
            Ok(SpotlightResult { active: false, marker: Some(marker), synced: 0, rejected: 0 })
        }
    }
}

async fn stash_dirty_state(main_repo: &Path) -> Result<bool, EngineError> {
    let status = run_with_timeout(
        git_command(main_repo, &["status", "--porcelain"]),
        GIT_WORKTREE_TIMEOUT,
        "git status",
    )
    .await
    .map_err(EngineError::Spotlight)?;
    check_git(&status, "git status")?;
    if String::from_utf8_lossy(&status.stdout).trim().is_empty() {
        return Ok(false);
    }

    let output = run_with_timeout(
        git_command(main_repo, &["stash", "push", "-u", "-m", "ty-spotlight"]),
        GIT_WORKTREE_TIMEOUT,
        "git stash push",
    )
    .await
    .map_err(EngineError::Spotlight)?;
    check_git(&output, "git stash push")?;
    Ok(true)
}

async fn restore_stash(main_repo: &Path) -> Result<(), EngineError> {
    let output = run_with_timeout(
        git_command(main_repo, &["stash", "pop"]),
        GIT_WORKTREE_TIMEOUT,
        "git stash pop",
    )
    .await
    .map_err(EngineError::Spotlight)?;
    if !output.status.success() {
        return Err(EngineError::Spotlight(format!("git stash pop failed: {}", stderr(&output))));
    }
    Ok(())
}

async fn list_files(worktree: &Path, args: &[&str]) -> Result<Vec<String>, EngineError> {
    let output = run_with_timeout(git_command(worktree, args), GIT_WORKTREE_TIMEOUT, "git ls-files")
        .await
        .map_err(EngineError::Spotlight)?;
    check_git(&output, "git ls-files")?;
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .filter(|l| !l.is_empty())
        .collect())
}

async fn copy_worktree_files(worktree: &Path, main_repo: &Path) -> Result<(usize, usize), EngineError> {
    let mut files = list_files(worktree, &["ls-files"]).await?;
    files.extend(list_files(worktree, &["ls-files", "--others", "--exclude-standard"]).await?);

    let mut synced = 0;
    let mut rejected = 0;
    for rel in files {
        let Some(dest) = safe_join(main_repo, &rel) else {
            rejected += 1;
            continue;
        };
        let src = worktree.join(&rel);
        if !src.is_file() {
            continue;
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&src, &dest).await?;
        synced += 1;
    }
    Ok((synced, rejected))
}

/// Lexically join `rel` onto `root`, rejecting any candidate whose cleaned
/// path would escape `root` — the path-traversal guard required by
/// SPEC_FULL's testable property #7. Pure path arithmetic; no filesystem
/// access, so a rejected candidate never touches disk.
fn safe_join(root: &Path, rel: &str) -> Option<PathBuf> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return None;
    }
    let mut result = root.to_path_buf();
    for component in rel_path.components() {
        match component {
            Component::Normal(part) => result.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if result.starts_with(root) {
        Some(result)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "spotlight_tests.rs"]
mod tests;
