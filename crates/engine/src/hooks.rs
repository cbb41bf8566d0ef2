// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook Ingestor (SPEC_FULL §4.F): tails each running task's hook-record
//! file and translates agent lifecycle hooks (pre/post-tool-use,
//! notification, stop) into `TaskLog` lines and `blocked` transitions.
//!
//! `stop` is advisory only — completion is authoritative through the MCP
//! `complete` tool (`mcp.rs`), not inferred from a hook firing. A
//! `notification` that looks like a request for input blocks the task; a
//! race against a concurrent MCP `complete`/`needs_input` call is absorbed
//! silently (the Store rejects the now-illegal transition, and the ingestor
//! just moves on) rather than surfaced as an ingestor failure.
//!
//! Built on `ty_adapters::{FileTailer, watch_file}` (already generalized
//! for this in the adapters crate) rather than re-implementing file
//! tailing here.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use ty_adapters::{watch_file, FileTailer};
use ty_core::{LineType, TaskId};
use ty_storage::{Store, StoreError};

/// Fallback poll interval in case a filesystem watch event is missed.
const POLL_FALLBACK: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum HookRecord {
    PreToolUse {
        tool: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    PostToolUse {
        tool: String,
        #[serde(default)]
        output: serde_json::Value,
    },
    Notification {
        message: String,
    },
    Stop {
        #[serde(default)]
        reason: Option<String>,
    },
}

/// Apply one hook-record line to `task_id`'s log/status. Malformed lines are
/// skipped (the tailer already drops lines without a trailing newline;
/// invalid JSON past that point is a hook-script bug, not an ingestor one).
pub fn ingest_line(store: &Store, task_id: TaskId, line: &str) -> Result<(), StoreError> {
    let Ok(record) = serde_json::from_str::<HookRecord>(line) else {
        tracing::debug!(task_id = %task_id, "skipping malformed hook record");
        return Ok(());
    };

    match record {
        HookRecord::PreToolUse { tool, .. } => {
            store.append_log(task_id, LineType::Tool, format!("→ {tool}"))
        }
        HookRecord::PostToolUse { tool, .. } => {
            store.append_log(task_id, LineType::Tool, format!("✓ {tool}"))
        }
        HookRecord::Notification { message } => {
            store.append_log(task_id, LineType::System, message.clone())?;
            if needs_input(&message) {
                absorb_illegal_transition(store.block_task(task_id, message))
            } else {
                Ok(())
            }
        }
        HookRecord::Stop { reason } => {
            // Advisory only: logged for operator visibility, never a transition.
            let line = match reason {
                Some(r) => format!("agent stopped: {r}"),
                None => "agent stopped".to_string(),
            };
            store.append_log(task_id, LineType::System, line)
        }
    }
}

fn needs_input(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("waiting for input")
        || lower.contains("needs input")
        || lower.contains("permission")
        || lower.trim_end().ends_with('?')
}

fn absorb_illegal_transition(result: Result<ty_core::Task, StoreError>) -> Result<(), StoreError> {
    match result {
        Ok(_) => Ok(()),
        Err(StoreError::IllegalTransition { .. }) => Ok(()),
        Err(other) => Err(other),
    }
}

/// Spawn a background task that tails `hook_path` for `task_id` until
/// `shutdown` fires. Returns immediately; the tail itself runs on the
/// tokio runtime.
pub fn spawn_hook_tail(
    store: Arc<Store>,
    task_id: TaskId,
    hook_path: PathBuf,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tailer = FileTailer::new(&hook_path);
        let (_watcher, mut rx) = match watch_file(&hook_path) {
            Ok((watcher, rx)) => (Some(watcher), Some(rx)),
            Err(err) => {
                tracing::warn!(task_id = %task_id, error = %err, "hook file watch failed, polling only");
                (None, None)
            }
        };

        loop {
            let drained = drain(&store, task_id, &mut tailer);
            if let Err(err) = drained {
                tracing::warn!(task_id = %task_id, error = %err, "hook ingestion failed");
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(POLL_FALLBACK) => {}
                _ = recv_or_pending(&mut rx) => {}
            }
        }
    })
}

async fn recv_or_pending(rx: &mut Option<tokio::sync::mpsc::Receiver<()>>) {
    match rx {
        Some(r) => {
            r.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn drain(store: &Store, task_id: TaskId, tailer: &mut FileTailer) -> Result<(), StoreError> {
    for line in tailer.read_new_lines().unwrap_or_default() {
        ingest_line(store, task_id, &line)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
