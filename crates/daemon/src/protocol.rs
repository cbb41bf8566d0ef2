// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC request/response types exchanged between `ty` (the CLI) and `tyd`
//! (this daemon) over the Unix socket. Grounded on the teacher's
//! `protocol.rs`/`protocol_types.rs` split (wire-level `Request`/`Response`
//! enums plus small `*Summary`/`*Detail` DTOs decoupled from the internal
//! domain types), generalized from the teacher's Job/Agent/Session/Workspace
//! surface onto SPEC_FULL §6's single Task command table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ty_core::{Task, TaskLog};

pub use crate::protocol_wire::{
    decode, encode, read_message, read_request, write_message, write_response, ProtocolError,
    DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};

/// Requests the CLI can send to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Health check ping.
    Ping,
    /// Version handshake.
    Hello { version: String },
    /// Daemon status (uptime, active task counts).
    Status,
    /// Request daemon shutdown.
    Shutdown,

    /// Snapshot all board columns.
    Board,
    /// Filtered task list.
    List { status: Option<String>, project: Option<String>, include_closed: bool },
    /// Single task detail, optionally including its log tail.
    Show { id: u64, include_logs: bool },
    /// Create a task with `status=backlog`.
    Create {
        title: String,
        project: String,
        kind: Option<String>,
        body: String,
        executor: Option<String>,
    },
    /// Partial update of a task's mutable fields.
    Update {
        id: u64,
        title: Option<String>,
        body: Option<String>,
        executor: Option<String>,
        dangerous_mode: Option<bool>,
    },
    /// `status=queued`.
    Execute { id: u64 },
    /// Re-enter `processing` with optional feedback.
    Retry { id: u64, feedback: Option<String> },
    /// Direct status transition, if the state machine permits it.
    SetStatus { id: u64, status: String },
    /// Toggle, set, or clear the pin flag.
    Pin { id: u64, pinned: bool },
    /// Archive a task (soft-close).
    Close { id: u64 },
    /// Hard delete a task.
    Delete { id: u64 },
    /// Tail a task's executor output.
    Logs { id: u64, limit: Option<usize> },

    /// Query the durable event log.
    EventsList { limit: Option<usize>, kind: Option<String>, task_id: Option<u64>, project: Option<String> },
    /// Register a webhook URL.
    WebhookAdd { url: String },
    /// List registered webhooks.
    WebhookList,
    /// Remove a webhook by id.
    WebhookRemove { id: u64 },
}

/// Responses the daemon sends back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Ok,
    Pong,
    Hello { version: String },
    ShuttingDown,

    Status {
        uptime_secs: u64,
        queued: usize,
        processing: usize,
        blocked: usize,
    },
    Board { columns: Vec<BoardColumn> },
    Tasks { tasks: Vec<TaskSummary> },
    Task { task: Option<Box<TaskDetail>> },
    Logs { lines: Vec<LogLine> },
    Events { events: Vec<EventEntry> },
    Webhooks { webhooks: Vec<WebhookEntry> },
    Webhook { webhook: WebhookEntry },

    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardColumn {
    pub status: String,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: u64,
    pub title: String,
    pub status: String,
    pub project: String,
    pub executor: String,
    pub kind: Option<String>,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetail {
    pub summary: TaskSummary,
    pub body: String,
    pub task_summary: Option<String>,
    pub worktree_path: Option<String>,
    pub branch_name: Option<String>,
    pub port: Option<u16>,
    pub session_id: Option<String>,
    pub total_retries: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub recurrence: Option<String>,
    pub logs: Vec<LogLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub line_type: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEntry {
    pub id: u64,
    pub kind: String,
    pub task_id: Option<u64>,
    pub project: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEntry {
    pub id: u64,
    pub url: String,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.0,
            title: task.title.clone(),
            status: task.status.to_string(),
            project: task.project.clone(),
            executor: task.executor.clone(),
            kind: task.kind.map(|k| k.to_string()),
            pinned: task.pinned,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

impl TaskDetail {
    pub fn from_task(task: &Task, logs: Vec<TaskLog>) -> Self {
        Self {
            summary: TaskSummary::from(task),
            body: task.body.clone(),
            task_summary: task.summary.clone(),
            worktree_path: task.worktree_path.clone(),
            branch_name: task.branch_name.clone(),
            port: task.port,
            session_id: task.session_id.clone(),
            total_retries: task.total_retries,
            started_at: task.started_at,
            completed_at: task.completed_at,
            scheduled_at: task.scheduled_at,
            recurrence: task.recurrence.as_ref().map(|r| r.0.clone()),
            logs: logs.into_iter().map(LogLine::from).collect(),
        }
    }
}

impl From<TaskLog> for LogLine {
    fn from(log: TaskLog) -> Self {
        Self { line_type: log.line_type.to_string(), content: log.content, created_at: log.created_at }
    }
}
