// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier, status state machine, and the [`Task`] entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic 64-bit task identifier, assigned by the Store at create time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(TaskId)
    }
}

/// Task lifecycle status. See the transition table in [`TaskStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    Queued,
    Processing,
    Blocked,
    Done,
    Archived,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Done | TaskStatus::Archived | TaskStatus::Failed
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskStatus::Queued | TaskStatus::Processing | TaskStatus::Blocked
        )
    }

    /// The closed set of allowed transitions, enforced at the Store boundary.
    ///
    /// Retry from a terminal-ish status (`Blocked`, `Failed`, `Done`) re-enters
    /// `Processing` directly rather than going back through `Queued`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Backlog, Queued)
                | (Queued, Processing)
                | (Processing, Done)
                | (Processing, Blocked)
                | (Processing, Failed)
                | (Blocked, Processing) // retry
                | (Failed, Processing) // retry
                | (Done, Processing) // retry
                | (Backlog, Archived)
                | (Queued, Archived)
                | (Processing, Archived)
                | (Blocked, Archived)
                | (Done, Archived)
                | (Failed, Archived)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Queued => "queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
            TaskStatus::Archived => "archived",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(TaskStatus::Backlog),
            "queued" => Ok(TaskStatus::Queued),
            "processing" => Ok(TaskStatus::Processing),
            "blocked" => Ok(TaskStatus::Blocked),
            "done" => Ok(TaskStatus::Done),
            "archived" => Ok(TaskStatus::Archived),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// Advisory task kind. Empty/unset is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Code,
    Writing,
    Thinking,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskType::Code => "code",
            TaskType::Writing => "writing",
            TaskType::Thinking => "thinking",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(TaskType::Code),
            "writing" => Ok(TaskType::Writing),
            "thinking" => Ok(TaskType::Thinking),
            other => Err(format!("unknown task type: {other}")),
        }
    }
}

/// A cron-like recurrence schedule: 5-field `min hour dom month dow`, each
/// field either `*` or a comma list of integers. See `ty_core::recurrence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recurrence(pub String);

/// Configuration for creating a new task.
#[derive(Debug, Clone, Default)]
pub struct TaskConfig {
    pub title: String,
    pub body: String,
    pub kind: Option<TaskType>,
    pub project: String,
    pub executor: String,
    pub dangerous_mode: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub recurrence: Option<Recurrence>,
}

/// Central task entity. Owned exclusively by the Store; every field mutation
/// flows through `ty_storage::Store` so it can be paired with an event-log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub body: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TaskType>,
    #[serde(default)]
    pub project: String,
    pub executor: String,
    #[serde(default)]
    pub dangerous_mode: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mux_session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mux_window_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_pane_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_pane_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,

    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Cumulative retries across the task's lifetime. Ambient bookkeeping
    /// surfaced by `show <id>`, not part of the status state machine.
    #[serde(default)]
    pub total_retries: u32,
    /// Output-log byte length captured when the idle-reap sweep first
    /// observed quiescence; used to detect activity during the grace window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_grace_log_size: Option<u64>,
    /// Local timestamp of the most recent suspend. Not meaningful across
    /// daemon restarts, mirroring the transient `is_suspended` flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_suspended_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: TaskId, config: TaskConfig, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: config.title,
            body: config.body,
            status: TaskStatus::Backlog,
            kind: config.kind,
            project: config.project,
            executor: config.executor,
            dangerous_mode: config.dangerous_mode,
            worktree_path: None,
            branch_name: None,
            port: None,
            session_id: None,
            mux_session: None,
            mux_window_id: None,
            agent_pane_id: None,
            shell_pane_id: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            last_run_at: None,
            scheduled_at: config.scheduled_at,
            recurrence: config.recurrence,
            pinned: false,
            summary: None,
            total_retries: 0,
            idle_grace_log_size: None,
            last_suspended_at: None,
        }
    }

    pub fn has_worktree(&self) -> bool {
        self.worktree_path.is_some()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
