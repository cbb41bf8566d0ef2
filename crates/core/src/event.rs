// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types: the WAL journal entries the Store appends, and the
//! durable event-log rows ([`EventRecord`]) derived from the lifecycle subset
//! of them for external consumers (SSE, webhooks, `events list`).
//!
//! Not every journal entry is a dispatched lifecycle event: `TaskLogAppended`
//! is durable (survives replay) but per the Store contract never reaches the
//! Event Manager. `Event::is_lifecycle` is the single source of truth for
//! that split so the two paths can't drift apart.

use crate::attachment::Attachment;
use crate::task::{Task, TaskId, TaskStatus};
use crate::task_log::LineType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Before/after pair recorded for a single changed field in `task.updated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: serde_json::Value,
    pub new: serde_json::Value,
}

/// Journal entries appended to the WAL. Serializes as `{"type": "...", ...}`;
/// unknown tags are rejected rather than silently absorbed (no free-form
/// catch-all variant), per the closed-taxonomy design note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Carries the full row rather than just the id: replay has nowhere
    /// else to source the initial field values from.
    #[serde(rename = "task.created")]
    TaskCreated { task: Box<Task> },
    #[serde(rename = "task.updated")]
    TaskUpdated {
        task_id: TaskId,
        changes: HashMap<String, FieldChange>,
    },
    #[serde(rename = "task.deleted")]
    TaskDeleted { task_id: TaskId },
    #[serde(rename = "task.queued")]
    TaskQueued { task_id: TaskId },
    #[serde(rename = "task.started")]
    TaskStarted { task_id: TaskId },
    #[serde(rename = "task.processing")]
    TaskProcessing { task_id: TaskId },
    #[serde(rename = "task.blocked")]
    TaskBlocked { task_id: TaskId, reason: String },
    #[serde(rename = "task.completed")]
    TaskCompleted { task_id: TaskId, summary: String },
    #[serde(rename = "task.failed")]
    TaskFailed { task_id: TaskId, reason: String },
    #[serde(rename = "task.interrupted")]
    TaskInterrupted { task_id: TaskId },
    #[serde(rename = "task.retried")]
    TaskRetried {
        task_id: TaskId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback: Option<String>,
    },
    #[serde(rename = "task.status.changed")]
    TaskStatusChanged {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
    #[serde(rename = "task.pinned")]
    TaskPinned { task_id: TaskId },
    #[serde(rename = "task.unpinned")]
    TaskUnpinned { task_id: TaskId },
    /// Journal-only: never dispatched to the Event Manager or event log.
    #[serde(rename = "task.log.appended")]
    TaskLogAppended {
        task_id: TaskId,
        line_type: LineType,
        content: String,
    },
    /// Journal-only: context cache writes don't carry a task id and aren't
    /// part of the task lifecycle taxonomy.
    #[serde(rename = "project.context.set")]
    ProjectContextSet { project: String },
    /// Journal-only: attachment bytes live on disk; this carries the
    /// metadata row so replay can reconstruct it.
    #[serde(rename = "task.attachment.added")]
    TaskAttachmentAdded { attachment: Box<Attachment> },
}

impl Event {
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Event::TaskCreated { task } => Some(task.id),
            Event::TaskUpdated { task_id, .. }
            | Event::TaskDeleted { task_id }
            | Event::TaskQueued { task_id }
            | Event::TaskStarted { task_id }
            | Event::TaskProcessing { task_id }
            | Event::TaskBlocked { task_id, .. }
            | Event::TaskCompleted { task_id, .. }
            | Event::TaskFailed { task_id, .. }
            | Event::TaskInterrupted { task_id }
            | Event::TaskRetried { task_id, .. }
            | Event::TaskStatusChanged { task_id, .. }
            | Event::TaskPinned { task_id }
            | Event::TaskUnpinned { task_id }
            | Event::TaskLogAppended { task_id, .. } => Some(*task_id),
            Event::TaskAttachmentAdded { attachment } => Some(attachment.task_id),
            Event::ProjectContextSet { .. } => None,
        }
    }

    /// Whether this journal entry is part of the task-lifecycle taxonomy and
    /// therefore gets an event-log row + Event Manager dispatch.
    pub fn is_lifecycle(&self) -> bool {
        !matches!(
            self,
            Event::TaskLogAppended { .. }
                | Event::ProjectContextSet { .. }
                | Event::TaskAttachmentAdded { .. }
        )
    }

    pub fn kind(&self) -> Option<EventKind> {
        Some(match self {
            Event::TaskCreated { .. } => EventKind::TaskCreated,
            Event::TaskUpdated { .. } => EventKind::TaskUpdated,
            Event::TaskDeleted { .. } => EventKind::TaskDeleted,
            Event::TaskQueued { .. } => EventKind::TaskQueued,
            Event::TaskStarted { .. } => EventKind::TaskStarted,
            Event::TaskProcessing { .. } => EventKind::TaskProcessing,
            Event::TaskBlocked { .. } => EventKind::TaskBlocked,
            Event::TaskCompleted { .. } => EventKind::TaskCompleted,
            Event::TaskFailed { .. } => EventKind::TaskFailed,
            Event::TaskInterrupted { .. } => EventKind::TaskInterrupted,
            Event::TaskRetried { .. } => EventKind::TaskRetried,
            Event::TaskStatusChanged { .. } => EventKind::TaskStatusChanged,
            Event::TaskPinned { .. } => EventKind::TaskPinned,
            Event::TaskUnpinned { .. } => EventKind::TaskUnpinned,
            Event::TaskLogAppended { .. }
            | Event::ProjectContextSet { .. }
            | Event::TaskAttachmentAdded { .. } => return None,
        })
    }
}

/// The closed event-type taxonomy advertised by the Event Manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[serde(rename = "task.created")]
    TaskCreated,
    #[serde(rename = "task.updated")]
    TaskUpdated,
    #[serde(rename = "task.deleted")]
    TaskDeleted,
    #[serde(rename = "task.queued")]
    TaskQueued,
    #[serde(rename = "task.started")]
    TaskStarted,
    #[serde(rename = "task.processing")]
    TaskProcessing,
    #[serde(rename = "task.blocked")]
    TaskBlocked,
    #[serde(rename = "task.completed")]
    TaskCompleted,
    #[serde(rename = "task.failed")]
    TaskFailed,
    #[serde(rename = "task.interrupted")]
    TaskInterrupted,
    #[serde(rename = "task.retried")]
    TaskRetried,
    #[serde(rename = "task.status.changed")]
    TaskStatusChanged,
    #[serde(rename = "task.pinned")]
    TaskPinned,
    #[serde(rename = "task.unpinned")]
    TaskUnpinned,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown event type: {s}"))
    }
}

/// A durable event-log row: the recovery substrate for external consumers.
/// Derived from the lifecycle subset of [`Event`] at the moment the Store
/// commits the underlying mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    /// Denormalized from the task row at commit time so filtering by
    /// project doesn't require a join against (possibly since-deleted) tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub metadata: serde_json::Value,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Filter for `list_events` / `GET /events` / `events watch`.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub kind: Option<EventKind>,
    pub task_id: Option<TaskId>,
    pub project: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl EventRecord {
    pub fn matches(&self, filter: &EventFilter) -> bool {
        if let Some(k) = filter.kind {
            if self.kind != k {
                return false;
            }
        }
        if let Some(id) = filter.task_id {
            if self.task_id != Some(id) {
                return false;
            }
        }
        if let Some(project) = &filter.project {
            if self.project.as_deref() != Some(project.as_str()) {
                return false;
            }
        }
        if let Some(since) = filter.since {
            if self.created_at < since {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
