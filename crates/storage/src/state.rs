// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state rebuilt from WAL replay.
//!
//! Mirrors the event-sourcing split used everywhere in this crate: events
//! are facts about what happened, state is derived from those facts by
//! calling [`MaterializedState::apply_event`] in sequence. Every handler
//! must be idempotent, because entries are replayed both from a snapshot
//! cursor and (for the in-process fast path) applied once more immediately
//! on append.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ty_core::{
    Attachment, AttachmentId, Event, EventKind, EventRecord, FieldChange, Task, TaskId, TaskLog,
    TaskStatus,
};

/// Materialized state built from WAL events.
///
/// The project registry (`projects.json`) is deliberately not part of this
/// struct: it's small, infrequently written, and lives beside the WAL as
/// its own flat file rather than being replayed from events.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub tasks: HashMap<TaskId, Task>,
    #[serde(default)]
    pub task_logs: HashMap<TaskId, Vec<TaskLog>>,
    #[serde(default)]
    pub attachments: HashMap<AttachmentId, Attachment>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub next_task_id: u64,
    #[serde(default)]
    pub next_attachment_id: u64,
    #[serde(default)]
    pub next_event_id: u64,
}

impl MaterializedState {
    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn logs_for(&self, id: TaskId) -> &[TaskLog] {
        self.task_logs.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn attachments_for(&self, id: TaskId) -> Vec<&Attachment> {
        let mut out: Vec<&Attachment> = self
            .attachments
            .values()
            .filter(|a| a.task_id == id)
            .collect();
        out.sort_by_key(|a| a.id.0);
        out
    }

    /// Apply an event to derive state changes.
    ///
    /// All handlers must be idempotent: applying the same event twice must
    /// produce the same state as applying it once, since replay can re-run
    /// entries the in-memory state already has applied.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::TaskCreated { task } => {
                self.tasks
                    .entry(task.id)
                    .or_insert_with(|| (**task).clone());
                if task.id.0 >= self.next_task_id {
                    self.next_task_id = task.id.0 + 1;
                }
            }
            Event::TaskUpdated { task_id, changes } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    apply_field_changes(task, changes);
                }
            }
            Event::TaskDeleted { task_id } => {
                self.tasks.remove(task_id);
                self.task_logs.remove(task_id);
            }
            Event::TaskQueued { task_id } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.status = TaskStatus::Queued;
                    task.updated_at = Utc::now();
                }
            }
            Event::TaskStarted { task_id } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    if task.started_at.is_none() {
                        task.started_at = Some(Utc::now());
                    }
                }
            }
            Event::TaskProcessing { task_id } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.status = TaskStatus::Processing;
                    task.last_run_at = Some(Utc::now());
                    task.updated_at = Utc::now();
                }
            }
            Event::TaskBlocked { task_id, .. } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.status = TaskStatus::Blocked;
                    task.updated_at = Utc::now();
                }
            }
            Event::TaskCompleted { task_id, summary } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.status = TaskStatus::Done;
                    task.completed_at = Some(Utc::now());
                    task.summary = Some(summary.clone());
                    task.updated_at = Utc::now();
                }
            }
            Event::TaskFailed { task_id, .. } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.status = TaskStatus::Failed;
                    task.updated_at = Utc::now();
                }
            }
            Event::TaskInterrupted { task_id } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.last_suspended_at = Some(Utc::now());
                }
            }
            Event::TaskRetried { task_id, .. } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.status = TaskStatus::Processing;
                    task.total_retries += 1;
                    task.summary = None;
                    task.idle_grace_log_size = None;
                    task.updated_at = Utc::now();
                }
            }
            Event::TaskStatusChanged { task_id, to, .. } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.status = *to;
                    task.updated_at = Utc::now();
                }
            }
            Event::TaskPinned { task_id } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.pinned = true;
                }
            }
            Event::TaskUnpinned { task_id } => {
                if let Some(task) = self.tasks.get_mut(task_id) {
                    task.pinned = false;
                }
            }
            Event::TaskLogAppended {
                task_id,
                line_type,
                content,
            } => {
                self.task_logs.entry(*task_id).or_default().push(TaskLog {
                    task_id: *task_id,
                    line_type: *line_type,
                    content: content.clone(),
                    created_at: Utc::now(),
                });
            }
            // Journal-only: the project row itself lives in projects.json,
            // updated directly by the Store outside the WAL.
            Event::ProjectContextSet { .. } => {}
            Event::TaskAttachmentAdded { attachment } => {
                if attachment.id.0 >= self.next_attachment_id {
                    self.next_attachment_id = attachment.id.0 + 1;
                }
                self.attachments
                    .entry(attachment.id)
                    .or_insert_with(|| (**attachment).clone());
            }
        }

        if event.is_lifecycle() {
            if let Some(kind) = event.kind() {
                self.append_event_record(kind, event);
            }
        }
    }

    fn append_event_record(&mut self, kind: EventKind, event: &Event) {
        self.next_event_id += 1;
        let task_id = event.task_id();
        let project = task_id
            .and_then(|id| self.tasks.get(&id))
            .map(|t| t.project.clone());
        let metadata = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
        let message = describe(kind, task_id);
        self.events.push(EventRecord {
            id: self.next_event_id,
            kind,
            task_id,
            project,
            metadata,
            message,
            created_at: Utc::now(),
        });
    }
}

fn describe(kind: EventKind, task_id: Option<TaskId>) -> String {
    match task_id {
        Some(id) => format!("{kind} (task {id})"),
        None => kind.to_string(),
    }
}

/// Patch a [`Task`] with a set of named field changes by round-tripping
/// through JSON. Keeps `TaskUpdated` from needing a match arm per field.
fn apply_field_changes(task: &mut Task, changes: &HashMap<String, FieldChange>) {
    let mut value = match serde_json::to_value(&*task) {
        Ok(v) => v,
        Err(_) => return,
    };
    if let Some(obj) = value.as_object_mut() {
        for (field, change) in changes {
            obj.insert(field.clone(), change.new.clone());
        }
    }
    if let Ok(patched) = serde_json::from_value(value) {
        *task = patched;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
