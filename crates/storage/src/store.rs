// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Store`: the public facade the rest of the engine talks to.
//!
//! Every mutation appends one or more `Event`s to the WAL, applies them to
//! the in-memory `MaterializedState`, and returns the post-apply row. WAL
//! append, state mutation, and event-log row share the same mutex-guarded
//! critical section so they can't be observed half-done. Reads take the
//! same lock but never touch disk.
//!
//! The project registry and attachment bytes deliberately live outside the
//! WAL: `projects.json` is small and rarely written, and attachment blobs
//! are large; both would bloat replay if journaled as events.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use thiserror::Error;
use ty_core::{
    Attachment, AttachmentId, Event, EventFilter, EventKind, EventRecord, FieldChange, HasErrorKind,
    LineType, Project, Task, TaskConfig, TaskId, TaskLog, TaskStatus, TaskType,
};

use crate::checkpoint::{CheckpointError, Checkpointer};
use crate::snapshot::SnapshotError;
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};

const WAL_FILE: &str = "wal.jsonl";
const SNAPSHOT_FILE: &str = "snapshot.bin";
const PROJECTS_FILE: &str = "projects.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("attachment {0} not found")]
    AttachmentNotFound(AttachmentId),
    #[error("invalid: {0}")]
    Invalid(String),
    #[error("cannot transition task {task_id} from {from} to {to}")]
    IllegalTransition {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HasErrorKind for StoreError {
    fn kind(&self) -> ty_core::ErrorKind {
        use ty_core::ErrorKind as K;
        match self {
            StoreError::TaskNotFound(_) | StoreError::AttachmentNotFound(_) => K::NotFound,
            StoreError::Invalid(_) | StoreError::IllegalTransition { .. } => K::Invalid,
            StoreError::Wal(_) | StoreError::Snapshot(_) | StoreError::Checkpoint(_) => K::Internal,
            StoreError::Io(_) => K::Io,
            StoreError::Json(_) => K::Internal,
        }
    }
}

/// Filter for `list_tasks`.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub project: Option<String>,
    pub kind: Option<TaskType>,
    pub since: Option<chrono::DateTime<Utc>>,
    pub limit: Option<usize>,
    /// When false (the default), `Done`/`Archived`/`Failed` tasks are excluded
    /// from the board view.
    pub include_closed: bool,
}

/// Partial update for `update_task`. Status is deliberately not a field here:
/// every status transition goes through its dedicated method so the state
/// machine is enforced in one place.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub kind: Option<Option<TaskType>>,
    pub executor: Option<String>,
    pub dangerous_mode: Option<bool>,
    pub scheduled_at: Option<Option<chrono::DateTime<Utc>>>,
    pub recurrence: Option<Option<ty_core::Recurrence>>,
    pub worktree_path: Option<Option<String>>,
    pub branch_name: Option<Option<String>>,
    pub port: Option<Option<u16>>,
    pub session_id: Option<Option<String>>,
    pub mux_session: Option<Option<String>>,
    pub mux_window_id: Option<Option<String>>,
    pub agent_pane_id: Option<Option<String>>,
    pub shell_pane_id: Option<Option<String>>,
    pub idle_grace_log_size: Option<Option<u64>>,
}

type Subscriber = Box<dyn Fn(&EventRecord) + Send + Sync>;

struct Inner {
    wal: Wal,
    state: MaterializedState,
    projects: HashMap<String, Project>,
    subscribers: Vec<Subscriber>,
}

/// Synchronous facade over the event-sourced storage layer.
pub struct Store {
    inner: Mutex<Inner>,
    data_dir: PathBuf,
}

impl Store {
    /// Open (or initialize) storage under `data_dir`, replaying the WAL on
    /// top of the latest snapshot.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        fs::create_dir_all(data_dir.join("attachments"))?;

        let snapshot_path = data_dir.join(SNAPSHOT_FILE);
        let (mut state, processed_seq) = match crate::checkpoint::load_snapshot(&snapshot_path)? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::default(), 0),
        };

        let wal_path = data_dir.join(WAL_FILE);
        let mut wal = Wal::open(&wal_path, processed_seq)?;
        for entry in wal.entries_after(processed_seq)? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }

        let projects = load_projects(&data_dir.join(PROJECTS_FILE))?;

        Ok(Self {
            inner: Mutex::new(Inner {
                wal,
                state,
                projects,
                subscribers: Vec::new(),
            }),
            data_dir,
        })
    }

    /// Register an in-process subscriber notified synchronously after every
    /// lifecycle event commits. Mirrors channel 1 of the Event Manager.
    pub fn subscribe(&self, listener: impl Fn(&EventRecord) + Send + Sync + 'static) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).subscribers.push(Box::new(listener));
    }

    fn commit(&self, inner: &mut Inner, event: Event) -> Result<(), StoreError> {
        let seq = inner.wal.append(&event)?;
        if inner.wal.needs_flush() {
            inner.wal.flush()?;
        }
        let before = inner.state.events.len();
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        for record in &inner.state.events[before..] {
            for sub in &inner.subscribers {
                sub(record);
            }
        }
        Ok(())
    }

    pub fn create_task(&self, config: TaskConfig) -> Result<Task, StoreError> {
        if config.title.trim().is_empty() {
            return Err(StoreError::Invalid("title must not be empty".into()));
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = TaskId::new(inner.state.next_task_id);
        let task = Task::new(id, config, Utc::now());
        self.commit(
            &mut inner,
            Event::TaskCreated {
                task: Box::new(task.clone()),
            },
        )?;
        Ok(task)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Task, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .state
            .get_task(id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(id))
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<Task> = inner
            .state
            .tasks
            .values()
            .filter(|t| {
                if !filter.include_closed && t.status.is_terminal() {
                    return false;
                }
                if let Some(status) = filter.status {
                    if t.status != status {
                        return false;
                    }
                }
                if let Some(project) = &filter.project {
                    if &t.project != project {
                        return false;
                    }
                }
                if let Some(kind) = filter.kind {
                    if t.kind != Some(kind) {
                        return false;
                    }
                }
                if let Some(since) = filter.since {
                    if t.created_at < since {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();
        out.sort_by_key(|t| t.id);
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        out
    }

    pub fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let before = inner
            .state
            .get_task(id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(id))?;
        let mut after = before.clone();
        apply_patch(&mut after, &patch);

        let changes = diff_fields(&before, &after)?;
        if changes.is_empty() {
            return Ok(before);
        }
        self.commit(&mut inner, Event::TaskUpdated { task_id: id, changes })?;
        inner
            .state
            .get_task(id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(id))
    }

    pub fn delete_task(&self, id: TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state.get_task(id).is_none() {
            return Err(StoreError::TaskNotFound(id));
        }
        self.commit(&mut inner, Event::TaskDeleted { task_id: id })
    }

    fn transition(
        &self,
        id: TaskId,
        to: TaskStatus,
        event: impl FnOnce() -> Event,
    ) -> Result<Task, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let task = inner
            .state
            .get_task(id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(id))?;
        if !task.status.can_transition_to(to) {
            return Err(StoreError::IllegalTransition {
                task_id: id,
                from: task.status,
                to,
            });
        }
        self.commit(&mut inner, event())?;
        Ok(inner.state.get_task(id).cloned().expect("just mutated"))
    }

    pub fn queue_task(&self, id: TaskId) -> Result<Task, StoreError> {
        self.transition(id, TaskStatus::Queued, || Event::TaskQueued { task_id: id })
    }

    pub fn start_task(&self, id: TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state.get_task(id).is_none() {
            return Err(StoreError::TaskNotFound(id));
        }
        self.commit(&mut inner, Event::TaskStarted { task_id: id })
    }

    pub fn mark_processing(&self, id: TaskId) -> Result<Task, StoreError> {
        self.transition(id, TaskStatus::Processing, || Event::TaskProcessing {
            task_id: id,
        })
    }

    pub fn block_task(&self, id: TaskId, reason: impl Into<String>) -> Result<Task, StoreError> {
        let reason = reason.into();
        self.transition(id, TaskStatus::Blocked, || Event::TaskBlocked {
            task_id: id,
            reason,
        })
    }

    pub fn complete_task(&self, id: TaskId, summary: impl Into<String>) -> Result<Task, StoreError> {
        let summary = summary.into();
        self.transition(id, TaskStatus::Done, || Event::TaskCompleted {
            task_id: id,
            summary,
        })
    }

    pub fn fail_task(&self, id: TaskId, reason: impl Into<String>) -> Result<Task, StoreError> {
        let reason = reason.into();
        self.transition(id, TaskStatus::Failed, || Event::TaskFailed {
            task_id: id,
            reason,
        })
    }

    pub fn interrupt_task(&self, id: TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state.get_task(id).is_none() {
            return Err(StoreError::TaskNotFound(id));
        }
        self.commit(&mut inner, Event::TaskInterrupted { task_id: id })
    }

    pub fn retry_task(&self, id: TaskId, feedback: Option<String>) -> Result<Task, StoreError> {
        self.transition(id, TaskStatus::Processing, || Event::TaskRetried {
            task_id: id,
            feedback,
        })
    }

    pub fn archive_task(&self, id: TaskId) -> Result<Task, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let task = inner
            .state
            .get_task(id)
            .cloned()
            .ok_or(StoreError::TaskNotFound(id))?;
        let from = task.status;
        if !from.can_transition_to(TaskStatus::Archived) {
            return Err(StoreError::IllegalTransition {
                task_id: id,
                from,
                to: TaskStatus::Archived,
            });
        }
        self.commit(
            &mut inner,
            Event::TaskStatusChanged {
                task_id: id,
                from,
                to: TaskStatus::Archived,
            },
        )?;
        Ok(inner.state.get_task(id).cloned().expect("just mutated"))
    }

    pub fn pin_task(&self, id: TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state.get_task(id).is_none() {
            return Err(StoreError::TaskNotFound(id));
        }
        self.commit(&mut inner, Event::TaskPinned { task_id: id })
    }

    pub fn unpin_task(&self, id: TaskId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state.get_task(id).is_none() {
            return Err(StoreError::TaskNotFound(id));
        }
        self.commit(&mut inner, Event::TaskUnpinned { task_id: id })
    }

    /// Append-only; never emits a dispatched event (§4.A).
    pub fn append_log(
        &self,
        id: TaskId,
        line_type: LineType,
        content: impl Into<String>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state.get_task(id).is_none() {
            return Err(StoreError::TaskNotFound(id));
        }
        self.commit(
            &mut inner,
            Event::TaskLogAppended {
                task_id: id,
                line_type,
                content: content.into(),
            },
        )
    }

    pub fn logs(&self, id: TaskId) -> Vec<TaskLog> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.state.logs_for(id).to_vec()
    }

    pub fn add_attachment(
        &self,
        task_id: TaskId,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: &[u8],
    ) -> Result<Attachment, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.state.get_task(task_id).is_none() {
            return Err(StoreError::TaskNotFound(task_id));
        }
        let id = AttachmentId(inner.state.next_attachment_id);
        let attachment = Attachment {
            id,
            task_id,
            filename: filename.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            created_at: Utc::now(),
        };
        fs::write(self.data_dir.join("attachments").join(id.to_string()), bytes)?;
        self.commit(
            &mut inner,
            Event::TaskAttachmentAdded {
                attachment: Box::new(attachment.clone()),
            },
        )?;
        Ok(attachment)
    }

    pub fn list_attachments(&self, task_id: TaskId) -> Vec<Attachment> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .state
            .attachments_for(task_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn get_attachment(&self, id: AttachmentId) -> Result<(Attachment, Vec<u8>), StoreError> {
        let meta = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner
                .state
                .attachments
                .get(&id)
                .cloned()
                .ok_or(StoreError::AttachmentNotFound(id))?
        };
        let bytes = fs::read(self.data_dir.join("attachments").join(id.to_string()))?;
        Ok((meta, bytes))
    }

    pub fn get_project_context(&self, project: &str) -> String {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .projects
            .get(project)
            .map(|p| p.context.clone())
            .unwrap_or_default()
    }

    pub fn set_project_context(&self, project: &str, context: impl Into<String>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .projects
            .entry(project.to_string())
            .or_insert_with(|| Project::new(project, PathBuf::new()))
            .context = context.into();
        self.commit(
            &mut inner,
            Event::ProjectContextSet {
                project: project.to_string(),
            },
        )?;
        save_projects(&self.data_dir.join(PROJECTS_FILE), &inner.projects)
    }

    pub fn register_project(&self, project: Project) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.projects.insert(project.name.clone(), project);
        save_projects(&self.data_dir.join(PROJECTS_FILE), &inner.projects)
    }

    pub fn get_project(&self, name_or_alias: &str) -> Option<Project> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .projects
            .values()
            .find(|p| p.matches(name_or_alias))
            .cloned()
    }

    /// Append an externally-sourced event-log row (used by script/webhook
    /// hooks). Bypasses the closed `Event` taxonomy and the WAL — these rows
    /// are recovered via snapshot only, not replay.
    pub fn append_event(
        &self,
        kind: EventKind,
        task_id: Option<TaskId>,
        project: Option<String>,
        metadata: serde_json::Value,
        message: impl Into<String>,
    ) -> EventRecord {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.state.next_event_id += 1;
        let record = EventRecord {
            id: inner.state.next_event_id,
            kind,
            task_id,
            project,
            metadata,
            message: message.into(),
            created_at: Utc::now(),
        };
        inner.state.events.push(record.clone());
        for sub in &inner.subscribers {
            sub(&record);
        }
        record
    }

    pub fn list_events(&self, filter: &EventFilter) -> Vec<EventRecord> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<EventRecord> = inner
            .state
            .events
            .iter()
            .filter(|e| e.matches(filter))
            .cloned()
            .collect();
        if let Some(limit) = filter.limit {
            let start = out.len().saturating_sub(limit);
            out = out.split_off(start);
        }
        out
    }

    /// WAL sequence number at the time of the call, for checkpoint callers.
    pub fn wal_seq(&self) -> u64 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).wal.processed_seq()
    }

    /// Snapshot the current state for a background checkpoint.
    pub fn checkpoint_state(&self) -> (u64, MaterializedState) {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        (inner.wal.processed_seq(), inner.state.clone())
    }

    /// Truncate WAL entries before `seq`, called once a checkpoint at that
    /// sequence is durable on disk.
    pub fn truncate_wal(&self, seq: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.wal.truncate_before(seq)?)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    pub fn checkpointer(&self) -> Checkpointer {
        Checkpointer::new(self.snapshot_path())
    }
}

fn apply_patch(task: &mut Task, patch: &TaskPatch) {
    if let Some(v) = &patch.title {
        task.title = v.clone();
    }
    if let Some(v) = &patch.body {
        task.body = v.clone();
    }
    if let Some(v) = &patch.kind {
        task.kind = *v;
    }
    if let Some(v) = &patch.executor {
        task.executor = v.clone();
    }
    if let Some(v) = patch.dangerous_mode {
        task.dangerous_mode = v;
    }
    if let Some(v) = &patch.scheduled_at {
        task.scheduled_at = *v;
    }
    if let Some(v) = &patch.recurrence {
        task.recurrence = v.clone();
    }
    if let Some(v) = &patch.worktree_path {
        task.worktree_path = v.clone();
    }
    if let Some(v) = &patch.branch_name {
        task.branch_name = v.clone();
    }
    if let Some(v) = &patch.port {
        task.port = *v;
    }
    if let Some(v) = &patch.session_id {
        task.session_id = v.clone();
    }
    if let Some(v) = &patch.mux_session {
        task.mux_session = v.clone();
    }
    if let Some(v) = &patch.mux_window_id {
        task.mux_window_id = v.clone();
    }
    if let Some(v) = &patch.agent_pane_id {
        task.agent_pane_id = v.clone();
    }
    if let Some(v) = &patch.shell_pane_id {
        task.shell_pane_id = v.clone();
    }
    if let Some(v) = &patch.idle_grace_log_size {
        task.idle_grace_log_size = *v;
    }
    task.updated_at = Utc::now();
}

fn diff_fields(before: &Task, after: &Task) -> Result<HashMap<String, FieldChange>, StoreError> {
    let before_value = serde_json::to_value(before)?;
    let after_value = serde_json::to_value(after)?;
    let mut changes = HashMap::new();
    if let (Some(b), Some(a)) = (before_value.as_object(), after_value.as_object()) {
        for (key, new) in a {
            if key == "updated_at" {
                continue;
            }
            let old = b.get(key).cloned().unwrap_or(serde_json::Value::Null);
            if &old != new {
                changes.insert(
                    key.clone(),
                    FieldChange {
                        old,
                        new: new.clone(),
                    },
                );
            }
        }
    }
    Ok(changes)
}

fn load_projects(path: &Path) -> Result<HashMap<String, Project>, StoreError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn save_projects(path: &Path, projects: &HashMap<String, Project>) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(projects)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
