// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-socket accept loop and request dispatch. Grounded on the teacher's
//! `listener/mod.rs` (`Listener::run`, per-connection spawn, read-dispatch-
//! write with a timeout on each side) and `listener/mutations.rs`/`query*.rs`
//! (one function per request variant), generalized from the teacher's
//! Job/Agent/Session/Workspace surface onto the Task domain.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use ty_core::{EventFilter, TaskConfig, TaskId, TaskStatus, TaskType};
use ty_storage::{TaskFilter, TaskPatch};

use crate::lifecycle::Daemon;
use crate::protocol::{
    BoardColumn, EventEntry, Request, Response, TaskDetail, TaskSummary, WebhookEntry,
};
use crate::protocol_wire::{self, DEFAULT_TIMEOUT};

#[derive(Debug, Error)]
enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol_wire::ProtocolError),
}

pub async fn run(listener: UnixListener, daemon: Arc<Daemon>) {
    loop {
        tokio::select! {
            _ = daemon.shutdown.cancelled() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let daemon = daemon.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, daemon).await {
                                tracing::debug!(error = %err, "connection closed");
                            }
                        });
                    }
                    Err(err) => tracing::warn!(error = %err, "accept failed"),
                }
            }
        }
    }
}

async fn handle_connection(mut stream: UnixStream, daemon: Arc<Daemon>) -> Result<(), ConnectionError> {
    loop {
        let request = match protocol_wire::read_request(&mut stream, DEFAULT_TIMEOUT).await {
            Ok(request) => request,
            Err(protocol_wire::ProtocolError::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        let response = handle_request(&daemon, request).await;
        protocol_wire::write_response(&mut stream, &response, DEFAULT_TIMEOUT).await?;
        if matches!(response, Response::ShuttingDown) {
            return Ok(());
        }
    }
}

async fn handle_request(daemon: &Daemon, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Hello { .. } => Response::Hello { version: protocol_wire::PROTOCOL_VERSION.to_string() },
        Request::Status => status(daemon),
        Request::Shutdown => {
            daemon.shutdown.cancel();
            Response::ShuttingDown
        }

        Request::Board => board(daemon),
        Request::List { status, project, include_closed } => list(daemon, status, project, include_closed),
        Request::Show { id, include_logs } => show(daemon, id, include_logs),
        Request::Create { title, project, kind, body, executor } => create(daemon, title, project, kind, body, executor),
        Request::Update { id, title, body, executor, dangerous_mode } => {
            update(daemon, id, title, body, executor, dangerous_mode)
        }
        Request::Execute { id } => execute(daemon, id).await,
        Request::Retry { id, feedback } => retry(daemon, id, feedback).await,
        Request::SetStatus { id, status } => set_status(daemon, id, status).await,
        Request::Pin { id, pinned } => pin(daemon, id, pinned),
        Request::Close { id } => close(daemon, id).await,
        Request::Delete { id } => delete(daemon, id),
        Request::Logs { id, limit } => logs(daemon, id, limit),

        Request::EventsList { limit, kind, task_id, project } => events_list(daemon, limit, kind, task_id, project),
        Request::WebhookAdd { url } => Response::Webhook { webhook: to_webhook_entry(daemon.events.register_webhook(url)) },
        Request::WebhookList => Response::Webhooks {
            webhooks: daemon.events.list_webhooks().into_iter().map(to_webhook_entry).collect(),
        },
        Request::WebhookRemove { id } => {
            if daemon.events.remove_webhook(ty_engine::event_manager::WebhookId(id)) {
                Response::Ok
            } else {
                Response::Error { message: format!("no webhook with id {id}") }
            }
        }
    }
}

fn to_webhook_entry(hook: ty_engine::Webhook) -> WebhookEntry {
    WebhookEntry { id: hook.id.0, url: hook.url }
}

fn status(daemon: &Daemon) -> Response {
    let queued = daemon.store.list_tasks(&TaskFilter { status: Some(TaskStatus::Queued), ..Default::default() }).len();
    let processing = daemon
        .store
        .list_tasks(&TaskFilter { status: Some(TaskStatus::Processing), ..Default::default() })
        .len();
    let blocked = daemon.store.list_tasks(&TaskFilter { status: Some(TaskStatus::Blocked), ..Default::default() }).len();
    Response::Status { uptime_secs: daemon.start_time.elapsed().as_secs(), queued, processing, blocked }
}

const BOARD_COLUMNS: [TaskStatus; 6] = [
    TaskStatus::Backlog,
    TaskStatus::Queued,
    TaskStatus::Processing,
    TaskStatus::Blocked,
    TaskStatus::Done,
    TaskStatus::Failed,
];

fn board(daemon: &Daemon) -> Response {
    let columns = BOARD_COLUMNS
        .iter()
        .map(|status| {
            let tasks = daemon
                .store
                .list_tasks(&TaskFilter { status: Some(*status), include_closed: true, ..Default::default() })
                .iter()
                .map(TaskSummary::from)
                .collect();
            BoardColumn { status: status.to_string(), tasks }
        })
        .collect();
    Response::Board { columns }
}

fn list(daemon: &Daemon, status: Option<String>, project: Option<String>, include_closed: bool) -> Response {
    let status = match status.map(|s| TaskStatus::from_str(&s)) {
        Some(Ok(status)) => Some(status),
        Some(Err(err)) => return Response::Error { message: err },
        None => None,
    };
    let filter = TaskFilter { status, project, include_closed, ..Default::default() };
    let tasks = daemon.store.list_tasks(&filter).iter().map(TaskSummary::from).collect();
    Response::Tasks { tasks }
}

fn show(daemon: &Daemon, id: u64, include_logs: bool) -> Response {
    match daemon.store.get_task(TaskId(id)) {
        Ok(task) => {
            let logs = if include_logs { daemon.store.logs(task.id) } else { Vec::new() };
            Response::Task { task: Some(Box::new(TaskDetail::from_task(&task, logs))) }
        }
        Err(err) => Response::Error { message: err.to_string() },
    }
}

fn create(
    daemon: &Daemon,
    title: String,
    project: String,
    kind: Option<String>,
    body: String,
    executor: Option<String>,
) -> Response {
    let kind = match kind.map(|k| TaskType::from_str(&k)) {
        Some(Ok(kind)) => Some(kind),
        Some(Err(err)) => return Response::Error { message: err },
        None => None,
    };
    let config = TaskConfig {
        title,
        body,
        kind,
        project,
        executor: executor.unwrap_or_else(|| daemon.engine_config.default_executor.clone()),
        ..Default::default()
    };
    match daemon.store.create_task(config) {
        Ok(task) => Response::Task { task: Some(Box::new(TaskDetail::from_task(&task, Vec::new()))) },
        Err(err) => Response::Error { message: err.to_string() },
    }
}

fn update(
    daemon: &Daemon,
    id: u64,
    title: Option<String>,
    body: Option<String>,
    executor: Option<String>,
    dangerous_mode: Option<bool>,
) -> Response {
    let patch = TaskPatch { title, body, executor, dangerous_mode, ..Default::default() };
    match daemon.store.update_task(TaskId(id), patch) {
        Ok(task) => Response::Task { task: Some(Box::new(TaskDetail::from_task(&task, Vec::new()))) },
        Err(err) => Response::Error { message: err.to_string() },
    }
}

async fn execute(daemon: &Daemon, id: u64) -> Response {
    if let Err(err) = daemon.store.queue_task(TaskId(id)) {
        return Response::Error { message: err.to_string() };
    }
    daemon.supervisor.launch_task(TaskId(id)).await.ok();
    Response::Ok
}

async fn retry(daemon: &Daemon, id: u64, feedback: Option<String>) -> Response {
    if let Err(err) = daemon.store.retry_task(TaskId(id), feedback) {
        return Response::Error { message: err.to_string() };
    }
    daemon.supervisor.launch_task(TaskId(id)).await.ok();
    Response::Ok
}

async fn set_status(daemon: &Daemon, id: u64, status: String) -> Response {
    let id = TaskId(id);
    let result = match status.as_str() {
        "queued" => daemon.store.queue_task(id).map(|_| ()),
        "processing" => daemon.store.mark_processing(id).map(|_| ()),
        "blocked" => daemon.store.block_task(id, "set via `ty status`").map(|_| ()),
        "done" => daemon.store.complete_task(id, "").map(|_| ()),
        "failed" => daemon.store.fail_task(id, "set via `ty status`").map(|_| ()),
        "archived" => daemon.store.archive_task(id).map(|_| ()),
        other => return Response::Error { message: format!("unsupported status transition: {other}") },
    };
    match result {
        Ok(()) => Response::Ok,
        Err(err) => Response::Error { message: err.to_string() },
    }
}

fn pin(daemon: &Daemon, id: u64, pinned: bool) -> Response {
    let id = TaskId(id);
    let result = if pinned { daemon.store.pin_task(id) } else { daemon.store.unpin_task(id) };
    match result {
        Ok(()) => Response::Ok,
        Err(err) => Response::Error { message: err.to_string() },
    }
}

async fn close(daemon: &Daemon, id: u64) -> Response {
    let task_id = TaskId(id);
    if let Err(err) = daemon.supervisor.kill_task(task_id, "closed via `ty close`").await {
        tracing::debug!(error = %err, "kill_task during close was a no-op");
    }
    match daemon.store.archive_task(task_id) {
        Ok(_) => Response::Ok,
        Err(err) => Response::Error { message: err.to_string() },
    }
}

fn delete(daemon: &Daemon, id: u64) -> Response {
    match daemon.store.delete_task(TaskId(id)) {
        Ok(()) => Response::Ok,
        Err(err) => Response::Error { message: err.to_string() },
    }
}

fn logs(daemon: &Daemon, id: u64, limit: Option<usize>) -> Response {
    let mut lines: Vec<_> = daemon.store.logs(TaskId(id)).into_iter().map(Into::into).collect();
    if let Some(limit) = limit {
        let start = lines.len().saturating_sub(limit);
        lines = lines.split_off(start);
    }
    Response::Logs { lines }
}

fn events_list(
    daemon: &Daemon,
    limit: Option<usize>,
    kind: Option<String>,
    task_id: Option<u64>,
    project: Option<String>,
) -> Response {
    let kind = match kind.map(|k| ty_core::EventKind::from_str(&k)) {
        Some(Ok(kind)) => Some(kind),
        Some(Err(err)) => return Response::Error { message: err },
        None => None,
    };
    let filter = EventFilter { kind, task_id: task_id.map(TaskId), project, limit, since: None };
    let events = daemon
        .store
        .list_events(&filter)
        .into_iter()
        .map(|record| EventEntry {
            id: record.id,
            kind: record.kind.to_string(),
            task_id: record.task_id.map(|t| t.0),
            project: record.project,
            message: record.message,
            created_at: record.created_at,
        })
        .collect();
    Response::Events { events }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
