// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::net::UnixStream;
use ty_daemon::protocol::{self, ProtocolError};
use ty_daemon::{
    BoardColumn, EventEntry, LogLine, Request, Response, TaskDetail, TaskSummary, WebhookEntry,
};

use crate::client_lifecycle::log_connection_error;
use crate::daemon_process::{
    cleanup_stale_socket, daemon_dir, daemon_socket, probe_socket, read_startup_error,
    start_daemon_background, stop_daemon_sync, wrap_with_startup_error,
};

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests.
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("TY_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon to start.
pub fn timeout_connect() -> Duration {
    parse_duration_ms("TY_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for a process to exit.
pub fn timeout_exit() -> Duration {
    parse_duration_ms("TY_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for connection retries.
pub fn poll_interval() -> Duration {
    parse_duration_ms("TY_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    DaemonNotRunning,

    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("unexpected response from daemon")]
    UnexpectedResponse,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine state directory")]
    NoStateDir,
}

/// Daemon client.
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For action commands: auto-start the daemon, max one restart per process.
    pub fn for_action() -> Result<Self, ClientError> {
        Self::connect_or_start_once()
    }

    /// For query commands: connect only, no restart.
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    fn connect_or_start_once() -> Result<Self, ClientError> {
        static RESTARTED: AtomicBool = AtomicBool::new(false);

        if RESTARTED.load(Ordering::SeqCst) {
            return Self::connect_or_start();
        }

        let daemon_dir = daemon_dir()?;
        let version_path = daemon_dir.join("tyd.version");
        if let Ok(daemon_version) = std::fs::read_to_string(&version_path) {
            let cli_version = protocol::PROTOCOL_VERSION;
            if daemon_version.trim() != cli_version {
                RESTARTED.store(true, Ordering::SeqCst);
                eprintln!(
                    "warn: daemon version {} does not match cli version {}, restarting daemon",
                    daemon_version.trim(),
                    cli_version
                );
                stop_daemon_sync();
            }
        }

        Self::connect_or_start()
    }

    /// Connect to the daemon, auto-starting it if it isn't running.
    pub fn connect_or_start() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    /// Connect to an already-running daemon, no auto-start.
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_socket()?;

        if !socket_path.exists() {
            let err = ClientError::DaemonNotRunning;
            log_connection_error(&err);
            return Err(err);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let poll_start = Instant::now();
                    while poll_start.elapsed() < timeout_exit() {
                        if let Some(err) = read_startup_error() {
                            return Err(ClientError::DaemonStartFailed(err));
                        }
                        std::thread::sleep(poll_interval());
                    }
                    return Err(ClientError::DaemonStartFailed(format!("exited with {status}")));
                }
                Ok(None) => {}
                Err(_) => {}
            }

            match Self::connect() {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => std::thread::sleep(poll_interval()),
                Err(e) => return Err(wrap_with_startup_error(e)),
            }
        }

        Err(wrap_with_startup_error(ClientError::DaemonStartTimeout))
    }

    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes = tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        Ok(protocol::decode(&response_bytes)?)
    }

    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        match self.send_with_timeout(request, timeout_ipc(), timeout_ipc()).await {
            Ok(response) => Ok(response),
            Err(e) => {
                log_connection_error(&e);
                Err(e)
            }
        }
    }

    async fn send_simple(&self, request: &Request) -> Result<(), ClientError> {
        match self.send(request).await? {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            other => Self::reject(other),
        }
    }

    fn reject<T>(resp: Response) -> Result<T, ClientError> {
        match resp {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello { version: protocol::PROTOCOL_VERSION.to_string() };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    pub async fn status(&self) -> Result<(u64, usize, usize, usize), ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { uptime_secs, queued, processing, blocked } => {
                Ok((uptime_secs, queued, processing, blocked))
            }
            other => Self::reject(other),
        }
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn board(&self) -> Result<Vec<BoardColumn>, ClientError> {
        match self.send(&Request::Board).await? {
            Response::Board { columns } => Ok(columns),
            other => Self::reject(other),
        }
    }

    pub async fn list(
        &self,
        status: Option<&str>,
        project: Option<&str>,
        include_closed: bool,
    ) -> Result<Vec<TaskSummary>, ClientError> {
        let request = Request::List {
            status: status.map(String::from),
            project: project.map(String::from),
            include_closed,
        };
        match self.send(&request).await? {
            Response::Tasks { tasks } => Ok(tasks),
            other => Self::reject(other),
        }
    }

    pub async fn show(&self, id: u64, include_logs: bool) -> Result<Option<TaskDetail>, ClientError> {
        match self.send(&Request::Show { id, include_logs }).await? {
            Response::Task { task } => Ok(task.map(|b| *b)),
            other => Self::reject(other),
        }
    }

    pub async fn create(
        &self,
        title: &str,
        project: &str,
        kind: Option<&str>,
        body: &str,
        executor: Option<&str>,
    ) -> Result<TaskDetail, ClientError> {
        let request = Request::Create {
            title: title.to_string(),
            project: project.to_string(),
            kind: kind.map(String::from),
            body: body.to_string(),
            executor: executor.map(String::from),
        };
        match self.send(&request).await? {
            Response::Task { task: Some(task) } => Ok(*task),
            Response::Task { task: None } => Err(ClientError::UnexpectedResponse),
            other => Self::reject(other),
        }
    }

    pub async fn update(
        &self,
        id: u64,
        title: Option<&str>,
        body: Option<&str>,
        executor: Option<&str>,
        dangerous_mode: Option<bool>,
    ) -> Result<TaskDetail, ClientError> {
        let request = Request::Update {
            id,
            title: title.map(String::from),
            body: body.map(String::from),
            executor: executor.map(String::from),
            dangerous_mode,
        };
        match self.send(&request).await? {
            Response::Task { task: Some(task) } => Ok(*task),
            Response::Task { task: None } => Err(ClientError::UnexpectedResponse),
            other => Self::reject(other),
        }
    }

    pub async fn execute(&self, id: u64) -> Result<(), ClientError> {
        self.send_simple(&Request::Execute { id }).await
    }

    pub async fn retry(&self, id: u64, feedback: Option<&str>) -> Result<(), ClientError> {
        self.send_simple(&Request::Retry { id, feedback: feedback.map(String::from) }).await
    }

    pub async fn set_status(&self, id: u64, status: &str) -> Result<(), ClientError> {
        self.send_simple(&Request::SetStatus { id, status: status.to_string() }).await
    }

    pub async fn pin(&self, id: u64, pinned: bool) -> Result<(), ClientError> {
        self.send_simple(&Request::Pin { id, pinned }).await
    }

    pub async fn close(&self, id: u64) -> Result<(), ClientError> {
        self.send_simple(&Request::Close { id }).await
    }

    pub async fn delete(&self, id: u64) -> Result<(), ClientError> {
        self.send_simple(&Request::Delete { id }).await
    }

    pub async fn logs(&self, id: u64, limit: Option<usize>) -> Result<Vec<LogLine>, ClientError> {
        match self.send(&Request::Logs { id, limit }).await? {
            Response::Logs { lines } => Ok(lines),
            other => Self::reject(other),
        }
    }

    pub async fn events_list(
        &self,
        limit: Option<usize>,
        kind: Option<&str>,
        task_id: Option<u64>,
        project: Option<&str>,
    ) -> Result<Vec<EventEntry>, ClientError> {
        let request = Request::EventsList {
            limit,
            kind: kind.map(String::from),
            task_id,
            project: project.map(String::from),
        };
        match self.send(&request).await? {
            Response::Events { events } => Ok(events),
            other => Self::reject(other),
        }
    }

    pub async fn webhook_add(&self, url: &str) -> Result<WebhookEntry, ClientError> {
        match self.send(&Request::WebhookAdd { url: url.to_string() }).await? {
            Response::Webhook { webhook } => Ok(webhook),
            other => Self::reject(other),
        }
    }

    pub async fn webhook_list(&self) -> Result<Vec<WebhookEntry>, ClientError> {
        match self.send(&Request::WebhookList).await? {
            Response::Webhooks { webhooks } => Ok(webhooks),
            other => Self::reject(other),
        }
    }

    pub async fn webhook_remove(&self, id: u64) -> Result<(), ClientError> {
        self.send_simple(&Request::WebhookRemove { id }).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
