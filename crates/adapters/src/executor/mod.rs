// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor adapters: one implementation per supported coding-agent CLI
//! (`claude`, `codex`, `gemini`), plus a `fake` variant behind
//! `test-support`.
//!
//! An executor owns the process lifecycle of an agent CLI: building its
//! launch command, starting it inside a multiplexer window, detecting and
//! dismissing interactive first-run prompts, and signalling it to suspend
//! or resume. It does not know about tasks, the WAL, or hook records — the
//! Executor Supervisor in the engine crate wires an `ExecutorAdapter` up to
//! the rest of the system.

mod claude;
mod codex;
mod gemini;
pub(crate) mod prompt;
pub(crate) mod signal;

pub use claude::ClaudeExecutorAdapter;
pub use codex::CodexExecutorAdapter;
pub use gemini::GeminiExecutorAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecutorCall, FakeExecutorAdapter};

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use ty_core::{ErrorKind, HasErrorKind};

/// What to launch and where.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Stable name used to derive the multiplexer window id.
    pub name: String,
    pub cwd: PathBuf,
    /// Initial prompt sent to the agent once it's ready for input.
    pub prompt: String,
    /// Resume an existing agent session instead of starting fresh.
    pub resume_session_id: Option<String>,
    /// Whether to pass the executor's permission-bypass flag.
    pub dangerous_mode: bool,
    pub env: Vec<(String, String)>,
    pub session_config: HashMap<String, serde_json::Value>,
}

/// Handle to a launched executor process.
#[derive(Debug, Clone)]
pub struct ExecutorHandle {
    pub window_id: String,
    /// The agent's own session id, if the executor reports one (used for `resume`).
    pub session_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("executor not available: {0}")]
    Unavailable(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("kill failed: {0}")]
    KillFailed(String),
    #[error("suspend failed: {0}")]
    SuspendFailed(String),
    #[error("handle not found: {0}")]
    NotFound(String),
}

impl HasErrorKind for ExecutorError {
    fn kind(&self) -> ErrorKind {
        match self {
            ExecutorError::Unavailable(_) => ErrorKind::Unavailable,
            ExecutorError::NotFound(_) => ErrorKind::NotFound,
            ExecutorError::SpawnFailed(_)
            | ExecutorError::SendFailed(_)
            | ExecutorError::KillFailed(_)
            | ExecutorError::SuspendFailed(_) => ErrorKind::Internal,
        }
    }
}

/// One supported coding-agent CLI.
#[async_trait]
pub trait ExecutorAdapter: Send + Sync + 'static {
    /// Stable identifier (`"claude"`, `"codex"`, `"gemini"`).
    fn name(&self) -> &'static str;

    /// Whether the underlying binary is on `PATH`.
    async fn is_available(&self) -> bool;

    /// Render the shell command line this executor would run for `spec`,
    /// without executing it. Used by `execute`/`resume` and exposed
    /// separately so callers can log or preview it.
    fn build_command(&self, spec: &LaunchSpec) -> String;

    /// Launch a fresh agent process for `spec`.
    async fn execute(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError>;

    /// Resume a previously suspended or disconnected agent session.
    /// `spec.resume_session_id` must be set.
    async fn resume(&self, spec: LaunchSpec) -> Result<ExecutorHandle, ExecutorError>;

    /// OS pid of the executor's foreground process, if known.
    async fn get_pid(&self, handle: &ExecutorHandle) -> Option<u32>;

    /// Terminate the executor process and its window.
    async fn kill(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError>;

    /// Pause the executor process (`SIGSTOP` on Unix) without killing it.
    async fn suspend(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError>;

    /// Resume a suspended executor process (`SIGCONT` on Unix).
    async fn resume_process(&self, handle: &ExecutorHandle) -> Result<(), ExecutorError>;

    /// Whether the executor process is currently suspended.
    async fn is_suspended(&self, handle: &ExecutorHandle) -> bool;
}

/// Whether the named executor variant supports `resume`. `gemini` has no
/// resume flag; callers that try `resume()` against it get `Unavailable`.
pub fn supports_resume(executor_name: &str) -> bool {
    matches!(executor_name, "claude" | "codex")
}

/// Whether `bin` resolves on `PATH`, without actually invoking it.
pub(crate) fn which(bin: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(bin).is_file()))
        .unwrap_or(false)
}
