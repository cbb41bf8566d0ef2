// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal multiplexer adapters.
//!
//! An executor needs somewhere to run the agent CLI it spawns: a pane it can
//! type into, capture output from, and tear down independently of the daemon
//! process. This trait is the narrow slice of tmux that `ExecutorAdapter`
//! implementations depend on; it knows nothing about agents, prompts, or
//! task lifecycle.

mod noop;
mod tmux;

pub use noop::NoOpMultiplexerAdapter;
pub use tmux::TmuxMultiplexerAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMultiplexerAdapter, FakeWindow, MultiplexerCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use ty_core::{ErrorKind, HasErrorKind};

/// Errors from multiplexer operations
#[derive(Debug, Error)]
pub enum MultiplexerError {
    #[error("window not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

impl HasErrorKind for MultiplexerError {
    fn kind(&self) -> ErrorKind {
        match self {
            MultiplexerError::NotFound(_) => ErrorKind::NotFound,
            MultiplexerError::SpawnFailed(_) | MultiplexerError::CommandFailed(_) => {
                ErrorKind::Unavailable
            }
        }
    }
}

/// Adapter for managing terminal multiplexer windows (tmux, etc.)
#[async_trait]
pub trait MultiplexerAdapter: Clone + Send + Sync + 'static {
    /// Create a new window running `cmd` in `cwd`, returning an opaque window id.
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, MultiplexerError>;

    /// Send a key sequence to a window (interpreted, e.g. tmux key names).
    async fn send(&self, id: &str, input: &str) -> Result<(), MultiplexerError>;

    /// Send literal text to a window (no key-name interpretation).
    async fn send_literal(&self, id: &str, text: &str) -> Result<(), MultiplexerError>;

    /// Send the Enter key to a window.
    async fn send_enter(&self, id: &str) -> Result<(), MultiplexerError>;

    /// Tear down a window.
    async fn kill(&self, id: &str) -> Result<(), MultiplexerError>;

    /// Whether the window still exists.
    async fn is_alive(&self, id: &str) -> Result<bool, MultiplexerError>;

    /// Capture the last `lines` of a window's scrollback.
    async fn capture_output(&self, id: &str, lines: u32) -> Result<String, MultiplexerError>;

    /// Whether a process matching `pattern` is running inside the window.
    async fn is_process_running(&self, id: &str, pattern: &str) -> Result<bool, MultiplexerError>;

    /// PID of the window's foreground pane process, if known.
    async fn get_pid(&self, id: &str) -> Result<Option<u32>, MultiplexerError>;

    /// Exit code of the pane's process, once it has exited.
    async fn get_exit_code(&self, id: &str) -> Result<Option<i32>, MultiplexerError>;

    /// Apply cosmetic configuration (status bar, title) to an existing window.
    /// Default implementation is a no-op.
    async fn configure(
        &self,
        _id: &str,
        _config: &serde_json::Value,
    ) -> Result<(), MultiplexerError> {
        Ok(())
    }
}
