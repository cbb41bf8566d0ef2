// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-wide error type. Wraps the per-concern errors raised by the
//! Worktree Manager, Executor Supervisor, MCP Server, Hook Ingestor, and
//! Scheduler behind one `HasErrorKind` impl so the daemon listener and MCP
//! dispatch can classify failures without matching on every inner variant.

use thiserror::Error;
use ty_adapters::{ExecutorError, MultiplexerError};
use ty_core::{ErrorKind, HasErrorKind};
use ty_storage::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("multiplexer error: {0}")]
    Multiplexer(#[from] MultiplexerError),
    #[error("worktree error: {0}")]
    Worktree(String),
    #[error("spotlight error: {0}")]
    Spotlight(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid: {0}")]
    Invalid(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl HasErrorKind for EngineError {
    fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Store(e) => e.kind(),
            EngineError::Executor(e) => e.kind(),
            EngineError::Multiplexer(e) => e.kind(),
            EngineError::Worktree(_) | EngineError::Spotlight(_) | EngineError::Invalid(_) => {
                ErrorKind::Invalid
            }
            EngineError::Io(_) => ErrorKind::Io,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Unavailable(_) => ErrorKind::Unavailable,
            EngineError::Conflict(_) => ErrorKind::Conflict,
        }
    }
}
