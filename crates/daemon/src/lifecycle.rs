// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown. Grounded on the teacher's
//! `lifecycle/mod.rs`: acquire the lock file before binding the socket,
//! remove a stale socket, bind last so a partially-started daemon never
//! holds a live listener. Unlike the teacher, there is no WAL/snapshot
//! replay here — `ty_storage::Store::open` already owns that — so startup
//! is one lock, one `Store::open`, one engine config load, and one socket
//! bind.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use ty_adapters::{
    ClaudeExecutorAdapter, CodexExecutorAdapter, ExecutorAdapter, GeminiExecutorAdapter,
    TmuxMultiplexerAdapter,
};
use ty_engine::{EngineConfig, EventManager};
use ty_storage::Store;

use crate::protocol_wire::PROTOCOL_VERSION;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine a state directory: $HOME is unset")]
    NoStateDir,
    #[error("daemon already running (lock held at {0})")]
    LockFailed(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("store error: {0}")]
    Store(#[from] ty_storage::StoreError),
}

/// Resolved filesystem layout under the state directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
    pub http_port: u16,
}

impl Config {
    pub fn load(state_dir: PathBuf) -> Self {
        let http_port = std::env::var("TY_HTTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3333);
        Self {
            socket_path: state_dir.join("tyd.sock"),
            lock_path: state_dir.join("tyd.lock"),
            version_path: state_dir.join("tyd.version"),
            log_path: state_dir.join("tyd.log"),
            http_port,
            state_dir,
        }
    }
}

/// Everything the listener and HTTP server need a handle to.
pub struct Daemon {
    pub store: Arc<Store>,
    pub engine_config: EngineConfig,
    pub supervisor: Arc<ty_engine::Supervisor<TmuxMultiplexerAdapter>>,
    pub events: Arc<EventManager>,
    pub start_time: std::time::Instant,
    pub shutdown: CancellationToken,
}

pub struct StartupResult {
    pub daemon: Arc<Daemon>,
    pub listener: UnixListener,
    pub lock_file: fs::File,
}

/// Acquire the lock, open the store, bind the socket. Cleans up lock/socket/
/// version files on any failure other than `LockFailed` (those files belong
/// to the daemon that already holds the lock).
pub fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config) {
        Ok(result) => Ok(result),
        Err(err) => {
            if !matches!(err, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(err)
        }
    }
}

fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    fs::create_dir_all(&config.state_dir)?;

    let lock_file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(|_| LifecycleError::LockFailed(config.lock_path.clone()))?;
    fs::write(&config.lock_path, std::process::id().to_string())?;

    let store = Arc::new(Store::open(&config.state_dir)?);
    let engine_config = EngineConfig::load(&config.state_dir);
    fs::create_dir_all(&engine_config.worktrees_dir)?;
    fs::create_dir_all(&engine_config.hooks_dir)?;

    let mux = TmuxMultiplexerAdapter::new();
    let mut executors: HashMap<String, Arc<dyn ExecutorAdapter>> = HashMap::new();
    executors.insert("claude".to_string(), Arc::new(ClaudeExecutorAdapter::new(mux.clone())));
    executors.insert("codex".to_string(), Arc::new(CodexExecutorAdapter::new(mux.clone())));
    executors.insert("gemini".to_string(), Arc::new(GeminiExecutorAdapter::new(mux.clone())));

    let shutdown = CancellationToken::new();
    let supervisor = Arc::new(ty_engine::Supervisor::new(
        store.clone(),
        engine_config.clone(),
        executors,
        mux,
        shutdown.clone(),
    ));

    let events = Arc::new(EventManager::new(
        engine_config.hooks_dir.clone(),
        engine_config.webhooks_path.clone(),
        engine_config.webhook_queue_depth,
    ));
    ty_engine::event_manager::wire_store_subscriber(&store, events.clone());

    fs::write(&config.version_path, PROTOCOL_VERSION)?;

    if config.socket_path.exists() {
        fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)?;

    let daemon = Arc::new(Daemon {
        store,
        engine_config,
        supervisor,
        events,
        start_time: std::time::Instant::now(),
        shutdown,
    });

    Ok(StartupResult { daemon, listener, lock_file })
}

fn cleanup_on_failure(config: &Config) {
    let _ = fs::remove_file(&config.socket_path);
    let _ = fs::remove_file(&config.version_path);
    let _ = fs::remove_file(&config.lock_path);
}

pub fn shutdown(config: &Config, daemon: &Daemon) {
    daemon.shutdown.cancel();
    let _ = fs::remove_file(&config.socket_path);
    let _ = fs::remove_file(&config.version_path);
    let _ = fs::remove_file(&config.lock_path);
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
