// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task You Daemon (tyd)
//!
//! Background process that owns the Task Execution Engine: the Unix-socket
//! IPC listener the `ty` CLI talks to, the local HTTP API for events and
//! webhooks, and the scheduler loop that promotes queued tasks and reaps
//! idle ones.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod http;
mod lifecycle;
mod listener;
mod mcp_stdio;
mod protocol;
mod protocol_wire;

use std::path::PathBuf;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::lifecycle::{Config, LifecycleError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "mcp-stdio" {
        let parsed = parse_mcp_stdio_args(&args[2..])?;
        mcp_stdio::run(parsed).await?;
        return Ok(());
    }

    if let Some(arg) = args.get(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("tyd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: tyd [--help | --version | mcp-stdio ...]");
                std::process::exit(1);
            }
        }
    }

    let state_dir = env::state_dir()?;
    let config = Config::load(state_dir);

    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config)?;
    let log_guard = setup_logging(&config)?;

    info!("starting tyd");

    let lifecycle::StartupResult { daemon, listener: unix_listener, lock_file: _lock_file } =
        match lifecycle::startup(&config) {
            Ok(result) => result,
            Err(LifecycleError::LockFailed(lock_path)) => {
                let pid = std::fs::read_to_string(&lock_path).unwrap_or_default().trim().to_string();
                eprintln!("tyd is already running");
                if !pid.is_empty() {
                    eprintln!("  pid: {pid}");
                }
                std::process::exit(1);
            }
            Err(err) => {
                write_startup_error(&config, &err);
                error!("failed to start daemon: {err}");
                drop(log_guard);
                return Err(err.into());
            }
        };

    tokio::spawn(listener::run(unix_listener, daemon.clone()));

    let http_addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.http_port));
    let http_router = http::router(daemon.clone());
    let http_shutdown = daemon.shutdown.clone();
    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(http_addr).await {
            Ok(tcp_listener) => {
                let serve = axum::serve(tcp_listener, http_router);
                tokio::select! {
                    result = serve => {
                        if let Err(err) = result {
                            error!(error = %err, "http server exited");
                        }
                    }
                    _ = http_shutdown.cancelled() => {}
                }
            }
            Err(err) => error!(error = %err, "failed to bind http listener"),
        }
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let signal_shutdown = daemon.shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
        }
        signal_shutdown.cancel();
    });

    println!("READY");
    info!(socket = %config.socket_path.display(), http_port = config.http_port, "tyd ready");

    ty_engine::scheduler::run(&daemon.store, daemon.engine_config.concurrency, daemon.supervisor.as_ref(), daemon.shutdown.clone())
        .await;

    lifecycle::shutdown(&config, &daemon);
    info!("tyd stopped");
    Ok(())
}

fn parse_mcp_stdio_args(args: &[String]) -> Result<mcp_stdio::McpStdioArgs, Box<dyn std::error::Error>> {
    let mut data_dir = None;
    let mut task_id = None;
    let mut project = None;
    let mut worktree = None;
    let mut main_repo = None;

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let value = iter.next().ok_or_else(|| format!("missing value for {flag}"))?;
        match flag.as_str() {
            "--data-dir" => data_dir = Some(PathBuf::from(value)),
            "--task-id" => task_id = Some(value.parse::<u64>()?),
            "--project" => project = Some(value.clone()),
            "--worktree" => worktree = Some(PathBuf::from(value)),
            "--main-repo" => main_repo = Some(PathBuf::from(value)),
            other => return Err(format!("unknown mcp-stdio flag: {other}").into()),
        }
    }

    Ok(mcp_stdio::McpStdioArgs {
        data_dir: data_dir.ok_or("missing --data-dir")?,
        task_id: task_id.ok_or("missing --task-id")?,
        project: project.ok_or("missing --project")?,
        worktree: worktree.ok_or("missing --worktree")?,
        main_repo: main_repo.ok_or("missing --main-repo")?,
    })
}

fn print_help() {
    println!("tyd {}", env!("CARGO_PKG_VERSION"));
    println!("Task You Daemon - background process that owns the Task Execution Engine");
    println!();
    println!("USAGE:");
    println!("    tyd");
    println!("    tyd mcp-stdio --data-dir <dir> --task-id <id> --project <name> --worktree <dir> --main-repo <dir>");
    println!();
    println!("The daemon is typically started by the `ty` CLI and should not be invoked");
    println!("directly. It listens on a Unix socket for commands from `ty` and serves the");
    println!("events/webhooks HTTP API.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;
/// Number of rotated log files to keep (tyd.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`]. Best-effort:
/// rotation failures are silently ignored so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

const STARTUP_MARKER_PREFIX: &str = "--- tyd: starting (pid: ";

fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&config.log_path)?;
    writeln!(file, "{STARTUP_MARKER_PREFIX}{}) ---\n", std::process::id())?;
    Ok(())
}

fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;
    let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(&config.log_path) else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {error}");
}

fn setup_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config.log_path.file_name().ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}
