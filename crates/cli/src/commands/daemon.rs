// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ty daemon` - start, stop, or check `tyd`.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::{ClientError, DaemonClient};
use crate::client_lifecycle::daemon_stop;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: Option<DaemonCommand>,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start tyd in the background
    Start,
    /// Stop tyd
    Stop,
    /// Check tyd status
    Status,
    /// Stop and restart tyd
    Restart,
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        Some(DaemonCommand::Start) => start().await,
        Some(DaemonCommand::Stop) => stop().await,
        Some(DaemonCommand::Restart) => restart().await,
        Some(DaemonCommand::Status) => status(format).await,
        None => {
            let cmd = crate::find_subcommand(crate::cli_command(), &["daemon"]);
            crate::help::print_help(cmd);
            Ok(())
        }
    }
}

fn not_running_err(e: &ClientError) -> bool {
    matches!(e, ClientError::DaemonNotRunning)
        || matches!(
            e,
            ClientError::Io(io) if matches!(io.kind(), std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound)
        )
}

async fn start() -> Result<()> {
    if let Ok(client) = DaemonClient::connect() {
        if let Ok((uptime, ..)) = client.status().await {
            println!("Daemon already running (uptime: {uptime}s)");
            return Ok(());
        }
    }

    match DaemonClient::connect_or_start() {
        Ok(_client) => {
            println!("Daemon started");
            Ok(())
        }
        Err(e) => Err(anyhow!("{e}")),
    }
}

async fn stop() -> Result<()> {
    match daemon_stop().await {
        Ok(true) => {
            println!("Daemon stopped");
            Ok(())
        }
        Ok(false) => {
            println!("Daemon not running");
            Ok(())
        }
        Err(e) => Err(anyhow!("failed to stop daemon: {e}")),
    }
}

async fn restart() -> Result<()> {
    let was_running = daemon_stop().await.map_err(|e| anyhow!("failed to stop daemon: {e}"))?;

    if was_running {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }

    match DaemonClient::connect_or_start() {
        Ok(_client) => {
            println!("Daemon restarted");
            Ok(())
        }
        Err(e) => Err(anyhow!("{e}")),
    }
}

async fn status(format: OutputFormat) -> Result<()> {
    let not_running = || match format {
        OutputFormat::Text => {
            println!("Daemon not running");
            Ok(())
        }
        OutputFormat::Json => {
            println!(r#"{{ "status": "not_running" }}"#);
            Ok(())
        }
    };

    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(_) => return not_running(),
    };

    let (uptime, queued, processing, blocked) = match client.status().await {
        Ok(result) => result,
        Err(ref e) if not_running_err(e) => return not_running(),
        Err(e) => return Err(anyhow!("{e}")),
    };
    let version = client.hello().await.unwrap_or_else(|_| "unknown".to_string());

    match format {
        OutputFormat::Text => {
            println!("Status: running");
            println!("Version: {version}");
            println!("Uptime: {}", format_uptime(uptime));
            println!("Queued: {queued}");
            println!("Processing: {processing}");
            println!("Blocked: {blocked}");
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "status": "running",
                "version": version,
                "uptime_secs": uptime,
                "queued": queued,
                "processing": processing,
                "blocked": blocked,
            });
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
    }

    Ok(())
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{hours}h {mins}m {secs}s")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
