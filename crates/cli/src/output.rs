// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use ty_daemon::LogLine;

use crate::client::DaemonClient;
use crate::poll::{Poller, Tick};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format a UTC timestamp as relative time (e.g., "5s", "2m", "1h", "3d").
pub fn format_time_ago(at: chrono::DateTime<chrono::Utc>) -> String {
    let elapsed_secs = (chrono::Utc::now() - at).num_seconds().max(0) as u64;
    if elapsed_secs < 60 {
        format!("{elapsed_secs}s")
    } else if elapsed_secs < 3600 {
        format!("{}m", elapsed_secs / 60)
    } else if elapsed_secs < 86400 {
        format!("{}h", elapsed_secs / 3600)
    } else {
        format!("{}d", elapsed_secs / 86400)
    }
}

fn print_line(line: &LogLine) {
    println!("[{}] {}: {}", line.created_at.format("%H:%M:%S"), line.line_type, line.content);
}

/// Print a task's log lines, polling the daemon for new ones when `follow` is set.
///
/// There is no log file to tail: lines live in `ty_storage::Store` behind the
/// daemon's socket, so following means re-querying `Logs { id, limit }` on an
/// interval and printing whatever is new since the last line we saw.
pub async fn display_log(
    client: &DaemonClient,
    task_id: u64,
    lines: Vec<LogLine>,
    follow: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            if lines.is_empty() && !follow {
                eprintln!("No log entries found for task {task_id}");
                return Ok(());
            }
            for line in &lines {
                print_line(line);
            }
            if follow {
                follow_logs(client, task_id, lines.last().map(|l| l.created_at)).await?;
            }
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({ "task_id": task_id, "lines": lines });
            println!("{}", serde_json::to_string_pretty(&obj)?);
            if follow {
                eprintln!("warning: --follow is not supported with --output json");
            }
        }
    }
    Ok(())
}

async fn follow_logs(
    client: &DaemonClient,
    task_id: u64,
    mut last_seen: Option<chrono::DateTime<chrono::Utc>>,
) -> anyhow::Result<()> {
    let mut poller = Poller::new(std::time::Duration::from_millis(500), None);
    loop {
        match poller.tick().await {
            Tick::Interrupted => return Ok(()),
            Tick::Timeout => return Ok(()),
            Tick::Ready => {}
        }
        let lines = client.logs(task_id, None).await?;
        let fresh: Vec<&LogLine> = match last_seen {
            Some(since) => lines.iter().filter(|l| l.created_at > since).collect(),
            None => lines.iter().collect(),
        };
        for line in &fresh {
            print_line(line);
        }
        if let Some(line) = fresh.last() {
            last_seen = Some(line.created_at);
        }
    }
}
