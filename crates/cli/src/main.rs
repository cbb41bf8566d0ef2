// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ty - a personal AI coding-agent task orchestrator

mod client;
mod client_lifecycle;
mod color;
mod commands;
mod daemon_process;
mod env;
mod exit_error;
mod help;
mod output;
mod poll;
mod table;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use commands::{board, create, daemon, events, list, logs, show, task_ops, update};
use output::OutputFormat;

use crate::client::{ClientError, DaemonClient};

#[derive(Parser)]
#[command(name = "ty", version, disable_version_flag = true, about = "A personal AI coding-agent task orchestrator")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the task board, grouped by status
    Board,
    /// List tasks, optionally filtered
    List(list::ListArgs),
    /// Show a task's details
    Show {
        /// Task id
        id: u64,
        /// Include the task's executor log
        #[arg(long)]
        logs: bool,
    },
    /// Create a new task in the backlog
    Create(create::CreateArgs),
    /// Update a task's mutable fields
    Update(update::UpdateArgs),
    /// Queue a task for the executor supervisor
    Execute {
        /// Task id
        id: u64,
    },
    /// Re-queue a task with optional feedback
    Retry {
        /// Task id
        id: u64,
        /// Feedback to include with the retry
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Set a task's status directly (queued, processing, blocked, done, failed, archived)
    Status {
        /// Task id
        id: u64,
        /// New status
        status: String,
    },
    /// Pin or unpin a task
    Pin {
        /// Task id
        id: u64,
        /// Unpin instead of pin
        #[arg(long)]
        unpin: bool,
    },
    /// Archive a task
    Close {
        /// Task id
        id: u64,
    },
    /// Permanently delete a task
    Delete {
        /// Task id
        id: u64,
    },
    /// Show or follow a task's executor log
    Logs {
        /// Task id
        id: u64,
        /// Stream new log lines as they arrive
        #[arg(long, short)]
        follow: bool,
        /// Number of recent lines to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Watch, list, or manage webhooks for the event log
    Events(events::EventsArgs),
    /// Start, stop, or check tyd
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = exit_code_for(&e);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {msg}");
        }
        std::process::exit(code);
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(exit) = err.downcast_ref::<exit_error::ExitError>() {
        return exit.code;
    }
    match err.downcast_ref::<ClientError>() {
        Some(ClientError::DaemonNotRunning)
        | Some(ClientError::DaemonStartFailed(_))
        | Some(ClientError::DaemonStartTimeout) => 2,
        Some(ClientError::Rejected(_)) => 3,
        _ => 1,
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, we skip
/// the "Caused by" chain to avoid noisy duplicate output (common when
/// thiserror variants use `#[error("... {0}")]` with `#[from]`).
/// Otherwise we render the full chain so context isn't lost.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err.chain().skip(1).all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {i}: {cause}"));
    }
    buf
}

fn cli_command() -> clap::Command {
    Cli::command()
        .help_template(help::template())
        .before_help(help::commands())
        .after_help(help::after_help())
        .styles(help::styles())
        .arg(
            clap::Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .action(clap::ArgAction::Version)
                .help("Print version"),
        )
}

async fn run() -> Result<()> {
    let matches = match cli_command().try_get_matches() {
        Ok(m) => m,
        Err(e) => {
            if e.kind() == clap::error::ErrorKind::DisplayHelp {
                let args: Vec<String> = std::env::args().collect();
                let args = strip_global_flags(&args);
                print_formatted_help(&args);
                return Ok(());
            }
            e.exit();
        }
    };
    let cli = Cli::from_arg_matches(&matches)?;
    let format = cli.output;

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            help::print_help(cli_command());
            return Ok(());
        }
    };

    if let Commands::Daemon(args) = command {
        return daemon::daemon(args, format).await;
    }

    match command {
        Commands::Board => {
            let client = DaemonClient::for_query()?;
            board::handle(&client, format).await?
        }
        Commands::List(args) => {
            let client = DaemonClient::for_query()?;
            list::handle(args, &client, format).await?
        }
        Commands::Show { id, logs } => {
            let client = DaemonClient::for_query()?;
            show::handle(&client, id, logs, format).await?
        }
        Commands::Create(args) => {
            let client = DaemonClient::for_action()?;
            create::handle(args, &client, format).await?
        }
        Commands::Update(args) => {
            let client = DaemonClient::for_action()?;
            update::handle(args, &client, format).await?
        }
        Commands::Execute { id } => {
            let client = DaemonClient::for_action()?;
            task_ops::execute(&client, id, format).await?
        }
        Commands::Retry { id, feedback } => {
            let client = DaemonClient::for_action()?;
            task_ops::retry(&client, id, feedback.as_deref(), format).await?
        }
        Commands::Status { id, status } => {
            let client = DaemonClient::for_action()?;
            task_ops::set_status(&client, id, &status, format).await?
        }
        Commands::Pin { id, unpin } => {
            let client = DaemonClient::for_action()?;
            task_ops::pin(&client, id, unpin, format).await?
        }
        Commands::Close { id } => {
            let client = DaemonClient::for_action()?;
            task_ops::close(&client, id, format).await?
        }
        Commands::Delete { id } => {
            let client = DaemonClient::for_action()?;
            task_ops::delete(&client, id, format).await?
        }
        Commands::Logs { id, follow, limit } => {
            let client = DaemonClient::for_query()?;
            logs::handle(&client, id, follow, limit, format).await?
        }
        Commands::Events(args) => {
            let is_action = matches!(
                &args.command,
                Some(events::EventsCommand::Webhooks(w))
                    if matches!(w.command, events::WebhooksCommand::Add { .. } | events::WebhooksCommand::Remove { .. })
            );
            let client = if is_action { DaemonClient::for_action()? } else { DaemonClient::for_query()? };
            events::handle(args, &client, format).await?
        }
        Commands::Daemon(_) => unreachable!(),
    }

    Ok(())
}

/// Print help with post-hoc colorization, resolving the correct subcommand from args.
fn print_formatted_help(args: &[String]) {
    let cmd = cli_command();

    let non_flags: Vec<&String> = args.iter().skip(1).filter(|arg| !arg.starts_with('-')).collect();

    let subcommand_names: Vec<&str> = if non_flags.first().map(|s| s.as_str()) == Some("help") {
        non_flags.iter().skip(1).map(|s| s.as_str()).collect()
    } else {
        non_flags.iter().map(|s| s.as_str()).collect()
    };

    let target_cmd = find_subcommand(cmd, &subcommand_names);
    help::print_help(target_cmd);
}

/// Strip `-o <value>` / `--output <value>` from args to avoid mistaking their
/// value for a subcommand name in help formatting.
fn strip_global_flags(args: &[String]) -> Vec<String> {
    let mut result = Vec::with_capacity(args.len());
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "-o" || arg == "--output" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--output=") {
            continue;
        }
        result.push(arg.clone());
    }
    result
}

/// Recursively find a nested subcommand by name path.
pub(crate) fn find_subcommand(mut cmd: clap::Command, names: &[&str]) -> clap::Command {
    for name in names {
        let mut found_sub = None;
        for sub in cmd.get_subcommands() {
            if sub.get_name() == *name || sub.get_all_aliases().any(|a| a == *name) {
                found_sub = Some(sub.get_name().to_string());
                break;
            }
        }
        if let Some(sub_name) = found_sub {
            if let Some(sub) = cmd.find_subcommand_mut(&sub_name) {
                cmd = sub.clone();
            } else {
                break;
            }
        } else {
            break;
        }
    }
    cmd
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
