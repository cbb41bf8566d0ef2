// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ty events` - watch, list, or manage webhooks for the durable event log.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::poll::{Poller, Tick};

#[derive(Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: Option<EventsCommand>,
}

#[derive(Subcommand)]
pub enum EventsCommand {
    /// Poll the event log and print new entries as they arrive
    Watch {
        /// Filter by event kind
        #[arg(long = "type")]
        kind: Option<String>,
        /// Filter by task id
        #[arg(long)]
        task: Option<u64>,
        /// Filter by project
        #[arg(long)]
        project: Option<String>,
    },
    /// List recent events
    List {
        /// Max number of events to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Manage webhooks notified on every event
    Webhooks(WebhooksArgs),
}

#[derive(Args)]
pub struct WebhooksArgs {
    #[command(subcommand)]
    pub command: WebhooksCommand,
}

#[derive(Subcommand)]
pub enum WebhooksCommand {
    /// Register a webhook URL
    Add { url: String },
    /// List registered webhooks
    List,
    /// Remove a webhook by id
    Remove { id: u64 },
}

pub async fn handle(args: EventsArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match args.command {
        Some(EventsCommand::Watch { kind, task, project }) => {
            watch(client, kind.as_deref(), task, project.as_deref(), format).await
        }
        Some(EventsCommand::List { limit }) => list(client, limit, format).await,
        Some(EventsCommand::Webhooks(webhooks)) => webhooks_handle(webhooks, client, format).await,
        None => {
            let cmd = crate::find_subcommand(crate::cli_command(), &["events"]);
            crate::help::print_help(cmd);
            Ok(())
        }
    }
}

async fn list(client: &DaemonClient, limit: usize, format: OutputFormat) -> Result<()> {
    let events = client.events_list(Some(limit), None, None, None).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Text => {
            if events.is_empty() {
                println!("No events.");
                return Ok(());
            }
            for e in &events {
                print_event(&e.kind, e.task_id, e.project.as_deref(), &e.message, e.created_at);
            }
        }
    }
    Ok(())
}

async fn watch(
    client: &DaemonClient, kind: Option<&str>, task: Option<u64>, project: Option<&str>, format: OutputFormat,
) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        eprintln!("warning: events watch streams text lines; --output json is ignored");
    }

    let mut last_id = 0u64;
    let mut poller = Poller::new(Duration::from_millis(500), None);
    loop {
        match poller.tick().await {
            Tick::Interrupted | Tick::Timeout => return Ok(()),
            Tick::Ready => {}
        }
        let events = client.events_list(None, kind, task, project).await?;
        let threshold = last_id;
        for e in events.iter().filter(|e| e.id > threshold) {
            print_event(&e.kind, e.task_id, e.project.as_deref(), &e.message, e.created_at);
            last_id = last_id.max(e.id);
        }
    }
}

fn print_event(
    kind: &str, task_id: Option<u64>, project: Option<&str>, message: &str,
    created_at: chrono::DateTime<chrono::Utc>,
) {
    let scope = match (task_id, project) {
        (Some(id), _) => format!(" task#{id}"),
        (None, Some(p)) if !p.is_empty() => format!(" {p}"),
        _ => String::new(),
    };
    println!("[{}] {}{}: {}", created_at.format("%H:%M:%S"), kind, scope, message);
}

async fn webhooks_handle(args: WebhooksArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match args.command {
        WebhooksCommand::Add { url } => {
            let webhook = client.webhook_add(&url).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&webhook)?),
                OutputFormat::Text => println!("Registered webhook #{}: {}", webhook.id, webhook.url),
            }
        }
        WebhooksCommand::List => {
            let webhooks = client.webhook_list().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&webhooks)?),
                OutputFormat::Text => {
                    if webhooks.is_empty() {
                        println!("No webhooks registered.");
                    } else {
                        for w in &webhooks {
                            println!("#{}: {}", w.id, w.url);
                        }
                    }
                }
            }
        }
        WebhooksCommand::Remove { id } => {
            client.webhook_remove(id).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "removed": id }))?)
                }
                OutputFormat::Text => println!("Removed webhook #{id}"),
            }
        }
    }
    Ok(())
}
