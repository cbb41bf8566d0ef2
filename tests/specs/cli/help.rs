//! CLI help output specs.
//!
//! Verify help text displays for all commands.

use crate::prelude::*;

#[test]
fn ty_no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn ty_help_shows_usage() {
    cli().args(&["--help"]).passes().stdout_has("Usage:");
}

#[test]
fn ty_board_help_shows_usage() {
    cli().args(&["board", "--help"]).passes().stdout_has("Usage:");
}

#[test]
fn ty_daemon_help_shows_subcommands() {
    cli().args(&["daemon", "--help"]).passes().stdout_has("start").stdout_has("stop").stdout_has("status");
}

#[test]
fn ty_events_help_shows_subcommands() {
    cli().args(&["events", "--help"]).passes().stdout_has("watch").stdout_has("list").stdout_has("webhooks");
}

#[test]
fn ty_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}
