//! Behavioral specifications for the `ty` CLI.
//!
//! These tests are black-box: they invoke the CLI binary and verify
//! stdout, stderr, and exit codes against a real `tyd` daemon process.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/errors.rs"]
mod cli_errors;
#[path = "specs/cli/help.rs"]
mod cli_help;

// daemon/
#[path = "specs/daemon/lifecycle.rs"]
mod daemon_lifecycle;

// task/
#[path = "specs/task/events.rs"]
mod task_events;
#[path = "specs/task/lifecycle.rs"]
mod task_lifecycle;
