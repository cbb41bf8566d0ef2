// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for sectioned help output and colorization.

use super::*;

// ============================================================================
// Plain Text Tests
// ============================================================================

#[test]
fn commands_returns_plain_text() {
    let result = commands();
    assert!(!result.contains("\x1b["), "commands() should not contain ANSI codes");
}

#[test]
fn template_returns_plain_text() {
    let result = template();
    assert!(!result.contains("\x1b["), "template() should not contain ANSI codes");
}

#[test]
fn after_help_returns_plain_text() {
    let result = after_help();
    assert!(!result.contains("\x1b["), "after_help() should not contain ANSI codes");
}

// ============================================================================
// Section Content Tests
// ============================================================================

#[test]
fn commands_has_tasks_section() {
    let result = commands();
    assert!(result.contains("Tasks:"), "Should have Tasks section");
    for name in ["board", "list", "show", "create", "update", "execute", "retry", "status", "pin", "close", "delete", "logs"] {
        assert!(result.contains(&format!("  {name}")), "Tasks section should contain {name}");
    }
}

#[test]
fn commands_has_events_section() {
    let result = commands();
    assert!(result.contains("Events:"), "Should have Events section");
    assert!(result.contains("  events"), "Events section should contain events");
}

#[test]
fn commands_has_system_section() {
    let result = commands();
    assert!(result.contains("System:"), "Should have System section");
    assert!(result.contains("  daemon"), "System section should contain daemon");
}

// ============================================================================
// Colorization Tests
// ============================================================================

#[test]
fn colorize_help_applies_header_color() {
    let result = colorize_help("Tasks:");
    assert!(
        result.contains(&format!("{}Tasks:{}", fg256(color::codes::HEADER), RESET)),
        "Section header should be HEADER colored in:\n{result}"
    );
}

#[test]
fn colorize_help_applies_usage_color() {
    let result = colorize_help("Usage: ty [OPTIONS] [COMMAND]");
    assert!(
        result.contains(&format!("{}Usage:{}", fg256(color::codes::HEADER), RESET)),
        "Usage: should be HEADER colored in:\n{result}"
    );
}

#[test]
fn colorize_help_applies_literal_to_commands() {
    let result = colorize_help("  board       Show the task board");
    assert!(
        result.contains(&format!("{}board{}", fg256(color::codes::LITERAL), RESET)),
        "Command name should be LITERAL colored in:\n{result}"
    );
}

#[test]
fn colorize_help_applies_literal_to_option_flags() {
    let result = colorize_help("  -o, --output <OUTPUT>    Output format [default: text]");
    assert!(
        result.contains(&format!("{}-o{}", fg256(color::codes::LITERAL), RESET)),
        "Short flag should be LITERAL colored in:\n{result}"
    );
    assert!(
        result.contains(&format!("{}--output{}", fg256(color::codes::LITERAL), RESET)),
        "Long flag should be LITERAL colored in:\n{result}"
    );
}

#[test]
fn colorize_help_applies_context_to_placeholders() {
    let result = colorize_help("  -o, --output <OUTPUT>    Output format");
    assert!(
        result.contains(&format!("{}<OUTPUT>{}", fg256(color::codes::CONTEXT), RESET)),
        "Placeholder should be CONTEXT colored in:\n{result}"
    );
}

#[test]
fn colorize_help_applies_context_to_defaults() {
    let result = colorize_help(
        "  -o, --output <OUTPUT>    Output format [default: text] [possible values: text, json]",
    );
    assert!(
        result.contains(&format!("{}[default: text]{}", fg256(color::codes::CONTEXT), RESET)),
        "[default: text] should be CONTEXT colored in:\n{result}"
    );
    assert!(
        result.contains(&format!(
            "{}[possible values: text, json]{}",
            fg256(color::codes::CONTEXT),
            RESET
        )),
        "[possible values: ...] should be CONTEXT colored in:\n{result}"
    );
}

#[test]
fn colorize_help_skips_existing_ansi() {
    let input = "\x1b[38;5;74mAlready Colored\x1b[0m";
    let result = colorize_help(input);
    assert_eq!(result, input, "Existing ANSI codes should be preserved");
}

#[test]
fn colorize_help_handles_mixed_content() {
    let input = "\
Tasks:
  board       Show the task board
  status      Set a task's status directly

Options:
  -o, --output <OUTPUT>    Output format [default: text]";

    let result = colorize_help(input);

    assert!(
        result.contains(&format!("{}Tasks:{}", fg256(color::codes::HEADER), RESET)),
        "Tasks header should be colored"
    );
    assert!(
        result.contains(&format!("{}Options:{}", fg256(color::codes::HEADER), RESET)),
        "Options header should be colored"
    );
    assert!(
        result.contains(&format!("{}board{}", fg256(color::codes::LITERAL), RESET)),
        "board command should be colored"
    );
    assert!(
        result.contains(&format!("{}--output{}", fg256(color::codes::LITERAL), RESET)),
        "--output flag should be colored"
    );
}

// ============================================================================
// Format Help Tests
// ============================================================================

#[test]
fn format_help_produces_output() {
    let help = format_help(crate::cli_command());
    assert!(!help.is_empty(), "format_help should produce output");
}

#[test]
fn format_help_ends_with_newline() {
    let help = format_help(crate::cli_command());
    assert!(help.ends_with('\n'), "Help should end with newline");
}

// ============================================================================
// Subcommand Help Tests
// ============================================================================

/// Subcommand help must go through format_help (which forces Styles::plain()
/// before write_help, then applies colorize_help) rather than using clap's
/// default styled output. This test catches the bug where cloned subcommands
/// lost the parent's Styles::plain() and fell back to clap's default colored
/// styles.
#[test]
fn subcommand_help_uses_plain_base() {
    let cmd = crate::cli_command();
    let events = crate::find_subcommand(cmd, &["events"]);
    let mut plain = events.styles(styles());
    let mut buf = Vec::new();
    plain.write_help(&mut buf).unwrap();
    let raw = String::from_utf8(buf).unwrap();
    assert!(
        !raw.contains("\x1b["),
        "write_help with Styles::plain() should not contain ANSI codes;\n\
         clap's default styles must not leak through.\nGot:\n{raw}"
    );
}

#[test]
fn subcommand_help_contains_expected_content() {
    let cmd = crate::cli_command();
    let events = crate::find_subcommand(cmd, &["events"]);
    let help = format_help(events);
    assert!(help.contains("Usage:"), "events help should contain Usage line, got:\n{help}");
}

// ============================================================================
// Command Coverage Tests
// ============================================================================

/// Every top-level subcommand clap knows about must be listed somewhere in
/// commands(), so `ty --help` never silently omits one.
#[test]
fn all_top_level_commands_are_listed() {
    let cmd = crate::cli_command();
    let result = commands();
    for sub in cmd.get_subcommands() {
        let name = sub.get_name();
        assert!(
            result.contains(&format!("  {name}")),
            "commands() is missing top-level subcommand {name}"
        );
    }
}
