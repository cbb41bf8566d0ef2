// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn format_time_ago_seconds() {
    let at = chrono::Utc::now() - chrono::Duration::seconds(5);
    assert_eq!(format_time_ago(at), "5s");
}

#[test]
fn format_time_ago_minutes() {
    let at = chrono::Utc::now() - chrono::Duration::minutes(2);
    assert_eq!(format_time_ago(at), "2m");
}

#[test]
fn format_time_ago_hours() {
    let at = chrono::Utc::now() - chrono::Duration::hours(3);
    assert_eq!(format_time_ago(at), "3h");
}

#[test]
fn format_time_ago_days() {
    let at = chrono::Utc::now() - chrono::Duration::days(4);
    assert_eq!(format_time_ago(at), "4d");
}

#[test]
fn format_time_ago_future_timestamp_clamps_to_zero() {
    let at = chrono::Utc::now() + chrono::Duration::seconds(30);
    assert_eq!(format_time_ago(at), "0s");
}

#[test]
fn output_format_default_is_text() {
    assert!(matches!(OutputFormat::default(), OutputFormat::Text));
}
