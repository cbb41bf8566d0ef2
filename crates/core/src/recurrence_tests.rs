// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    chrono::TimeZone::with_ymd_and_hms(&Utc, y, mo, d, h, mi, 0).unwrap()
}

#[test]
fn every_minute_matches_next_minute() {
    let sched = CronSchedule::parse(&Recurrence("* * * * *".into())).unwrap();
    let after = dt(2026, 1, 1, 10, 30);
    let next = sched.next_after(after).unwrap();
    assert_eq!(next, dt(2026, 1, 1, 10, 31));
}

#[test]
fn daily_at_specific_hour_and_minute() {
    let sched = CronSchedule::parse(&Recurrence("0 9 * * *".into())).unwrap();
    let after = dt(2026, 1, 1, 10, 0);
    let next = sched.next_after(after).unwrap();
    assert_eq!(next, dt(2026, 1, 2, 9, 0));
}

#[test]
fn list_of_minutes() {
    let sched = CronSchedule::parse(&Recurrence("0,30 * * * *".into())).unwrap();
    let after = dt(2026, 1, 1, 10, 5);
    let next = sched.next_after(after).unwrap();
    assert_eq!(next, dt(2026, 1, 1, 10, 30));
}

#[test]
fn rejects_wrong_field_count() {
    assert!(CronSchedule::parse(&Recurrence("* * *".into())).is_err());
}

#[test]
fn rejects_non_numeric_field() {
    assert!(CronSchedule::parse(&Recurrence("a * * * *".into())).is_err());
}
