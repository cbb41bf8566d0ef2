// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal 5-field cron evaluator for `Task::recurrence`.
//!
//! Each field is `*` or a comma-separated list of integers: `min hour dom
//! month dow`. There's no external cron-parsing dependency because the
//! grammar this system needs is small and closed — no step syntax (`*/5`),
//! no ranges, no named months/days.

use crate::task::Recurrence;
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Any,
    List(Vec<u32>),
}

impl Field {
    fn matches(&self, value: u32) -> bool {
        match self {
            Field::Any => true,
            Field::List(values) => values.contains(&value),
        }
    }

    fn parse(raw: &str) -> Result<Self, String> {
        if raw == "*" {
            return Ok(Field::Any);
        }
        let mut values = Vec::new();
        for part in raw.split(',') {
            let n: u32 = part
                .trim()
                .parse()
                .map_err(|_| format!("invalid cron field value: {part}"))?;
            values.push(n);
        }
        Ok(Field::List(values))
    }
}

/// A parsed 5-field cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

impl CronSchedule {
    pub fn parse(recurrence: &Recurrence) -> Result<Self, String> {
        let fields: Vec<&str> = recurrence.0.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(format!(
                "recurrence must have 5 fields (min hour dom month dow), got {}",
                fields.len()
            ));
        }
        Ok(Self {
            minute: Field::parse(fields[0])?,
            hour: Field::parse(fields[1])?,
            day_of_month: Field::parse(fields[2])?,
            month: Field::parse(fields[3])?,
            day_of_week: Field::parse(fields[4])?,
        })
    }

    fn matches(&self, at: DateTime<Utc>) -> bool {
        self.minute.matches(at.minute())
            && self.hour.matches(at.hour())
            && self.day_of_month.matches(at.day())
            && self.month.matches(at.month())
            && self.day_of_week.matches(at.weekday().num_days_from_sunday())
    }

    /// Next occurrence strictly after `after`, scanning minute-by-minute up
    /// to one year out. Tick precision is coarse (§5) so minute granularity
    /// is sufficient.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = after
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(after)
            + Duration::minutes(1);
        let mut candidate = start;
        let limit = after + Duration::days(366);
        while candidate < limit {
            if self.matches(candidate) {
                return Some(candidate);
            }
            candidate += Duration::minutes(1);
        }
        None
    }
}

#[cfg(test)]
#[path = "recurrence_tests.rs"]
mod tests;
