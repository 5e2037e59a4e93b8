//! Actual-cost aggregation over a project's reporting period.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::catalog::{Project, TimeEntry};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Padded period covering a project's runtime, in whole weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingPeriod {
    /// Monday 00:00:00 of the week before the project start week.
    pub start: NaiveDateTime,
    /// Sunday 23:59:59 of the week after the project end week.
    pub end: NaiveDateTime,
}

impl ReportingPeriod {
    /// Derive the period from project dates.
    ///
    /// Returns `None` if either date is missing or `start > end`.
    pub fn for_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        let (start, end) = (start?, end?);
        if start > end {
            return None;
        }

        let first_monday = week_start(start) - Duration::weeks(1);
        let last_sunday = week_start(end) + Duration::days(6) + Duration::weeks(1);

        Some(Self {
            start: first_monday.and_time(NaiveTime::MIN),
            end: end_of_day(last_sunday),
        })
    }

    pub fn for_project(project: &Project) -> Option<Self> {
        Self::for_dates(project.start, project.end)
    }

    /// Monday of every week in the period, in order.
    pub fn weeks(&self) -> Vec<NaiveDate> {
        let mut weeks = Vec::new();
        let mut cursor = self.start.date();
        while cursor.and_time(NaiveTime::MIN) <= self.end {
            weeks.push(cursor);
            cursor += Duration::weeks(1);
        }
        weeks
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::seconds(86_399)
}

/// Display label such as `W02-24`: ISO week number and two-digit calendar year.
pub fn week_label(week_start: NaiveDate) -> String {
    format!(
        "W{:02}-{}",
        week_start.iso_week().week(),
        week_start.format("%y")
    )
}

/// Cost of one time entry.
///
/// An explicit rate is the cost. Without one, the duration (clamped to zero)
/// is billed at the entry's hourly rate.
pub fn entry_cost(entry: &TimeEntry) -> f64 {
    if let Some(rate) = entry.rate {
        return rate;
    }
    let seconds = entry.duration.unwrap_or(0).max(0) as f64;
    seconds / SECONDS_PER_HOUR * entry.hourly_rate.unwrap_or(0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekBucket {
    pub start: NaiveDate,
    pub label: String,
}

/// Weekly cost per user. Keys of the inner maps index into `weeks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostMatrix {
    pub weeks: Vec<WeekBucket>,
    pub matrix: BTreeMap<String, BTreeMap<usize, f64>>,
}

#[cfg(test)]
impl CostMatrix {
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty() && self.matrix.is_empty()
    }

    /// Accumulated cost for a user and week, if any entry landed there.
    pub fn cost(&self, user_id: &str, week_index: usize) -> Option<f64> {
        self.matrix.get(user_id)?.get(&week_index).copied()
    }
}

/// Bucket `entries` into per-user weekly totals over the project's period.
///
/// Projects without usable dates produce an empty matrix. Entries for other
/// projects, without a start or user, or outside the period are ignored.
pub fn compute_actual_costs(project: &Project, entries: &[TimeEntry]) -> CostMatrix {
    let Some(period) = ReportingPeriod::for_project(project) else {
        return CostMatrix::default();
    };

    let weeks = period.weeks();
    let index_by_week: HashMap<NaiveDate, usize> = weeks
        .iter()
        .enumerate()
        .map(|(idx, week)| (*week, idx))
        .collect();

    let mut matrix: BTreeMap<String, BTreeMap<usize, f64>> = BTreeMap::new();

    for entry in entries {
        if entry.project_id != project.id {
            continue;
        }
        let (Some(begin), Some(user_id)) = (entry.begin, entry.user_id) else {
            continue;
        };
        if !period.contains(begin) {
            continue;
        }
        let Some(&week_index) = index_by_week.get(&week_start(begin.date())) else {
            continue;
        };

        *matrix
            .entry(user_id.to_string())
            .or_default()
            .entry(week_index)
            .or_insert(0.0) += entry_cost(entry);
    }

    tracing::debug!(
        project_id = project.id,
        weeks = weeks.len(),
        users = matrix.len(),
        "actual costs computed"
    );

    CostMatrix {
        weeks: weeks
            .into_iter()
            .map(|start| WeekBucket {
                label: week_label(start),
                start,
            })
            .collect(),
        matrix,
    }
}
