//! Read-only access to the time-tracking entities the dashboard reports on.
//!
//! Projects, users and timesheets are owned by the host application. This
//! module only models the fields the budget views need, with optional
//! attributes expressed as `Option` rather than probed at runtime.

mod sqlite;

pub use sqlite::SqliteCatalog;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::budget::ReportingPeriod;
use crate::db::StoreResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub alias: Option<String>,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub hourly_rate: Option<f64>,
}

impl User {
    /// First non-empty of alias, display name and username.
    pub fn display_label(&self) -> String {
        [&self.alias, &self.display_name, &self.username]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("User #{}", self.id))
    }
}

/// A recorded block of work.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntry {
    pub id: i64,
    pub project_id: i64,
    pub user_id: Option<i64>,
    pub begin: Option<NaiveDateTime>,
    /// Seconds worked.
    pub duration: Option<i64>,
    pub hourly_rate: Option<f64>,
    /// Explicit monetary value of the entry, when set.
    pub rate: Option<f64>,
}

/// Query collaborator used by the request handlers.
pub trait Catalog: Send + Sync {
    fn find_project(&self, id: i64) -> StoreResult<Option<Project>>;

    fn list_projects(&self) -> StoreResult<Vec<Project>>;

    /// All users ordered by alias.
    fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Entries of `project_id` starting inside `period`.
    fn find_time_entries(
        &self,
        project_id: i64,
        period: &ReportingPeriod,
    ) -> StoreResult<Vec<TimeEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(alias: Option<&str>, display: Option<&str>, username: Option<&str>) -> User {
        User {
            id: 9,
            alias: alias.map(str::to_string),
            display_name: display.map(str::to_string),
            username: username.map(str::to_string),
            hourly_rate: None,
        }
    }

    #[test]
    fn test_display_label_precedence() {
        assert_eq!(user(Some("Ann"), Some("Ann B."), Some("ann")).display_label(), "Ann");
        assert_eq!(user(Some(""), Some("Ann B."), Some("ann")).display_label(), "Ann B.");
        assert_eq!(user(None, None, Some("ann")).display_label(), "ann");
        assert_eq!(user(Some(""), Some(""), None).display_label(), "User #9");
    }
}
