use std::convert::TryFrom;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{named_params, OptionalExtension, Row};

use super::{Catalog, Project, TimeEntry, User};
use crate::budget::ReportingPeriod;
use crate::db::{Db, StoreResult};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_date(raw: Option<String>) -> Option<NaiveDate> {
    let raw = raw?;
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(&raw), DATE_FORMAT).ok()
}

fn parse_datetime(raw: Option<String>) -> Option<NaiveDateTime> {
    let raw = raw?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

impl TryFrom<&Row<'_>> for Project {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            start: parse_date(row.get("start_date")?),
            end: parse_date(row.get("end_date")?),
            budget: row.get("budget")?,
            visible: row.get("visible")?,
        })
    }
}

impl TryFrom<&Row<'_>> for User {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            alias: row.get("alias")?,
            display_name: row.get("display_name")?,
            username: row.get("username")?,
            hourly_rate: row.get("hourly_rate")?,
        })
    }
}

impl TryFrom<&Row<'_>> for TimeEntry {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            user_id: row.get("user_id")?,
            begin: parse_datetime(row.get("begin_at")?),
            duration: row.get("duration")?,
            hourly_rate: row.get("hourly_rate")?,
            rate: row.get("rate")?,
        })
    }
}

/// [`Catalog`] over the host application's tables in the shared database.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    db: Db,
}

impl SqliteCatalog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl Catalog for SqliteCatalog {
    fn find_project(&self, id: i64) -> StoreResult<Option<Project>> {
        let conn = self.db.connection()?;
        let project = conn
            .query_row(
                "SELECT id, name, start_date, end_date, budget, visible FROM projects WHERE id = ?1",
                [id],
                |row| Project::try_from(row),
            )
            .optional()?;
        Ok(project)
    }

    fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare("SELECT id, name, start_date, end_date, budget, visible FROM projects")?;
        let projects = stmt
            .query_map([], |row| Project::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, alias, display_name, username, hourly_rate FROM users ORDER BY alias ASC",
        )?;
        let users = stmt
            .query_map([], |row| User::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn find_time_entries(
        &self,
        project_id: i64,
        period: &ReportingPeriod,
    ) -> StoreResult<Vec<TimeEntry>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(
            r#"
                SELECT id, project_id, user_id, datetime(begin_at) AS begin_at,
                       duration, hourly_rate, rate
                FROM timesheets
                WHERE project_id = :project
                  AND datetime(begin_at) >= :begin
                  AND datetime(begin_at) <= :end
                ORDER BY datetime(begin_at) ASC
            "#,
        )?;
        let begin = period.start.format(DATETIME_FORMAT).to_string();
        let end = period.end.format(DATETIME_FORMAT).to_string();
        let entries = stmt
            .query_map(
                named_params! {":project": project_id, ":begin": begin, ":end": end},
                |row| TimeEntry::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (tempfile::TempDir, SqliteCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::open(dir.path().join("demo.db")).unwrap();
        let conn = db.connection().unwrap();
        conn.execute_batch(
            r#"
                INSERT INTO projects (id, name, start_date, end_date, budget, visible)
                VALUES (1, 'website', '2024-01-10', '2024-01-10', 5000.0, 1),
                       (2, 'Archive', NULL, 'not a date', NULL, 0);
                INSERT INTO users (id, alias, display_name, username, hourly_rate)
                VALUES (1, 'zed', NULL, 'z', 40.0),
                       (2, 'amy', NULL, 'a', NULL);
                INSERT INTO timesheets (id, project_id, user_id, begin_at, duration, hourly_rate, rate)
                VALUES (1, 1, 1, '2024-01-09 08:00:00', 7200, 50.0, NULL),
                       (2, 1, 2, '2024-01-15T10:30:00', 3600, NULL, 75.0),
                       (3, 1, 1, '2023-12-20 08:00:00', 3600, 50.0, NULL),
                       (4, 2, 1, '2024-01-09 08:00:00', 3600, 50.0, NULL);
            "#,
        )
        .unwrap();
        (dir, SqliteCatalog::new(db))
    }

    #[test]
    fn test_find_project_parses_optional_dates() {
        let (_dir, catalog) = seeded();

        let website = catalog.find_project(1).unwrap().unwrap();
        assert_eq!(website.start, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(website.budget, Some(5000.0));
        assert!(website.visible);

        let archive = catalog.find_project(2).unwrap().unwrap();
        assert_eq!(archive.start, None);
        assert_eq!(archive.end, None);
        assert!(!archive.visible);

        assert!(catalog.find_project(404).unwrap().is_none());
    }

    #[test]
    fn test_users_ordered_by_alias() {
        let (_dir, catalog) = seeded();
        let aliases: Vec<_> = catalog
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.display_label())
            .collect();
        assert_eq!(aliases, vec!["amy", "zed"]);
    }

    #[test]
    fn test_time_entries_filtered_by_project_and_period() {
        let (_dir, catalog) = seeded();
        let project = catalog.find_project(1).unwrap().unwrap();
        let period = ReportingPeriod::for_project(&project).unwrap();

        let entries = catalog.find_time_entries(1, &period).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(entries[1].begin.is_some());
        assert_eq!(entries[1].rate, Some(75.0));
    }

    #[test]
    fn test_time_entries_normalize_begin_timestamps() {
        let (_dir, catalog) = seeded();
        let conn = catalog.db.connection().unwrap();
        conn.execute_batch(
            r#"
                INSERT INTO timesheets (id, project_id, user_id, begin_at, duration, hourly_rate, rate)
                VALUES (10, 1, 3, '2024-01-09 08:00:00.250', 7200, 50.0, NULL),
                       (11, 1, 3, '2024-01-09T08:00:00Z', 7200, 50.0, NULL);
            "#,
        )
        .unwrap();
        let project = catalog.find_project(1).unwrap().unwrap();
        let period = ReportingPeriod::for_project(&project).unwrap();

        let entries = catalog.find_time_entries(1, &period).unwrap();
        let normalized: Vec<_> = entries.iter().filter(|e| e.id >= 10).collect();
        assert_eq!(normalized.len(), 2);
        let expected = NaiveDate::from_ymd_opt(2024, 1, 9)
            .unwrap()
            .and_hms_opt(8, 0, 0);
        assert!(normalized.iter().all(|e| e.begin == expected));

        let matrix = crate::budget::compute_actual_costs(&project, &entries);
        assert_eq!(matrix.cost("3", 1), Some(200.0));
    }
}
