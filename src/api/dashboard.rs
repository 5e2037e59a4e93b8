//! Dashboard, report shell and error demo pages.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use chrono::{Datelike, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::auth::Caller;
use super::error::{blocking, ApiError};
use super::routes::AppState;
use crate::budget::PlanStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub hourly_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStatus {
    pub id: i64,
    pub name: String,
    pub status: PlanStatus,
}

/// Everything the dashboard page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub projects: Vec<ProjectSummary>,
    pub employees: Vec<Employee>,
    pub active_project_statuses: Vec<ProjectStatus>,
    pub is_admin: bool,
}

/// Assemble the dashboard view model from the catalog and plan store.
pub fn dashboard_view(state: &AppState, is_admin: bool) -> Result<DashboardView, ApiError> {
    let mut projects = state.catalog.list_projects()?;
    projects.sort_by_cached_key(|p| p.name.to_lowercase());

    let mut active_project_statuses = Vec::new();
    for project in projects.iter().filter(|p| p.visible) {
        let status = state
            .plans
            .load(project.id)?
            .map(|plan| plan.status)
            .unwrap_or_default();
        active_project_statuses.push(ProjectStatus {
            id: project.id,
            name: project.name.clone(),
            status,
        });
    }

    let employees = state
        .catalog
        .list_users()?
        .into_iter()
        .map(|user| Employee {
            id: user.id,
            name: user.display_label(),
            hourly_rate: user.hourly_rate.unwrap_or(0.0),
        })
        .collect();

    Ok(DashboardView {
        projects: projects
            .into_iter()
            .map(|p| ProjectSummary {
                id: p.id,
                name: p.name,
                start: p.start,
                end: p.end,
                budget: p.budget.unwrap_or(0.0),
            })
            .collect(),
        employees,
        active_project_statuses,
        is_admin,
    })
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Html<String>, ApiError> {
    let is_admin = caller.is_admin();
    let view = blocking(move || dashboard_view(&state, is_admin)).await?;
    let data = serde_json::to_string(&view)
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .replace("</", "<\\/");

    let mut rows = String::new();
    for status in &view.active_project_statuses {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(&status.name),
            status.status
        ));
    }

    Ok(Html(format!(
        concat!(
            "<!DOCTYPE html><html><head><title>Demo</title></head><body>",
            "<h1>Demo</h1>",
            "<table id=\"budget-plan-statuses\"><tr><th>Project</th><th>Status</th></tr>{}</table>",
            "<script type=\"application/json\" id=\"demo-data\">{}</script>",
            "</body></html>"
        ),
        rows, data
    )))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub month: Option<String>,
}

/// First day of the month named by `YYYY-MM` or `YYYY-MM-DD`.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
        .and_then(|date| date.with_day(1))
}

/// Current, previous and next month for the report navigation.
pub fn report_months(month: NaiveDate) -> (NaiveDate, Option<NaiveDate>, Option<NaiveDate>) {
    let current = month.with_day(1).unwrap_or(month);
    (
        current,
        current.checked_sub_months(Months::new(1)),
        current.checked_add_months(Months::new(1)),
    )
}

pub async fn report(Query(query): Query<ReportQuery>) -> Html<String> {
    let month = query
        .month
        .as_deref()
        .and_then(parse_month)
        .unwrap_or_else(|| Local::now().date_naive());
    let (current, previous, next) = report_months(month);

    let link = |date: Option<NaiveDate>, text: &str| match date {
        Some(date) => format!(
            "<a href=\"?month={}\">{}</a>",
            date.format("%Y-%m"),
            text
        ),
        None => String::new(),
    };

    Html(format!(
        concat!(
            "<!DOCTYPE html><html><head><title>Demo report</title></head><body>",
            "<h1>Demo report</h1>",
            "<nav>{} <strong>{}</strong> {}</nav>",
            "<div id=\"demo_box_id\"><p>No data</p></div>",
            "</body></html>"
        ),
        link(previous, "&laquo;"),
        current.format("%B %Y"),
        link(next, "&raquo;")
    ))
}

/// Trigger the error page for a status code: 403, 404, anything else is 500.
pub async fn error_page(Path(code): Path<String>) -> Result<Html<String>, ApiError> {
    match code.as_str() {
        "403" => Err(ApiError::Forbidden("Access denied.".to_string())),
        "404" => Err(ApiError::NotFound("Not found.".to_string())),
        _ => Err(ApiError::Internal("Error 500".to_string())),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-03"), Some(date(2024, 3, 1)));
        assert_eq!(parse_month("2024-03-17"), Some(date(2024, 3, 1)));
        assert_eq!(parse_month("March"), None);
        assert_eq!(parse_month("2024-13"), None);
    }

    #[test]
    fn test_report_months_cross_year() {
        let (current, previous, next) = report_months(date(2024, 1, 20));
        assert_eq!(current, date(2024, 1, 1));
        assert_eq!(previous, Some(date(2023, 12, 1)));
        assert_eq!(next, Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("R&D <beta>"), "R&amp;D &lt;beta&gt;");
    }
}
