//! Budget plan endpoints.
//!
//! - `GET /admin/demo/budget-plan/{project}` - stored plan or the NEW default
//! - `POST /admin/demo/budget-plan/{project}/status` - change status and rows
//! - `GET /admin/demo/budget-plan/{project}/actual-costs` - weekly cost matrix

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use super::auth::Caller;
use super::error::{blocking, ApiError};
use super::routes::AppState;
use crate::budget::{
    compute_actual_costs, rows_or_empty, BudgetPlan, CostMatrix, PlanStatus, ReportingPeriod,
};
use crate::catalog::{Catalog, Project};

/// Project ids arrive as raw path segments; anything that is not an id is unknown.
fn parse_project_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("Project {} not found", raw)))
}

fn require_project(catalog: &dyn Catalog, project_id: i64) -> Result<Project, ApiError> {
    catalog
        .find_project(project_id)?
        .ok_or_else(|| ApiError::project_not_found(project_id))
}

pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
) -> Result<Json<BudgetPlan>, ApiError> {
    let project_id = parse_project_id(&project)?;
    let plan = blocking(move || -> Result<BudgetPlan, ApiError> {
        require_project(state.catalog.as_ref(), project_id)?;
        Ok(state.plans.load(project_id)?.unwrap_or_default())
    })
    .await?;

    Ok(Json(plan))
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
    caller: Caller,
    body: Bytes,
) -> Result<Json<BudgetPlan>, ApiError> {
    let project_id = parse_project_id(&project)?;
    // Unreadable bodies behave like an empty object: status NEW, no rows.
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let plan = BudgetPlan::new(
        PlanStatus::normalize_value(payload.get("status")),
        rows_or_empty(payload.get("rows")),
    );

    let catalog = Arc::clone(&state.catalog);
    blocking(move || require_project(catalog.as_ref(), project_id)).await?;

    if plan.status.requires_admin() && !caller.is_admin() {
        tracing::warn!(project_id, status = %plan.status, "non-admin tried to approve or reject plan");
        return Err(ApiError::Forbidden(
            "Only admins can approve or reject the plan.".to_string(),
        ));
    }

    let stored = plan.clone();
    blocking(move || state.plans.save(project_id, stored.status, &stored.rows)).await?;

    Ok(Json(plan))
}

pub async fn actual_costs(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
) -> Result<Json<CostMatrix>, ApiError> {
    let project_id = parse_project_id(&project)?;
    let matrix = blocking(move || -> Result<CostMatrix, ApiError> {
        let project = require_project(state.catalog.as_ref(), project_id)?;
        let Some(period) = ReportingPeriod::for_project(&project) else {
            return Ok(CostMatrix::default());
        };
        let entries = state.catalog.find_time_entries(project.id, &period)?;
        tracing::debug!(project_id, entries = entries.len(), "computing actual costs");
        Ok(compute_actual_costs(&project, &entries))
    })
    .await?;

    Ok(Json(matrix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_id() {
        assert_eq!(parse_project_id("42").unwrap(), 42);
        for raw in ["abc", "", "1.5", "99999999999999999999"] {
            assert!(matches!(parse_project_id(raw), Err(ApiError::NotFound(_))));
        }
    }
}
