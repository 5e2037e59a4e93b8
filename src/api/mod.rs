//! HTTP API for the budget planner.
//!
//! ## Endpoints
//!
//! - `GET /admin/demo` - Dashboard with project, employee and plan status data
//! - `GET /admin/demo/budget-plan/{project}` - Get a project's budget plan
//! - `POST /admin/demo/budget-plan/{project}/status` - Update plan status and rows
//! - `GET /admin/demo/budget-plan/{project}/actual-costs` - Weekly cost matrix
//! - `GET /admin/demo/report` - Monthly report shell
//! - `GET /admin/demo/{code}` - Error page demo (403, 404, 500)
//! - `GET /health` - Health check

mod auth;
mod budget_plan;
mod dashboard;
mod error;
mod routes;

pub use auth::{Caller, ROLES_HEADER};
pub use dashboard::{dashboard_view, DashboardView, Employee, ProjectStatus, ProjectSummary};
pub use error::ApiError;
pub use routes::{router, serve, AppState};
