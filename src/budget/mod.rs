//! Budget module - per-project budget plans and actual-cost reporting.
//!
//! # Key Concepts
//! - Plan: approval status plus opaque budget rows for one project
//! - Store: key/value persistence with a flat-file fallback tier
//! - Costs: weekly per-user cost matrix derived from time entries

mod costs;
mod plan;
mod store;

pub use costs::{
    compute_actual_costs, entry_cost, week_label, week_start, CostMatrix, ReportingPeriod,
    WeekBucket,
};
pub use plan::{rows_or_empty, BudgetPlan, PlanStatus};
pub use store::{
    BudgetPlanStore, FallbackKvStore, JsonFileKvStore, KvStore, PlanStorage, SqliteKvStore,
    FALLBACK_FILE_NAME,
};
