//! Plan status and the stored plan document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Approval state of a budget plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    #[default]
    New,
    Sent,
    Approved,
    Rejected,
}

impl PlanStatus {
    /// Map arbitrary input onto a status.
    ///
    /// Only the exact strings `SENT`, `APPROVED` and `REJECTED` survive;
    /// everything else, including `NEW` and differently-cased variants,
    /// becomes [`PlanStatus::New`].
    pub fn normalize(input: &str) -> Self {
        match input {
            "SENT" => Self::Sent,
            "APPROVED" => Self::Approved,
            "REJECTED" => Self::Rejected,
            _ => Self::New,
        }
    }

    /// Same as [`PlanStatus::normalize`] for a JSON value; non-strings are `NEW`.
    pub fn normalize_value(value: Option<&Value>) -> Self {
        value
            .and_then(Value::as_str)
            .map(Self::normalize)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Sent => "SENT",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Approving or rejecting a plan needs the admin capability.
    pub fn requires_admin(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project's budget plan: status plus opaque row records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetPlan {
    pub status: PlanStatus,
    #[serde(default)]
    pub rows: Vec<Value>,
}

impl BudgetPlan {
    pub fn new(status: PlanStatus, rows: Vec<Value>) -> Self {
        Self { status, rows }
    }

    /// Decode a stored `{status, rows}` document without failing.
    ///
    /// The status is normalized and `rows` is kept only when it is an array.
    pub fn from_stored(value: &Value) -> Self {
        Self {
            status: PlanStatus::normalize_value(value.get("status")),
            rows: rows_or_empty(value.get("rows")),
        }
    }

    pub fn to_document(&self) -> Value {
        serde_json::json!({
            "status": self.status.as_str(),
            "rows": self.rows,
        })
    }
}

/// Rows must be a JSON array; anything else is treated as no rows.
pub fn rows_or_empty(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(rows)) => rows.clone(),
        _ => Vec::new(),
    }
}
