use serde_json::json;
use thiserror::Error;

/// Scheduling engine error taxonomy. Every variant carries enough slot
/// identity for the caller to drive a retry; none are retried here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid assignment: {0}")]
    Validation(String),

    #[error("{substitute} already occupies period {period} on {date}")]
    DoubleBooking {
        substitute: String,
        date: String,
        period: u32,
    },

    #[error("{substitute} is marked absent on {date}")]
    AbsenteeConflict { substitute: String, date: String },

    #[error("slot {date} period {period} class {class} is already covered by a different substitute")]
    Conflict {
        date: String,
        period: u32,
        class: String,
    },

    #[error("record store unavailable: {0}")]
    Upstream(#[from] rusqlite::Error),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "bad_params",
            EngineError::DoubleBooking { .. } => "double_booking",
            EngineError::AbsenteeConflict { .. } => "absentee_conflict",
            EngineError::Conflict { .. } => "conflict",
            EngineError::Upstream(_) => "store_unavailable",
        }
    }

    /// Offending slot identity, where one exists, for the error payload.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            EngineError::DoubleBooking {
                substitute,
                date,
                period,
            } => Some(json!({
                "substitute": substitute,
                "date": date,
                "period": period
            })),
            EngineError::AbsenteeConflict { substitute, date } => Some(json!({
                "substitute": substitute,
                "date": date
            })),
            EngineError::Conflict {
                date,
                period,
                class,
            } => Some(json!({
                "date": date,
                "period": period,
                "class": class
            })),
            _ => None,
        }
    }
}
