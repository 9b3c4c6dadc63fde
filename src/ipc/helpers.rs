use chrono::{Datelike, NaiveDate};
use serde_json::json;

use crate::engine::error::EngineError;
use crate::engine::TeacherRef;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn query(e: rusqlite::Error) -> Self {
        HandlerErr {
            code: "db_query_failed",
            message: e.to_string(),
            details: None,
        }
    }

    pub fn update(e: rusqlite::Error, table: &str) -> Self {
        HandlerErr {
            code: "db_update_failed",
            message: e.to_string(),
            details: Some(json!({ "table": table })),
        }
    }
}

impl From<EngineError> for HandlerErr {
    fn from(e: EngineError) -> Self {
        HandlerErr {
            code: e.code(),
            details: e.details(),
            message: e.to_string(),
        }
    }
}

pub fn with_db(
    state: &mut AppState,
    req: &Request,
    f: impl FnOnce(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_required_period(params: &serde_json::Value, key: &str) -> Result<u32, HandlerErr> {
    let raw = params
        .get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    if raw == 0 || raw > u32::MAX as u64 {
        return Err(HandlerErr::bad_params(format!(
            "{} must be a positive integer",
            key
        )));
    }
    Ok(raw as u32)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| HandlerErr::bad_params("date must be YYYY-MM-DD"))
}

/// 0 = Monday .. 6 = Sunday, matching the timetable_slots column.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday()
}

const WEEKDAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

pub fn weekday_name(index: u32) -> &'static str {
    WEEKDAY_NAMES
        .get(index as usize)
        .copied()
        .unwrap_or("monday")
}

pub fn parse_weekday(raw: &serde_json::Value) -> Result<u32, HandlerErr> {
    if let Some(n) = raw.as_u64() {
        if n <= 6 {
            return Ok(n as u32);
        }
    }
    if let Some(s) = raw.as_str() {
        let lower = s.trim().to_ascii_lowercase();
        if let Some(i) = WEEKDAY_NAMES.iter().position(|n| *n == lower) {
            return Ok(i as u32);
        }
    }
    Err(HandlerErr::bad_params(
        "weekday must be a day name or an index 0-6 (Monday = 0)",
    ))
}

/// Teacher refs arrive either as `{ name?, email? }` objects or as bare
/// strings (address-looking strings become emails).
pub fn teacher_from_value(v: &serde_json::Value) -> Result<TeacherRef, HandlerErr> {
    if let Some(s) = v.as_str() {
        let t = s.trim();
        if t.is_empty() {
            return Err(HandlerErr::bad_params("teacher must not be blank"));
        }
        if t.contains('@') {
            return Ok(TeacherRef {
                name: None,
                email: Some(t.to_string()),
            });
        }
        return Ok(TeacherRef::named(t));
    }
    if v.is_object() {
        let get = |k: &str| {
            v.get(k)
                .and_then(|x| x.as_str())
                .map(|s| s.to_string())
                .filter(|s| !s.trim().is_empty())
        };
        let teacher = TeacherRef {
            name: get("name"),
            email: get("email"),
        };
        if teacher.is_blank() {
            return Err(HandlerErr::bad_params("teacher needs a name or an email"));
        }
        return Ok(teacher);
    }
    Err(HandlerErr::bad_params(
        "teacher must be a string or a { name, email } object",
    ))
}

pub fn required_teacher(
    params: &serde_json::Value,
    key: &str,
) -> Result<TeacherRef, HandlerErr> {
    let Some(v) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    teacher_from_value(v)
}

pub fn optional_teacher(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<TeacherRef>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => teacher_from_value(v).map(Some),
    }
}
