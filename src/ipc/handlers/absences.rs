use crate::engine::TeacherRef;
use crate::ipc::helpers::{
    get_required_str, parse_date, teacher_from_value, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store;
use rusqlite::Connection;
use serde_json::json;

fn set(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_str(params, "date")?;
    parse_date(&date)?;
    let Some(raw) = params.get("teachers").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("missing teachers"));
    };
    let teachers: Vec<TeacherRef> = raw
        .iter()
        .map(teacher_from_value)
        .collect::<Result<_, _>>()?;

    store::replace_absences(conn, &date, &teachers)
        .map_err(|e| HandlerErr::update(e, "absences"))?;
    Ok(json!({ "date": date, "absentCount": teachers.len() }))
}

fn list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_str(params, "date")?;
    parse_date(&date)?;
    let absences = store::absences_for_date(conn, &date).map_err(HandlerErr::query)?;
    let out: Vec<serde_json::Value> = absences
        .iter()
        .map(|a| json!({ "date": &a.date, "teacher": &a.teacher }))
        .collect();
    Ok(json!({ "absences": out }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "absences.set" => Some(with_db(state, req, set)),
        "absences.list" => Some(with_db(state, req, list)),
        _ => None,
    }
}
