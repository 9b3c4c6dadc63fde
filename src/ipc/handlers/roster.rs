use crate::ipc::helpers::{get_required_str, with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store;
use rusqlite::Connection;
use serde_json::json;

fn teachers_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let email = params
        .get("email")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let id = store::insert_teacher(conn, &name, email.as_deref())
        .map_err(|e| HandlerErr::update(e, "teachers"))?;
    Ok(json!({ "teacherId": id }))
}

fn teachers_list(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let teachers = store::roster_teachers(conn).map_err(HandlerErr::query)?;
    let out: Vec<serde_json::Value> = teachers
        .iter()
        .map(|(id, t)| {
            json!({
                "id": id,
                "name": &t.name,
                "email": &t.email
            })
        })
        .collect();
    Ok(json!({ "teachers": out }))
}

fn classes_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let id = store::upsert_class(conn, &name).map_err(|e| HandlerErr::update(e, "classes"))?;
    Ok(json!({ "classId": id }))
}

fn classes_list(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let classes = store::roster_classes(conn).map_err(HandlerErr::query)?;
    let out: Vec<serde_json::Value> = classes
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name }))
        .collect();
    Ok(json!({ "classes": out }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teachers.create" => Some(with_db(state, req, |c, p| teachers_create(c, p))),
        "teachers.list" => Some(with_db(state, req, |c, _| teachers_list(c))),
        "classes.create" => Some(with_db(state, req, |c, p| classes_create(c, p))),
        "classes.list" => Some(with_db(state, req, |c, _| classes_list(c))),
        _ => None,
    }
}
