use crate::engine::{TeacherRef, TimetableSlot};
use crate::ipc::helpers::{
    get_required_period, get_required_str, optional_teacher, parse_date, parse_weekday,
    required_teacher, weekday_index, weekday_name, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store;
use rusqlite::Connection;
use serde_json::json;

fn slot_json(slot: &TimetableSlot) -> serde_json::Value {
    json!({
        "period": slot.period,
        "class": &slot.class,
        "subject": &slot.subject,
        "teacher": &slot.teacher,
    })
}

fn set_day(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let weekday = parse_weekday(
        params
            .get("weekday")
            .ok_or_else(|| HandlerErr::bad_params("missing weekday"))?,
    )?;
    let Some(raw_slots) = params.get("slots").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("missing slots"));
    };

    let mut slots = Vec::with_capacity(raw_slots.len());
    for raw in raw_slots {
        let period = get_required_period(raw, "period")?;
        let class = get_required_str(raw, "class")?;
        let subject = get_required_str(raw, "subject")?;
        let teacher = required_teacher(raw, "teacher")?;
        slots.push(TimetableSlot {
            weekday,
            period,
            class,
            subject,
            teacher,
        });
    }

    store::replace_day_slots(conn, weekday, &slots)
        .map_err(|e| HandlerErr::update(e, "timetable_slots"))?;
    Ok(json!({ "weekday": weekday_name(weekday), "slotCount": slots.len() }))
}

fn week(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let filter: Option<TeacherRef> = optional_teacher(params, "teacher")?;
    let slots = store::week_slots(conn).map_err(HandlerErr::query)?;

    let mut days = serde_json::Map::new();
    for weekday in 0..7u32 {
        let day_slots: Vec<serde_json::Value> = slots
            .iter()
            .filter(|s| s.weekday == weekday)
            .filter(|s| {
                filter
                    .as_ref()
                    .map(|t| t.same_teacher(&s.teacher))
                    .unwrap_or(true)
            })
            .map(slot_json)
            .collect();
        if !day_slots.is_empty() {
            days.insert(weekday_name(weekday).to_string(), json!(day_slots));
        }
    }
    Ok(json!({ "days": days }))
}

fn daily_merged(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_str(params, "date")?;
    let day = parse_date(&date)?;
    let rows = store::daily_timetable_merged(conn, &date, weekday_index(day))
        .map_err(HandlerErr::query)?;
    Ok(json!({ "date": date, "slots": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.setDay" => Some(with_db(state, req, set_day)),
        "timetable.week" => Some(with_db(state, req, week)),
        "timetable.dailyMerged" => Some(with_db(state, req, daily_merged)),
        _ => None,
    }
}
