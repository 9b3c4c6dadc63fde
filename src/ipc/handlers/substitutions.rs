use crate::engine::assign::{self, AssignmentInput};
use crate::engine::error::EngineError;
use crate::engine::identity::identity_key;
use crate::engine::index::DayIndex;
use crate::engine::reconcile;
use crate::engine::{availability, vacancy, SubstitutionRecord, TeacherRef};
use crate::ipc::helpers::{
    get_required_period, get_required_str, optional_teacher, parse_date, required_teacher,
    weekday_index, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, PersistOutcome};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

fn record_json(r: &SubstitutionRecord) -> serde_json::Value {
    json!({
        "id": &r.id,
        "date": &r.date,
        "period": r.period,
        "class": &r.class,
        "regularSubject": &r.regular_subject,
        "absentTeacher": &r.absent_teacher,
        "substituteTeacher": &r.substitute_teacher,
        "substituteSubject": &r.substitute_subject,
    })
}

fn upstream(e: rusqlite::Error) -> HandlerErr {
    HandlerErr::from(EngineError::Upstream(e))
}

/// Everything a scheduling query needs for one date, read fresh from
/// the store. The index is a snapshot; it is rebuilt per request, never
/// patched in place.
struct DaySnapshot {
    regular: Vec<crate::engine::TimetableSlot>,
    substitutions: Vec<SubstitutionRecord>,
    absences: Vec<crate::engine::AbsenceEntry>,
}

fn load_day(conn: &Connection, date: &str) -> Result<DaySnapshot, HandlerErr> {
    let day = parse_date(date)?;
    let weekday = weekday_index(day);
    Ok(DaySnapshot {
        regular: store::slots_for_weekday(conn, weekday).map_err(upstream)?,
        substitutions: store::substitutions_for_date(conn, date).map_err(upstream)?,
        absences: store::absences_for_date(conn, date).map_err(upstream)?,
    })
}

fn vacant_slots(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_str(params, "date")?;
    let snapshot = load_day(conn, &date)?;
    let index = DayIndex::build(&snapshot.regular, &snapshot.substitutions);

    let vacancies = vacancy::vacant_slots(&date, &snapshot.absences, &index);
    let out: Vec<serde_json::Value> = vacancies
        .iter()
        .map(|v| {
            json!({
                "date": &v.date,
                "period": v.period,
                "class": &v.class,
                "subject": &v.subject,
                "absentTeacher": &v.absent_teacher,
            })
        })
        .collect();
    Ok(json!({ "vacantSlots": out }))
}

fn free_teachers(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_str(params, "date")?;
    let period = get_required_period(params, "period")?;
    let snapshot = load_day(conn, &date)?;
    let index = DayIndex::build(&snapshot.regular, &snapshot.substitutions);

    let roster = store::roster_teachers(conn).map_err(upstream)?;
    let roster_refs: Vec<TeacherRef> = roster.iter().map(|(_, t)| t.clone()).collect();
    let absent_refs: Vec<TeacherRef> = snapshot
        .absences
        .iter()
        .map(|a| a.teacher.clone())
        .collect();

    let free = availability::free_teachers(period, &absent_refs, &roster_refs, &index);
    let out: Vec<serde_json::Value> = free
        .iter()
        .map(|t| {
            let id = roster
                .iter()
                .find(|(_, r)| r.same_teacher(t))
                .map(|(id, _)| id.clone());
            json!({ "id": id, "name": &t.name, "email": &t.email })
        })
        .collect();
    Ok(json!({ "teachers": out }))
}

fn assign(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_str(params, "date")?;
    let period = get_required_period(params, "period")?;
    let class = get_required_str(params, "class")?;
    let substitute = required_teacher(params, "substitute")?;
    let update = params
        .get("update")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let snapshot = load_day(conn, &date)?;
    let class_key = identity_key(&class);
    let is_target =
        |r: &SubstitutionRecord| r.period == period && identity_key(&r.class) == class_key;

    let existing = snapshot.substitutions.iter().find(|r| is_target(r)).cloned();
    // The slot's own record must not count against its replacement.
    let others: Vec<SubstitutionRecord> = snapshot
        .substitutions
        .iter()
        .filter(|r| !is_target(r))
        .cloned()
        .collect();
    let index = DayIndex::build(&snapshot.regular, &others);

    let regular_slot = snapshot
        .regular
        .iter()
        .find(|s| s.period == period && identity_key(&s.class) == class_key);
    let absent_teacher = match optional_teacher(params, "absentTeacher")? {
        Some(t) => t,
        None => regular_slot
            .map(|s| s.teacher.clone())
            .or_else(|| existing.as_ref().map(|r| r.absent_teacher.clone()))
            .unwrap_or_default(),
    };
    let regular_subject = params
        .get("regularSubject")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| regular_slot.map(|s| s.subject.clone()))
        .unwrap_or_default();
    let substitute_subject = params
        .get("substituteSubject")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| regular_subject.clone());

    let input = AssignmentInput {
        date: date.clone(),
        period,
        class: class.clone(),
        regular_subject,
        absent_teacher,
        substitute,
        substitute_subject,
        update,
    };
    assign::validate(&input, existing.as_ref(), &snapshot.absences, &index)?;

    let record = SubstitutionRecord {
        id: existing
            .as_ref()
            .map(|r| r.id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        date: input.date,
        period: input.period,
        class: input.class,
        regular_subject: input.regular_subject,
        absent_teacher: input.absent_teacher,
        substitute_teacher: input.substitute,
        substitute_subject: input.substitute_subject,
    };

    let expected = existing.as_ref().map(|r| r.substitute_teacher.key());
    match store::persist_substitution(conn, &record, expected.as_deref()).map_err(upstream)? {
        PersistOutcome::Written => Ok(json!({ "record": record_json(&record) })),
        PersistOutcome::Conflict => Err(HandlerErr::from(EngineError::Conflict {
            date: record.date,
            period: record.period,
            class: record.class,
        })),
    }
}

fn for_date(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_str(params, "date")?;
    let day = parse_date(&date)?;

    let primary = store::substitutions_for_date(conn, &date).map_err(upstream)?;
    let (records, source) = reconcile::reconcile(primary, || {
        let rows = store::daily_timetable_merged(conn, &date, weekday_index(day))?;
        Ok::<_, rusqlite::Error>(reconcile::records_from_merged(&date, &rows))
    })
    .map_err(upstream)?;

    let out: Vec<serde_json::Value> = records.iter().map(record_json).collect();
    Ok(json!({ "records": out, "source": source.as_str() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "substitutions.vacantSlots" => Some(with_db(state, req, vacant_slots)),
        "substitutions.freeTeachers" => Some(with_db(state, req, free_teachers)),
        "substitutions.assign" => Some(with_db(state, req, assign)),
        "substitutions.forDate" => Some(with_db(state, req, for_date)),
        _ => None,
    }
}
