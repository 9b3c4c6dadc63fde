//! Record-store boundary. Everything the engine knows about a date is
//! read out through these calls; the engine's decisions are written
//! back through `persist_substitution`. No scheduling logic lives here.

use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

use crate::engine::identity::identity_key;
use crate::engine::{AbsenceEntry, SubstitutionRecord, TeacherRef, TimetableSlot};

fn teacher_from_cols(name: Option<String>, email: Option<String>) -> TeacherRef {
    TeacherRef {
        name: name.filter(|s| !s.trim().is_empty()),
        email: email.filter(|s| !s.trim().is_empty()),
    }
}

pub fn insert_teacher(conn: &Connection, name: &str, email: Option<&str>) -> rusqlite::Result<String> {
    let id = Uuid::new_v4().to_string();
    let next_sort: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM teachers",
        [],
        |r| r.get(0),
    )?;
    let email_key = email.map(identity_key).filter(|k| !k.is_empty());
    conn.execute(
        "INSERT INTO teachers(id, name, email, name_key, email_key, sort_order)
         VALUES(?, ?, ?, ?, ?, ?)",
        (&id, name, email, identity_key(name), email_key, next_sort),
    )?;
    Ok(id)
}

/// Roster order is insertion order; availability output inherits it.
pub fn roster_teachers(conn: &Connection) -> rusqlite::Result<Vec<(String, TeacherRef)>> {
    let mut stmt =
        conn.prepare("SELECT id, name, email FROM teachers ORDER BY sort_order")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            teacher_from_cols(r.get(1)?, r.get(2)?),
        ))
    })?;
    rows.collect()
}

pub fn upsert_class(conn: &Connection, name: &str) -> rusqlite::Result<String> {
    let key = identity_key(name);
    conn.execute(
        "INSERT INTO classes(id, name, name_key)
         VALUES(?, ?, ?)
         ON CONFLICT(name_key) DO UPDATE SET name = excluded.name",
        (Uuid::new_v4().to_string(), name, &key),
    )?;
    conn.query_row("SELECT id FROM classes WHERE name_key = ?", [&key], |r| {
        r.get(0)
    })
}

pub fn roster_classes(conn: &Connection) -> rusqlite::Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT id, name FROM classes ORDER BY name")?;
    let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
    rows.collect()
}

/// Wholesale replace of one weekday's regular timetable. Individual
/// slots are never edited in place.
pub fn replace_day_slots(
    conn: &Connection,
    weekday: u32,
    slots: &[TimetableSlot],
) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM timetable_slots WHERE weekday = ?", [weekday])?;
    for slot in slots {
        tx.execute(
            "INSERT INTO timetable_slots(id, weekday, period, class_name, subject, teacher_name, teacher_email)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                weekday,
                slot.period,
                &slot.class,
                &slot.subject,
                slot.teacher.name.as_deref(),
                slot.teacher.email.as_deref(),
            ),
        )?;
    }
    tx.commit()
}

pub fn slots_for_weekday(conn: &Connection, weekday: u32) -> rusqlite::Result<Vec<TimetableSlot>> {
    let mut stmt = conn.prepare(
        "SELECT period, class_name, subject, teacher_name, teacher_email
         FROM timetable_slots
         WHERE weekday = ?
         ORDER BY period, class_name",
    )?;
    let rows = stmt.query_map([weekday], |r| {
        Ok(TimetableSlot {
            weekday,
            period: r.get(0)?,
            class: r.get(1)?,
            subject: r.get(2)?,
            teacher: teacher_from_cols(r.get(3)?, r.get(4)?),
        })
    })?;
    rows.collect()
}

pub fn week_slots(conn: &Connection) -> rusqlite::Result<Vec<TimetableSlot>> {
    let mut stmt = conn.prepare(
        "SELECT weekday, period, class_name, subject, teacher_name, teacher_email
         FROM timetable_slots
         ORDER BY weekday, period, class_name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(TimetableSlot {
            weekday: r.get(0)?,
            period: r.get(1)?,
            class: r.get(2)?,
            subject: r.get(3)?,
            teacher: teacher_from_cols(r.get(4)?, r.get(5)?),
        })
    })?;
    rows.collect()
}

/// Wholesale replace of the absentee roster for a date. The set is a
/// precondition to scheduling, not something this subsystem invents.
pub fn replace_absences(
    conn: &Connection,
    date: &str,
    teachers: &[TeacherRef],
) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM absences WHERE date = ?", [date])?;
    for teacher in teachers {
        let key = teacher.key();
        if key.is_empty() {
            continue;
        }
        tx.execute(
            "INSERT INTO absences(date, teacher_name, teacher_email, teacher_key)
             VALUES(?, ?, ?, ?)
             ON CONFLICT(date, teacher_key) DO NOTHING",
            (date, teacher.name.as_deref(), teacher.email.as_deref(), &key),
        )?;
    }
    tx.commit()
}

pub fn absences_for_date(conn: &Connection, date: &str) -> rusqlite::Result<Vec<AbsenceEntry>> {
    let mut stmt = conn.prepare(
        "SELECT teacher_name, teacher_email FROM absences WHERE date = ? ORDER BY teacher_key",
    )?;
    let rows = stmt.query_map([date], |r| {
        Ok(AbsenceEntry {
            date: date.to_string(),
            teacher: teacher_from_cols(r.get(0)?, r.get(1)?),
        })
    })?;
    rows.collect()
}

fn record_from_row(date: &str, r: &rusqlite::Row<'_>) -> rusqlite::Result<SubstitutionRecord> {
    Ok(SubstitutionRecord {
        id: r.get(0)?,
        date: date.to_string(),
        period: r.get(1)?,
        class: r.get(2)?,
        regular_subject: r.get(3)?,
        absent_teacher: teacher_from_cols(r.get(4)?, r.get(5)?),
        substitute_teacher: teacher_from_cols(r.get(6)?, r.get(7)?),
        substitute_subject: r.get(8)?,
    })
}

const RECORD_COLUMNS: &str = "id, period, class_name, regular_subject,
    absent_name, absent_email, substitute_name, substitute_email, substitute_subject";

pub fn substitutions_for_date(
    conn: &Connection,
    date: &str,
) -> rusqlite::Result<Vec<SubstitutionRecord>> {
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM substitutions WHERE date = ? ORDER BY period, class_name"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([date], |r| record_from_row(date, r))?;
    rows.collect()
}

pub enum PersistOutcome {
    Written,
    /// The slot's current substitute no longer matches what validation
    /// saw; the caller must re-read and retry.
    Conflict,
}

/// Conditional upsert keyed by (date, period, class). `expected_substitute`
/// is the substitute key validation observed for the slot: `None` means
/// "the slot must still be empty", `Some(k)` means "the stored substitute
/// must still be k". A concurrent change in between reports `Conflict`
/// instead of winning the race silently.
pub fn persist_substitution(
    conn: &Connection,
    record: &SubstitutionRecord,
    expected_substitute: Option<&str>,
) -> rusqlite::Result<PersistOutcome> {
    let class_key = identity_key(&record.class);
    let now = chrono::Utc::now().to_rfc3339();
    let changed = match expected_substitute {
        None => conn.execute(
            "INSERT INTO substitutions(
                id, date, period, class_name, class_key, regular_subject,
                absent_name, absent_email,
                substitute_name, substitute_email, substitute_key,
                substitute_subject, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(date, period, class_key) DO NOTHING",
            (
                &record.id,
                &record.date,
                record.period,
                &record.class,
                &class_key,
                &record.regular_subject,
                record.absent_teacher.name.as_deref(),
                record.absent_teacher.email.as_deref(),
                record.substitute_teacher.name.as_deref(),
                record.substitute_teacher.email.as_deref(),
                record.substitute_teacher.key(),
                &record.substitute_subject,
                &now,
            ),
        )?,
        Some(expected) => conn.execute(
            "UPDATE substitutions SET
                regular_subject = ?,
                absent_name = ?, absent_email = ?,
                substitute_name = ?, substitute_email = ?, substitute_key = ?,
                substitute_subject = ?, updated_at = ?
             WHERE date = ? AND period = ? AND class_key = ? AND substitute_key = ?",
            (
                &record.regular_subject,
                record.absent_teacher.name.as_deref(),
                record.absent_teacher.email.as_deref(),
                record.substitute_teacher.name.as_deref(),
                record.substitute_teacher.email.as_deref(),
                record.substitute_teacher.key(),
                &record.substitute_subject,
                &now,
                &record.date,
                record.period,
                &class_key,
                expected,
            ),
        )?,
    };
    if changed == 0 {
        return Ok(PersistOutcome::Conflict);
    }
    Ok(PersistOutcome::Written)
}

/// The general "daily timetable merged with substitutions" view: every
/// regular slot for the date's weekday, with covered slots rewritten to
/// show the substitute and flagged `isSubstitution`. Substitutions with
/// no surviving regular slot still appear as substitution rows.
pub fn daily_timetable_merged(
    conn: &Connection,
    date: &str,
    weekday: u32,
) -> rusqlite::Result<Vec<serde_json::Value>> {
    let regular = slots_for_weekday(conn, weekday)?;
    let substitutions = substitutions_for_date(conn, date)?;

    let mut consumed = vec![false; substitutions.len()];
    let mut out = Vec::new();

    for slot in &regular {
        let hit = substitutions.iter().position(|r| {
            r.period == slot.period && identity_key(&r.class) == identity_key(&slot.class)
        });
        match hit {
            Some(i) => {
                consumed[i] = true;
                let r = &substitutions[i];
                out.push(json!({
                    "period": slot.period,
                    "class": &slot.class,
                    "subject": &r.substitute_subject,
                    "teacher": &r.substitute_teacher,
                    "isSubstitution": true,
                    "absentTeacher": &r.absent_teacher,
                    "substituteTeacher": &r.substitute_teacher,
                    "originalSubject": &r.regular_subject,
                    "substituteSubject": &r.substitute_subject,
                }));
            }
            None => out.push(json!({
                "period": slot.period,
                "class": &slot.class,
                "subject": &slot.subject,
                "teacher": &slot.teacher,
                "isSubstitution": false,
            })),
        }
    }

    for (i, r) in substitutions.iter().enumerate() {
        if consumed[i] {
            continue;
        }
        out.push(json!({
            "period": r.period,
            "class": &r.class,
            "subject": &r.substitute_subject,
            "teacher": &r.substitute_teacher,
            "isSubstitution": true,
            "absentTeacher": &r.absent_teacher,
            "substituteTeacher": &r.substitute_teacher,
            "originalSubject": &r.regular_subject,
            "substituteSubject": &r.substitute_subject,
        }));
    }

    out.sort_by(|a, b| {
        let pa = a.get("period").and_then(serde_json::Value::as_u64).unwrap_or(0);
        let pb = b.get("period").and_then(serde_json::Value::as_u64).unwrap_or(0);
        pa.cmp(&pb).then_with(|| {
            let ca = a.get("class").and_then(serde_json::Value::as_str).unwrap_or("");
            let cb = b.get("class").and_then(serde_json::Value::as_str).unwrap_or("");
            ca.cmp(cb)
        })
    });
    Ok(out)
}
