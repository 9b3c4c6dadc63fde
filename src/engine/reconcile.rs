use serde_json::Value;

use super::{SubstitutionRecord, TeacherRef};

/// Which path produced the substitution list for a date. Reported to the
/// caller so a designed degradation is distinguishable from a genuine
/// empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Primary,
    MergedFallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Primary => "primary",
            Source::MergedFallback => "merged-fallback",
        }
    }
}

/// Strict fallback order: the primary store wins whenever it has at
/// least one record; only an empty primary consults the fallback, and
/// the two are never merged element-by-element. The fallback closure is
/// not invoked at all on a non-empty primary.
pub fn reconcile<F, E>(
    primary: Vec<SubstitutionRecord>,
    fallback: F,
) -> Result<(Vec<SubstitutionRecord>, Source), E>
where
    F: FnOnce() -> Result<Vec<SubstitutionRecord>, E>,
{
    if !primary.is_empty() {
        return Ok((primary, Source::Primary));
    }
    let derived = fallback()?;
    Ok((derived, Source::MergedFallback))
}

/// Derives substitution records from the merged daily timetable view.
/// Rows arrive in whatever shape the upstream view currently emits, so
/// field-name aliasing happens here, at this boundary, and nowhere else.
/// Rows not flagged as substitutions are ignored.
pub fn records_from_merged(date: &str, rows: &[Value]) -> Vec<SubstitutionRecord> {
    let mut out = Vec::new();
    for row in rows {
        if row.get("isSubstitution").and_then(Value::as_bool) != Some(true) {
            continue;
        }
        let Some(period) = row.get("period").and_then(Value::as_u64) else {
            continue;
        };
        let class = str_field(row, &["class", "className"]).unwrap_or_default();
        let regular_subject =
            str_field(row, &["subject", "originalSubject"]).unwrap_or_default();
        let substitute_subject = str_field(row, &["substituteSubject", "coverSubject"])
            .unwrap_or_else(|| regular_subject.clone());

        out.push(SubstitutionRecord {
            id: row
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            date: date.to_string(),
            period: period as u32,
            class,
            regular_subject,
            absent_teacher: teacher_field(row, &["absentTeacher", "originalTeacher", "absent"]),
            substitute_teacher: teacher_field(
                row,
                &["substituteTeacher", "coverTeacher", "substitute"],
            ),
            substitute_subject,
        });
    }
    out
}

fn str_field(row: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|n| row.get(n).and_then(Value::as_str))
        .map(|s| s.to_string())
        .filter(|s| !s.trim().is_empty())
}

fn teacher_field(row: &Value, names: &[&str]) -> TeacherRef {
    for name in names {
        match row.get(*name) {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                // Bare string: treat an address-looking value as email.
                if s.contains('@') {
                    return TeacherRef {
                        name: None,
                        email: Some(s.clone()),
                    };
                }
                return TeacherRef::named(s);
            }
            Some(Value::Object(obj)) => {
                let get = |k: &str| {
                    obj.get(k)
                        .and_then(Value::as_str)
                        .map(|s| s.to_string())
                        .filter(|s| !s.trim().is_empty())
                };
                let teacher = TeacherRef {
                    name: get("name"),
                    email: get("email"),
                };
                if !teacher.is_blank() {
                    return teacher;
                }
            }
            _ => {}
        }
    }
    TeacherRef::default()
}
