pub mod assign;
pub mod availability;
pub mod error;
pub mod identity;
pub mod index;
pub mod reconcile;
pub mod vacancy;

use serde::{Deserialize, Serialize};

/// A teacher as supplied by the external roster or timetable. The two
/// sources format names inconsistently, so identity lives in the
/// normalized keys, never in the raw strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeacherRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl TeacherRef {
    pub fn named(name: &str) -> Self {
        TeacherRef {
            name: Some(name.to_string()),
            email: None,
        }
    }

    pub fn with_email(name: &str, email: &str) -> Self {
        TeacherRef {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
        }
    }

    /// Preferred identity key: normalized email when present, else
    /// normalized name. Empty when the ref carries neither.
    pub fn key(&self) -> String {
        let email_key = identity::identity_key(self.email.as_deref().unwrap_or(""));
        if !email_key.is_empty() {
            return email_key;
        }
        identity::identity_key(self.name.as_deref().unwrap_or(""))
    }

    /// All non-empty identity keys (email first). Matching anywhere in
    /// the engine means "any key in common", which lets an email-bearing
    /// roster row match a name-only timetable row.
    pub fn keys(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(2);
        let email_key = identity::identity_key(self.email.as_deref().unwrap_or(""));
        if !email_key.is_empty() {
            out.push(email_key);
        }
        let name_key = identity::identity_key(self.name.as_deref().unwrap_or(""));
        if !name_key.is_empty() && !out.contains(&name_key) {
            out.push(name_key);
        }
        out
    }

    pub fn is_blank(&self) -> bool {
        self.keys().is_empty()
    }

    pub fn same_teacher(&self, other: &TeacherRef) -> bool {
        let mine = self.keys();
        other.keys().iter().any(|k| mine.contains(k))
    }

    /// Best display label for logs and error details.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_default()
    }
}

/// One regularly scheduled class occurrence. Issued by the timetable
/// source for a whole week; never mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableSlot {
    /// 0 = Monday .. 6 = Sunday.
    pub weekday: u32,
    pub period: u32,
    pub class: String,
    pub subject: String,
    pub teacher: TeacherRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceEntry {
    pub date: String,
    pub teacher: TeacherRef,
}

/// Computed view only; recomputed on demand, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct VacantSlot {
    pub date: String,
    pub period: u32,
    pub class: String,
    pub subject: String,
    pub absent_teacher: TeacherRef,
}

/// Keyed by (date, period, class); at most one per key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstitutionRecord {
    pub id: String,
    pub date: String,
    pub period: u32,
    pub class: String,
    pub regular_subject: String,
    pub absent_teacher: TeacherRef,
    pub substitute_teacher: TeacherRef,
    pub substitute_subject: String,
}
