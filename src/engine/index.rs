use std::collections::{HashMap, HashSet};

use super::identity::identity_key;
use super::{SubstitutionRecord, TeacherRef, TimetableSlot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularSlot {
    pub period: u32,
    pub class: String,
    pub subject: String,
}

/// Per-date snapshot answering "who is busy in period P" and "what does
/// teacher T regularly teach that day". Built from the regular timetable
/// for the day-of-week plus the substitutions already persisted for the
/// date. Immutable: after a successful assignment the caller must build
/// a fresh index before trusting further availability queries.
pub struct DayIndex {
    occupancy: HashMap<u32, HashSet<String>>,
    regular: HashMap<String, Vec<RegularSlot>>,
}

impl DayIndex {
    pub fn build(regular_slots: &[TimetableSlot], substitutions: &[SubstitutionRecord]) -> Self {
        let mut occupancy: HashMap<u32, HashSet<String>> = HashMap::new();
        let mut regular: HashMap<String, Vec<RegularSlot>> = HashMap::new();

        // Slots whose regular teacher has been replaced for this date.
        let overridden: HashSet<(u32, String)> = substitutions
            .iter()
            .map(|r| (r.period, identity_key(&r.class)))
            .collect();

        for slot in regular_slots {
            let entry = RegularSlot {
                period: slot.period,
                class: slot.class.clone(),
                subject: slot.subject.clone(),
            };
            for key in slot.teacher.keys() {
                regular.entry(key).or_default().push(entry.clone());
            }
            if !overridden.contains(&(slot.period, identity_key(&slot.class))) {
                occupancy
                    .entry(slot.period)
                    .or_default()
                    .extend(slot.teacher.keys());
            }
        }

        for record in substitutions {
            occupancy
                .entry(record.period)
                .or_default()
                .extend(record.substitute_teacher.keys());
        }

        DayIndex { occupancy, regular }
    }

    pub fn is_busy(&self, period: u32, teacher: &TeacherRef) -> bool {
        let Some(busy) = self.occupancy.get(&period) else {
            return false;
        };
        teacher.keys().iter().any(|k| busy.contains(k))
    }

    /// Regular slots of a teacher, deduplicated across their identity
    /// keys, in timetable order.
    pub fn regular_slots_of(&self, teacher: &TeacherRef) -> Vec<RegularSlot> {
        let mut seen: HashSet<(u32, String)> = HashSet::new();
        let mut out = Vec::new();
        for key in teacher.keys() {
            let Some(slots) = self.regular.get(&key) else {
                continue;
            };
            for slot in slots {
                if seen.insert((slot.period, identity_key(&slot.class))) {
                    out.push(slot.clone());
                }
            }
        }
        out
    }
}
