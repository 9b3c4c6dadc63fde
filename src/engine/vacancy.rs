use std::collections::HashSet;

use super::identity::identity_key;
use super::index::DayIndex;
use super::{AbsenceEntry, VacantSlot};

/// Derives the uncovered (class, period) slots for a date: one entry per
/// regular slot of each absent teacher. Teachers with no regular slots
/// that day contribute nothing. Output is ordered by period, then class
/// name, so display and tests are stable.
pub fn vacant_slots(date: &str, absences: &[AbsenceEntry], index: &DayIndex) -> Vec<VacantSlot> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut seen_slots: HashSet<(u32, String)> = HashSet::new();
    let mut out = Vec::new();

    for absence in absences {
        let key = absence.teacher.key();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        for slot in index.regular_slots_of(&absence.teacher) {
            // The same physical teacher can arrive under disjoint
            // identifiers (an email-only row and a name-only row);
            // uniqueness holds per slot, not per absence entry.
            if !seen_slots.insert((slot.period, identity_key(&slot.class))) {
                continue;
            }
            out.push(VacantSlot {
                date: date.to_string(),
                period: slot.period,
                class: slot.class,
                subject: slot.subject,
                absent_teacher: absence.teacher.clone(),
            });
        }
    }

    out.sort_by(|a, b| a.period.cmp(&b.period).then_with(|| a.class.cmp(&b.class)));
    out
}
