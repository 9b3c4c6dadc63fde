use std::collections::HashSet;

use super::index::DayIndex;
use super::TeacherRef;

/// Candidate substitutes for one period: the roster minus the excluded
/// set (typically the day's absentees) minus anyone already occupied in
/// that period, regular or substitute. Roster order is preserved; the
/// engine expresses no preference among feasible candidates.
pub fn free_teachers(
    period: u32,
    excluding: &[TeacherRef],
    roster: &[TeacherRef],
    index: &DayIndex,
) -> Vec<TeacherRef> {
    let excluded: HashSet<String> = excluding.iter().flat_map(|t| t.keys()).collect();

    roster
        .iter()
        .filter(|teacher| {
            let keys = teacher.keys();
            !keys.is_empty()
                && !keys.iter().any(|k| excluded.contains(k))
                && !index.is_busy(period, teacher)
        })
        .cloned()
        .collect()
}
