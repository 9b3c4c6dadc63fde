use super::error::EngineError;
use super::index::DayIndex;
use super::{AbsenceEntry, SubstitutionRecord, TeacherRef};

/// A requested substitution assignment, before validation.
#[derive(Debug, Clone)]
pub struct AssignmentInput {
    pub date: String,
    pub period: u32,
    pub class: String,
    pub regular_subject: String,
    pub absent_teacher: TeacherRef,
    pub substitute: TeacherRef,
    pub substitute_subject: String,
    /// Caller explicitly accepts replacing a different substitute
    /// already holding the slot.
    pub update: bool,
}

/// Re-validates an assignment against the latest state immediately
/// before the write.
///
/// `existing` is the record currently holding the target slot, if any.
/// `index` must be built from the date's substitutions *excluding* that
/// record, so an idempotent re-assign of the same substitute does not
/// trip the occupancy check against itself.
pub fn validate(
    input: &AssignmentInput,
    existing: Option<&SubstitutionRecord>,
    absences: &[AbsenceEntry],
    index: &DayIndex,
) -> Result<(), EngineError> {
    if input.date.trim().is_empty() {
        return Err(EngineError::Validation("missing date".to_string()));
    }
    if input.period == 0 {
        return Err(EngineError::Validation(
            "period must be a positive integer".to_string(),
        ));
    }
    if super::identity::identity_key(&input.class).is_empty() {
        return Err(EngineError::Validation("missing class".to_string()));
    }
    if input.substitute.is_blank() {
        return Err(EngineError::Validation(
            "substitute needs a name or an email".to_string(),
        ));
    }

    if absences
        .iter()
        .any(|a| a.teacher.same_teacher(&input.substitute))
    {
        return Err(EngineError::AbsenteeConflict {
            substitute: input.substitute.label(),
            date: input.date.clone(),
        });
    }

    if index.is_busy(input.period, &input.substitute) {
        return Err(EngineError::DoubleBooking {
            substitute: input.substitute.label(),
            date: input.date.clone(),
            period: input.period,
        });
    }

    if let Some(current) = existing {
        if !current.substitute_teacher.same_teacher(&input.substitute) && !input.update {
            return Err(EngineError::Conflict {
                date: input.date.clone(),
                period: input.period,
                class: input.class.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TimetableSlot;

    fn input(substitute: &TeacherRef, update: bool) -> AssignmentInput {
        AssignmentInput {
            date: "2024-03-04".to_string(),
            period: 3,
            class: "6A".to_string(),
            regular_subject: "Math".to_string(),
            absent_teacher: TeacherRef::named("Alice"),
            substitute: substitute.clone(),
            substitute_subject: "Math".to_string(),
            update,
        }
    }

    fn record(substitute: &TeacherRef) -> SubstitutionRecord {
        SubstitutionRecord {
            id: "s1".to_string(),
            date: "2024-03-04".to_string(),
            period: 3,
            class: "6A".to_string(),
            regular_subject: "Math".to_string(),
            absent_teacher: TeacherRef::named("Alice"),
            substitute_teacher: substitute.clone(),
            substitute_subject: "Math".to_string(),
        }
    }

    #[test]
    fn rejects_blank_substitute_before_anything_else() {
        let index = DayIndex::build(&[], &[]);
        let err = validate(&input(&TeacherRef::default(), false), None, &[], &index)
            .expect_err("blank substitute");
        assert_eq!(err.code(), "bad_params");
    }

    #[test]
    fn rejects_absent_substitute() {
        let carol = TeacherRef::named("Carol");
        let index = DayIndex::build(&[], &[]);
        let absences = vec![AbsenceEntry {
            date: "2024-03-04".to_string(),
            teacher: TeacherRef::named("C A R O L"),
        }];
        let err =
            validate(&input(&carol, false), None, &absences, &index).expect_err("absent substitute");
        assert_eq!(err.code(), "absentee_conflict");
    }

    #[test]
    fn rejects_substitute_with_a_regular_slot_in_the_period() {
        let carol = TeacherRef::named("Carol");
        let regular = vec![TimetableSlot {
            weekday: 0,
            period: 3,
            class: "7B".to_string(),
            subject: "Physics".to_string(),
            teacher: carol.clone(),
        }];
        let index = DayIndex::build(&regular, &[]);
        let err = validate(&input(&carol, false), None, &[], &index).expect_err("busy substitute");
        assert_eq!(err.code(), "double_booking");
    }

    #[test]
    fn same_substitute_reassignment_is_not_a_conflict() {
        let carol = TeacherRef::named("Carol");
        let existing = record(&carol);
        // Index built without the slot's own record.
        let index = DayIndex::build(&[], &[]);
        validate(&input(&carol, false), Some(&existing), &[], &index).expect("idempotent");
    }

    #[test]
    fn different_substitute_needs_explicit_update() {
        let carol = TeacherRef::named("Carol");
        let dave = TeacherRef::named("Dave");
        let existing = record(&carol);
        let index = DayIndex::build(&[], &[]);

        let err = validate(&input(&dave, false), Some(&existing), &[], &index)
            .expect_err("conflict without update");
        assert_eq!(err.code(), "conflict");

        validate(&input(&dave, true), Some(&existing), &[], &index).expect("update accepted");
    }
}
