pub mod absences;
pub mod core;
pub mod roster;
pub mod substitutions;
pub mod timetable;
