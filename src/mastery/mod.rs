//! Per-item mastery state: strength arithmetic, SM-2 scheduling, legacy migration
//! and encounter tracking.

pub mod encounters;
pub mod migration;
pub mod sm2;
pub mod strength;

pub use encounters::{
    add_encounter, get_encounter_progress, has_reached_target_encounters, TARGET_ENCOUNTERS,
};
pub use migration::{
    estimate_encounters_from_legacy, migrate_progress, migrate_record, migrate_strength_to_sm2,
    needs_migration,
};
pub use sm2::{due_items, is_due, quality_from_answer, update_sm2};
pub use strength::{
    calculate_decay, calculate_lesson_strength, calculate_strength_change, days_since,
    effective_strength, LessonStrengthInputs,
};
