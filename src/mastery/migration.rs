//! Legacy strength records -> SM-2 state.
//!
//! Callers gate each record with [`needs_migration`]; the migration routines
//! themselves do not re-check.

use chrono::{DateTime, Duration, Utc};

use crate::types::{
    EncounterCounts, Encounters, MasteryRecord, Progress, Sm2State, PROGRESS_VERSION,
};

struct Band {
    min_strength: u8,
    interval: u32,
    repetitions: u32,
    ease_factor: f64,
}

const BANDS: [Band; 5] = [
    Band { min_strength: 80, interval: 14, repetitions: 4, ease_factor: 2.7 },
    Band { min_strength: 60, interval: 7, repetitions: 3, ease_factor: 2.6 },
    Band { min_strength: 40, interval: 3, repetitions: 2, ease_factor: 2.5 },
    Band { min_strength: 20, interval: 1, repetitions: 1, ease_factor: 2.3 },
    Band { min_strength: 0, interval: 0, repetitions: 0, ease_factor: 2.5 },
];

fn band_for(strength: u8) -> &'static Band {
    BANDS
        .iter()
        .find(|band| strength >= band.min_strength)
        .unwrap_or(&BANDS[BANDS.len() - 1])
}

pub fn migrate_strength_to_sm2(
    strength: u8,
    last_practiced: Option<&str>,
    now: DateTime<Utc>,
) -> Sm2State {
    let band = band_for(strength);

    let next_review = if band.interval == 0 {
        now
    } else {
        let base = match last_practiced.map(DateTime::parse_from_rfc3339) {
            Some(Ok(ts)) => ts.with_timezone(&Utc),
            _ => {
                tracing::warn!(
                    last_practiced = ?last_practiced,
                    "unparsable lastPracticed during migration, scheduling from now"
                );
                now
            }
        };
        base + Duration::days(band.interval as i64)
    };

    Sm2State {
        ease_factor: band.ease_factor,
        interval: band.interval,
        repetitions: band.repetitions,
        next_review_date: next_review.timestamp_millis(),
    }
}

/// Legacy shape: a numeric strength and a lastPracticed string, with no `sm2` yet.
pub fn needs_migration(record: &MasteryRecord) -> bool {
    record.strength.is_some() && record.last_practiced.is_some() && record.sm2.is_none()
}

/// Every legacy answer counts as one exercise encounter. History cannot be recovered.
pub fn estimate_encounters_from_legacy(record: &MasteryRecord) -> Encounters {
    let total = record.total_attempts();
    Encounters {
        total,
        by_type: EncounterCounts {
            exercise: total,
            ..Default::default()
        },
        history: Vec::new(),
    }
}

pub fn migrate_record(record: &mut MasteryRecord, now: DateTime<Utc>) {
    record.sm2 = Some(migrate_strength_to_sm2(
        record.strength(),
        record.last_practiced.as_deref(),
        now,
    ));
    if record.encounters.is_none() {
        record.encounters = Some(estimate_encounters_from_legacy(record));
    }
}

/// Migrates every legacy record in place and returns how many were touched.
pub fn migrate_progress(progress: &mut Progress, now: DateTime<Utc>) -> usize {
    let mut migrated = 0;
    for (id, record) in progress.word_mastery.iter_mut() {
        if !needs_migration(record) {
            continue;
        }
        migrate_record(record, now);
        tracing::debug!(item_id = %id, strength = record.strength(), "migrated legacy record");
        migrated += 1;
    }
    if progress.version < PROGRESS_VERSION {
        progress.version = PROGRESS_VERSION;
    }
    if migrated > 0 {
        tracing::info!(migrated, "legacy progress migrated to sm2");
    }
    migrated
}
