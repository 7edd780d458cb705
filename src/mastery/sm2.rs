//! SM-2 scheduling.
//!
//! Quality 0-5: below 3 resets the item (due again immediately), 3 and above grows the
//! interval 1 -> 6 -> round(interval * EF). Ease factor never drops below 1.3.

use std::collections::BTreeMap;

use crate::types::{ConfidenceRating, MasteryRecord, Sm2State, MIN_EASE_FACTOR, MS_PER_DAY};

pub const MAX_QUALITY: u8 = 5;
pub const PASSING_QUALITY: u8 = 3;

const FIRST_INTERVAL_DAYS: u32 = 1;
const SECOND_INTERVAL_DAYS: u32 = 6;

/// Maps an answer (and the learner's confidence, when given) onto SM-2 quality.
pub fn quality_from_answer(is_correct: bool, confidence: Option<ConfidenceRating>) -> u8 {
    match (is_correct, confidence) {
        (false, Some(ConfidenceRating::VerySure)) => 0,
        (false, _) => 1,
        (true, Some(ConfidenceRating::Unsure)) => 3,
        (true, Some(ConfidenceRating::Somewhat)) | (true, None) => 4,
        (true, Some(ConfidenceRating::VerySure)) => 5,
    }
}

pub fn next_ease_factor(ease_factor: f64, quality: u8) -> f64 {
    let q = quality.min(MAX_QUALITY) as f64;
    let delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
    (ease_factor + delta).max(MIN_EASE_FACTOR)
}

pub fn update_sm2(state: &Sm2State, quality: u8, now_ms: i64) -> Sm2State {
    let quality = quality.min(MAX_QUALITY);
    let ease_factor = next_ease_factor(state.ease_factor, quality);

    let (interval, repetitions) = if quality < PASSING_QUALITY {
        (0, 0)
    } else {
        let repetitions = state.repetitions + 1;
        let interval = match repetitions {
            1 => FIRST_INTERVAL_DAYS,
            2 => SECOND_INTERVAL_DAYS,
            _ => (state.interval.max(1) as f64 * ease_factor).round() as u32,
        };
        (interval, repetitions)
    };

    let next = Sm2State {
        ease_factor,
        interval,
        repetitions,
        next_review_date: now_ms + interval as i64 * MS_PER_DAY,
    };
    tracing::debug!(
        quality,
        interval = next.interval,
        repetitions = next.repetitions,
        ease_factor = next.ease_factor,
        "sm2 updated"
    );
    next
}

pub fn is_due(state: &Sm2State, now_ms: i64) -> bool {
    state.next_review_date <= now_ms
}

/// Ids of items whose review date has passed, most overdue first (ties by id).
pub fn due_items(word_mastery: &BTreeMap<String, MasteryRecord>, now_ms: i64) -> Vec<String> {
    let mut due: Vec<(&String, i64)> = word_mastery
        .iter()
        .filter_map(|(id, record)| record.sm2.as_ref().map(|sm2| (id, sm2.next_review_date)))
        .filter(|(_, next)| *next <= now_ms)
        .collect();
    due.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    due.into_iter().map(|(id, _)| id.clone()).collect()
}
