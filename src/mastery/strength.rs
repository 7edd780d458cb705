//! Legacy 0-100 strength arithmetic.
//!
//! Decay is evaluated on read from elapsed whole days; nothing ticks in the background.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MasteryRecord, MAX_STRENGTH};

const CORRECT_GAIN: i32 = 10;
const INCORRECT_PENALTY: i32 = 20;
const DECAY_GRACE_DAYS: u32 = 3;
const DECAY_PER_DAY: i64 = 5;

const VOCAB_WEIGHT: f64 = 0.5;
const GRAMMAR_WEIGHT: f64 = 0.3;
const ACCURACY_WEIGHT: f64 = 0.2;

pub fn calculate_strength_change(strength: u8, is_correct: bool) -> u8 {
    let s = strength.min(MAX_STRENGTH) as i32;
    let next = if is_correct {
        s + CORRECT_GAIN
    } else {
        s - INCORRECT_PENALTY
    };
    next.clamp(0, MAX_STRENGTH as i32) as u8
}

pub fn calculate_decay(strength: u8, days_since_last_practice: u32) -> u8 {
    let s = strength.min(MAX_STRENGTH);
    if days_since_last_practice <= DECAY_GRACE_DAYS {
        return s;
    }
    let overdue = (days_since_last_practice - DECAY_GRACE_DAYS) as i64;
    (s as i64 - DECAY_PER_DAY * overdue).max(0) as u8
}

/// Whole days between an RFC 3339 timestamp and `now`. Unparsable or future timestamps count as 0.
pub fn days_since(last_practiced: &str, now: DateTime<Utc>) -> u32 {
    match DateTime::parse_from_rfc3339(last_practiced) {
        Ok(ts) => (now - ts.with_timezone(&Utc)).num_days().max(0) as u32,
        Err(_) => 0,
    }
}

/// Stored strength with decay applied for the time since `last_practiced`.
pub fn effective_strength(record: &MasteryRecord, now: DateTime<Utc>) -> u8 {
    match record.last_practiced.as_deref() {
        Some(ts) => calculate_decay(record.strength(), days_since(ts, now)),
        None => record.strength(),
    }
}

/// Averages on the 0-100 scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStrengthInputs {
    pub avg_vocab_strength: f64,
    pub avg_grammar_strength: f64,
    pub exercise_accuracy: f64,
}

pub fn calculate_lesson_strength(inputs: LessonStrengthInputs) -> u8 {
    let weighted = VOCAB_WEIGHT * inputs.avg_vocab_strength
        + GRAMMAR_WEIGHT * inputs.avg_grammar_strength
        + ACCURACY_WEIGHT * inputs.exercise_accuracy;
    weighted.round().clamp(0.0, MAX_STRENGTH as f64) as u8
}
