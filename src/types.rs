//! Data model shared by every analyzer.
//!
//! Persisted shapes use camelCase field names; optional legacy fields are kept
//! optional so old progress blobs still deserialize.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ==================== Constants ====================

/// Current persisted progress format.
pub const PROGRESS_VERSION: u32 = 2;

pub const MAX_STRENGTH: u8 = 100;

pub const MIN_EASE_FACTOR: f64 = 1.3;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

pub const MAX_ENCOUNTER_HISTORY: usize = 20;

pub const MAX_CONFIDENCE_HISTORY: usize = 100;

pub const MAX_PATTERN_EXAMPLES: usize = 3;

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

// ==================== Knowledge items ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Word,
    GrammarPoint,
    Lesson,
    Book,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: String,
    pub kind: ItemKind,
}

// ==================== SM-2 ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sm2State {
    pub ease_factor: f64,
    /// Days until the next review.
    pub interval: u32,
    pub repetitions: u32,
    /// Epoch milliseconds.
    pub next_review_date: i64,
}

impl Sm2State {
    /// A never-reviewed item, due immediately.
    pub fn new(now_ms: i64) -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 0,
            repetitions: 0,
            next_review_date: now_ms,
        }
    }
}

// ==================== Errors ====================

/// Mistake category. Tags this build does not know are kept verbatim in `Other` so
/// they survive a load and save and stay distinct from each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorType {
    LetterConfusion,
    MissingTashkeel,
    WrongTashkeel,
    WordOrder,
    WrongWord,
    Other(String),
}

/// Tag for wrong answers that carry nothing to classify.
pub const UNCLASSIFIED_ERROR_TAG: &str = "other";

impl ErrorType {
    pub fn unclassified() -> Self {
        ErrorType::Other(UNCLASSIFIED_ERROR_TAG.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            ErrorType::LetterConfusion => "letter_confusion",
            ErrorType::MissingTashkeel => "missing_tashkeel",
            ErrorType::WrongTashkeel => "wrong_tashkeel",
            ErrorType::WordOrder => "word_order",
            ErrorType::WrongWord => "wrong_word",
            ErrorType::Other(tag) => tag,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ErrorType::LetterConfusion => "Similar letters",
            ErrorType::MissingTashkeel => "Missing vowel marks",
            ErrorType::WrongTashkeel => "Incorrect vowel marks",
            ErrorType::WordOrder => "Word order",
            ErrorType::WrongWord => "Vocabulary recall",
            ErrorType::Other(tag) if tag == UNCLASSIFIED_ERROR_TAG => "General accuracy",
            ErrorType::Other(tag) => tag,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorType::LetterConfusion => {
                "You often swap letters that look or sound alike, such as ح/خ/ج or س/ص."
            }
            ErrorType::MissingTashkeel => "Your answers are right but leave out the vowel marks.",
            ErrorType::WrongTashkeel => "The letters are right but the vowel marks differ.",
            ErrorType::WordOrder => "You know the words but place them in a different order.",
            ErrorType::WrongWord => "You answer with a different word than the one asked for.",
            ErrorType::Other(_) => "Mistakes that do not fit a single pattern.",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            ErrorType::LetterConfusion => {
                "Practise the confusable letter pairs side by side and say each one aloud."
            }
            ErrorType::MissingTashkeel => {
                "Write the fatha, kasra and damma on every word until it feels automatic."
            }
            ErrorType::WrongTashkeel => {
                "Listen to the word again and copy its vowel marks before answering."
            }
            ErrorType::WordOrder => {
                "Review sentence patterns: verb and subject order, then adjectives after nouns."
            }
            ErrorType::WrongWord => "Revisit these words with flashcards before the next exercise.",
            ErrorType::Other(_) => "Slow down and compare your answer with the prompt before submitting.",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ErrorType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "letter_confusion" => ErrorType::LetterConfusion,
            "missing_tashkeel" => ErrorType::MissingTashkeel,
            "wrong_tashkeel" => ErrorType::WrongTashkeel,
            "word_order" => ErrorType::WordOrder,
            "wrong_word" => ErrorType::WrongWord,
            _ => ErrorType::Other(tag),
        }
    }
}

impl From<ErrorType> for String {
    fn from(error_type: ErrorType) -> Self {
        match error_type {
            ErrorType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorExample {
    pub expected: String,
    pub actual: String,
    pub exercise_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPattern {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub count: u32,
    /// Epoch milliseconds.
    pub last_occurred: i64,
    #[serde(default)]
    pub examples: Vec<ErrorExample>,
}

// ==================== Confidence ====================

/// Self-reported confidence before seeing the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ConfidenceRating {
    Unsure = 1,
    Somewhat = 2,
    VerySure = 3,
}

impl ConfidenceRating {
    pub const ALL: [ConfidenceRating; 3] = [
        ConfidenceRating::Unsure,
        ConfidenceRating::Somewhat,
        ConfidenceRating::VerySure,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn expected_accuracy(self) -> f64 {
        match self {
            ConfidenceRating::Unsure => 0.33,
            ConfidenceRating::Somewhat => 0.66,
            ConfidenceRating::VerySure => 0.90,
        }
    }
}

impl TryFrom<u8> for ConfidenceRating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ConfidenceRating::Unsure),
            2 => Ok(ConfidenceRating::Somewhat),
            3 => Ok(ConfidenceRating::VerySure),
            other => Err(format!("confidence rating must be 1..=3, got {other}")),
        }
    }
}

impl From<ConfidenceRating> for u8 {
    fn from(rating: ConfidenceRating) -> Self {
        rating.level()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceRecord {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub rating: ConfidenceRating,
    pub was_correct: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceHistory {
    #[serde(default)]
    pub history: Vec<ConfidenceRecord>,
}

// ==================== Encounters ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncounterType {
    Exercise,
    Flashcard,
    Reading,
    Listening,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterCounts {
    pub exercise: u32,
    pub flashcard: u32,
    pub reading: u32,
    pub listening: u32,
}

impl EncounterCounts {
    pub fn get(&self, kind: EncounterType) -> u32 {
        match kind {
            EncounterType::Exercise => self.exercise,
            EncounterType::Flashcard => self.flashcard,
            EncounterType::Reading => self.reading,
            EncounterType::Listening => self.listening,
        }
    }

    pub fn get_mut(&mut self, kind: EncounterType) -> &mut u32 {
        match kind {
            EncounterType::Exercise => &mut self.exercise,
            EncounterType::Flashcard => &mut self.flashcard,
            EncounterType::Reading => &mut self.reading,
            EncounterType::Listening => &mut self.listening,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterEvent {
    /// RFC 3339 timestamp.
    pub date: String,
    #[serde(rename = "type")]
    pub kind: EncounterType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Encounters {
    pub total: u32,
    pub by_type: EncounterCounts,
    /// Most recent first.
    pub history: Vec<EncounterEvent>,
}

// ==================== Mastery record ====================

fn deserialize_strength<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, MAX_STRENGTH as f64) as u8))
}

/// Per-item learning state, keyed by item id in [`Progress::word_mastery`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasteryRecord {
    #[serde(
        deserialize_with = "deserialize_strength",
        skip_serializing_if = "Option::is_none"
    )]
    pub strength: Option<u8>,
    /// RFC 3339 timestamp of the last answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_practiced: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sm2: Option<Sm2State>,
    pub times_correct: u32,
    pub times_incorrect: u32,
    pub challenges_passed: u32,
    pub last_challenge_date: Option<String>,
    pub error_patterns: Vec<ErrorPattern>,
    pub confidence: ConfidenceHistory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounters: Option<Encounters>,
}

impl MasteryRecord {
    /// Stored strength, 0 when never set.
    pub fn strength(&self) -> u8 {
        self.strength.unwrap_or(0)
    }

    pub fn set_strength(&mut self, value: u8) {
        self.strength = Some(value.min(MAX_STRENGTH));
    }

    pub fn total_attempts(&self) -> u32 {
        self.times_correct.saturating_add(self.times_incorrect)
    }

    pub fn total_errors(&self) -> u32 {
        self.error_patterns
            .iter()
            .fold(0u32, |total, p| total.saturating_add(p.count))
    }
}

/// Everything the progress store holds for one learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Progress {
    pub version: u32,
    pub word_mastery: BTreeMap<String, MasteryRecord>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            version: PROGRESS_VERSION,
            word_mastery: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_record_deserializes() {
        let json = r#"{"strength": 57.6, "lastPracticed": "2024-01-01T00:00:00Z", "timesCorrect": 4, "timesIncorrect": 2}"#;
        let record: MasteryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.strength, Some(58));
        assert!(record.sm2.is_none());
        assert!(record.error_patterns.is_empty());
        assert_eq!(record.total_attempts(), 6);
    }

    #[test]
    fn out_of_range_strength_is_clamped() {
        let record: MasteryRecord = serde_json::from_str(r#"{"strength": 180}"#).unwrap();
        assert_eq!(record.strength(), 100);
        let record: MasteryRecord = serde_json::from_str(r#"{"strength": -4}"#).unwrap();
        assert_eq!(record.strength(), 0);
    }

    #[test]
    fn confidence_rating_rejects_out_of_range() {
        assert!(serde_json::from_str::<ConfidenceRating>("4").is_err());
        let rating: ConfidenceRating = serde_json::from_str("3").unwrap();
        assert_eq!(rating, ConfidenceRating::VerySure);
        assert_eq!(serde_json::to_string(&rating).unwrap(), "3");
    }

    #[test]
    fn unknown_error_type_keeps_its_tag() {
        let pattern: ErrorPattern =
            serde_json::from_str(r#"{"type": "hamza_seat", "count": 2, "lastOccurred": 0}"#)
                .unwrap();
        assert_eq!(pattern.error_type, ErrorType::Other("hamza_seat".into()));
        assert_eq!(pattern.error_type.label(), "hamza_seat");

        let saved = serde_json::to_value(&pattern).unwrap();
        assert_eq!(saved["type"], "hamza_seat");

        let known: ErrorType = serde_json::from_str(r#""word_order""#).unwrap();
        assert_eq!(known, ErrorType::WordOrder);
        assert_eq!(serde_json::to_string(&ErrorType::unclassified()).unwrap(), r#""other""#);
    }

    #[test]
    fn counters_saturate_instead_of_overflowing() {
        let record = MasteryRecord {
            times_correct: u32::MAX,
            times_incorrect: 5,
            error_patterns: vec![
                ErrorPattern {
                    error_type: ErrorType::WrongWord,
                    count: 3_000_000_000,
                    last_occurred: 0,
                    examples: Vec::new(),
                },
                ErrorPattern {
                    error_type: ErrorType::WordOrder,
                    count: 3_000_000_000,
                    last_occurred: 0,
                    examples: Vec::new(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(record.total_attempts(), u32::MAX);
        assert_eq!(record.total_errors(), u32::MAX);
    }

    #[test]
    fn progress_uses_camel_case_keys() {
        let mut progress = Progress::default();
        progress
            .word_mastery
            .insert("w1".to_string(), MasteryRecord::default());
        let value = serde_json::to_value(&progress).unwrap();
        assert!(value.get("wordMastery").is_some());
        assert_eq!(value["version"], PROGRESS_VERSION);
    }
}
