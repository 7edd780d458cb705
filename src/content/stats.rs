//! Lesson and book rollups over decayed item strength.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ContentManifest, LessonContent};
use crate::error::EngineResult;
use crate::mastery::{calculate_lesson_strength, effective_strength, LessonStrengthInputs};
use crate::types::MasteryRecord;

const MASTERED_LESSON_STRENGTH: u8 = 80;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStats {
    pub lesson_id: String,
    pub book: u32,
    pub lesson: u32,
    pub vocab_count: usize,
    pub grammar_count: usize,
    pub practiced_items: usize,
    pub avg_vocab_strength: f64,
    pub avg_grammar_strength: f64,
    /// Percentage of correct answers across the lesson's items.
    pub exercise_accuracy: f64,
    pub lesson_strength: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookStats {
    pub book: u32,
    pub lesson_count: usize,
    pub mastered_lessons: usize,
    pub book_strength: u8,
    pub lessons: Vec<LessonStats>,
}

fn average_strength(
    ids: &[String],
    word_mastery: &BTreeMap<String, MasteryRecord>,
    now: DateTime<Utc>,
) -> Option<f64> {
    if ids.is_empty() {
        return None;
    }
    let total: u32 = ids
        .iter()
        .map(|id| {
            word_mastery
                .get(id)
                .map_or(0, |record| effective_strength(record, now) as u32)
        })
        .sum();
    Some(total as f64 / ids.len() as f64)
}

fn summarize_lesson(
    lesson: &LessonContent,
    word_mastery: &BTreeMap<String, MasteryRecord>,
    now: DateTime<Utc>,
) -> LessonStats {
    let vocab = average_strength(&lesson.vocabulary, word_mastery, now);
    let grammar = average_strength(&lesson.grammar_points, word_mastery, now);
    // A lesson without grammar (or without vocabulary) is judged on what it has.
    let (avg_vocab, avg_grammar) = match (vocab, grammar) {
        (Some(v), Some(g)) => (v, g),
        (Some(v), None) => (v, v),
        (None, Some(g)) => (g, g),
        (None, None) => (0.0, 0.0),
    };

    let mut correct = 0u32;
    let mut attempts = 0u32;
    let mut practiced = 0usize;
    for id in lesson.vocabulary.iter().chain(lesson.grammar_points.iter()) {
        if let Some(record) = word_mastery.get(id) {
            correct += record.times_correct;
            attempts += record.total_attempts();
            if record.total_attempts() > 0 {
                practiced += 1;
            }
        }
    }
    let accuracy = if attempts == 0 {
        0.0
    } else {
        correct as f64 / attempts as f64 * 100.0
    };

    LessonStats {
        lesson_id: lesson.id.clone(),
        book: lesson.book,
        lesson: lesson.lesson,
        vocab_count: lesson.vocabulary.len(),
        grammar_count: lesson.grammar_points.len(),
        practiced_items: practiced,
        avg_vocab_strength: avg_vocab,
        avg_grammar_strength: avg_grammar,
        exercise_accuracy: accuracy,
        lesson_strength: calculate_lesson_strength(LessonStrengthInputs {
            avg_vocab_strength: avg_vocab,
            avg_grammar_strength: avg_grammar,
            exercise_accuracy: accuracy,
        }),
    }
}

pub fn lesson_stats(
    manifest: &ContentManifest,
    lesson_id: &str,
    word_mastery: &BTreeMap<String, MasteryRecord>,
    now: DateTime<Utc>,
) -> EngineResult<LessonStats> {
    let lesson = manifest.lesson(lesson_id)?;
    Ok(summarize_lesson(lesson, word_mastery, now))
}

pub fn book_stats(
    manifest: &ContentManifest,
    book: u32,
    word_mastery: &BTreeMap<String, MasteryRecord>,
    now: DateTime<Utc>,
) -> EngineResult<BookStats> {
    let lessons: Vec<LessonStats> = manifest
        .book_lessons(book)?
        .into_iter()
        .map(|lesson| summarize_lesson(lesson, word_mastery, now))
        .collect();

    let book_strength = if lessons.is_empty() {
        0
    } else {
        let sum: u32 = lessons.iter().map(|l| l.lesson_strength as u32).sum();
        (sum as f64 / lessons.len() as f64).round() as u8
    };

    Ok(BookStats {
        book,
        lesson_count: lessons.len(),
        mastered_lessons: lessons
            .iter()
            .filter(|l| l.lesson_strength >= MASTERED_LESSON_STRENGTH)
            .count(),
        book_strength,
        lessons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn manifest() -> ContentManifest {
        let json = r#"[
            {"id": "l1", "book": 1, "lesson": 1, "vocabulary": ["w1", "w2"], "grammarPoints": ["g1"]},
            {"id": "l2", "book": 1, "lesson": 2, "vocabulary": ["w3"]}
        ]"#;
        ContentManifest::new(serde_json::from_str(json).unwrap())
    }

    fn record(strength: u8, correct: u32, incorrect: u32) -> MasteryRecord {
        MasteryRecord {
            strength: Some(strength),
            last_practiced: Some("2024-04-30T00:00:00Z".to_string()),
            times_correct: correct,
            times_incorrect: incorrect,
            ..Default::default()
        }
    }

    #[test]
    fn lesson_rollup() {
        let mut mastery = BTreeMap::new();
        mastery.insert("w1".to_string(), record(80, 3, 1));
        mastery.insert("w2".to_string(), record(60, 1, 0));
        mastery.insert("g1".to_string(), record(50, 4, 1));

        let stats = lesson_stats(&manifest(), "l1", &mastery, now()).unwrap();
        assert_eq!(stats.practiced_items, 3);
        assert!((stats.avg_vocab_strength - 70.0).abs() < 1e-9);
        assert!((stats.avg_grammar_strength - 50.0).abs() < 1e-9);
        assert!((stats.exercise_accuracy - 80.0).abs() < 1e-9);
        // 35 + 15 + 16
        assert_eq!(stats.lesson_strength, 66);
    }

    #[test]
    fn lesson_without_grammar_uses_vocab_average() {
        let mut mastery = BTreeMap::new();
        mastery.insert("w3".to_string(), record(100, 2, 0));
        let stats = lesson_stats(&manifest(), "l2", &mastery, now()).unwrap();
        assert_eq!(stats.lesson_strength, 100);
    }

    #[test]
    fn book_rollup_and_unknowns() {
        let mut mastery = BTreeMap::new();
        mastery.insert("w3".to_string(), record(100, 2, 0));
        let stats = book_stats(&manifest(), 1, &mastery, now()).unwrap();
        assert_eq!(stats.lesson_count, 2);
        assert_eq!(stats.mastered_lessons, 1);
        assert_eq!(stats.book_strength, 50);

        assert!(matches!(
            book_stats(&manifest(), 7, &mastery, now()),
            Err(EngineError::UnknownBook(7))
        ));
        assert!(matches!(
            lesson_stats(&manifest(), "l9", &mastery, now()),
            Err(EngineError::UnknownLesson(_))
        ));
    }
}
