use std::collections::{BTreeMap, BTreeSet};

use super::{Severity, Trend, Weakness, WeaknessAnalysis, WeaknessPractice};
use crate::config::WeaknessConfig;
use crate::content::{VocabularySource, WordData};
use crate::types::{ErrorExample, ErrorType, MasteryRecord, MS_PER_DAY};

#[derive(Default)]
struct Aggregate<'a> {
    count: u32,
    recent_count: u32,
    last_occurred: i64,
    affected: BTreeSet<String>,
    examples: Vec<(i64, &'a ErrorExample)>,
}

fn classify_severity(count: u32, config: &WeaknessConfig) -> Severity {
    if count >= config.severe_threshold {
        Severity::Severe
    } else if count >= config.moderate_threshold {
        Severity::Moderate
    } else {
        Severity::Mild
    }
}

fn classify_trend(count: u32, recent_count: u32) -> Trend {
    if recent_count == 0 {
        Trend::Improving
    } else if u64::from(recent_count) * 2 > u64::from(count) {
        Trend::Worsening
    } else {
        Trend::Stable
    }
}

pub fn analyze_weaknesses(
    word_mastery: &BTreeMap<String, MasteryRecord>,
    config: &WeaknessConfig,
    now_ms: i64,
) -> WeaknessAnalysis {
    let recent_cutoff = now_ms - config.recent_error_days * MS_PER_DAY;
    let mut groups: BTreeMap<ErrorType, Aggregate> = BTreeMap::new();
    let mut total_errors = 0u32;
    let mut words_with_errors = 0usize;

    for (word_id, record) in word_mastery {
        let mut word_errors = 0u32;
        for pattern in &record.error_patterns {
            if pattern.count == 0 {
                continue;
            }
            word_errors = word_errors.saturating_add(pattern.count);
            let group = groups.entry(pattern.error_type.clone()).or_default();
            group.count = group.count.saturating_add(pattern.count);
            if pattern.last_occurred >= recent_cutoff {
                group.recent_count = group.recent_count.saturating_add(pattern.count);
            }
            if group.affected.is_empty() || pattern.last_occurred > group.last_occurred {
                group.last_occurred = pattern.last_occurred;
            }
            group.affected.insert(word_id.clone());
            group
                .examples
                .extend(pattern.examples.iter().map(|ex| (pattern.last_occurred, ex)));
        }
        if word_errors > 0 {
            words_with_errors += 1;
            total_errors = total_errors.saturating_add(word_errors);
        }
    }

    let mut top_weaknesses: Vec<Weakness> = groups
        .into_iter()
        .filter(|(_, group)| group.count >= config.min_errors_for_weakness)
        .map(|(error_type, mut group)| {
            // Newest first; stable so examples within a pattern keep their order.
            group.examples.sort_by(|a, b| b.0.cmp(&a.0));
            Weakness {
                label: error_type.label().to_string(),
                description: error_type.description().to_string(),
                advice: error_type.advice().to_string(),
                error_type,
                count: group.count,
                recent_count: group.recent_count,
                last_occurred: group.last_occurred,
                trend: classify_trend(group.count, group.recent_count),
                severity: classify_severity(group.count, config),
                affected_word_ids: group.affected,
                examples: group
                    .examples
                    .into_iter()
                    .take(config.max_examples)
                    .map(|(_, ex)| ex.clone())
                    .collect(),
            }
        })
        .collect();

    top_weaknesses.sort_by(|a, b| b.severity.cmp(&a.severity).then(b.count.cmp(&a.count)));
    top_weaknesses.truncate(config.max_top_weaknesses);

    tracing::debug!(
        total_errors,
        words_with_errors,
        weaknesses = top_weaknesses.len(),
        "weakness analysis complete"
    );

    WeaknessAnalysis {
        top_weaknesses,
        total_errors,
        words_with_errors,
        analyzed_at: now_ms,
    }
}

pub fn has_significant_weaknesses(analysis: &WeaknessAnalysis) -> bool {
    !analysis.top_weaknesses.is_empty()
}

pub fn get_weakness_summary(analysis: &WeaknessAnalysis) -> String {
    match analysis.top_weaknesses.first() {
        Some(top) => format!("Focus area: {}", top.label),
        None if analysis.total_errors == 0 => {
            "Keep practicing! Patterns will show up here once you have answered more exercises."
                .to_string()
        }
        None => "No recurring mistakes yet. Keep up the good work!".to_string(),
    }
}

/// Resolves affected ids to words, skipping ids the vocabulary no longer knows.
pub fn get_words_for_weakness<V>(weakness: &Weakness, vocabulary: &V, max_items: usize) -> Vec<WordData>
where
    V: VocabularySource + ?Sized,
{
    let mut words = Vec::with_capacity(max_items.min(weakness.affected_word_ids.len()));
    for id in &weakness.affected_word_ids {
        if words.len() >= max_items {
            break;
        }
        match vocabulary.word_by_id(id) {
            Some(word) => words.push(word.clone()),
            None => tracing::warn!(word_id = %id, "weakness references unknown word, skipping"),
        }
    }
    words
}

/// Practice set for one weakness type; `None` when that type is not currently a weakness.
pub fn generate_weakness_practice<V>(
    analysis: &WeaknessAnalysis,
    error_type: &ErrorType,
    vocabulary: &V,
    max_items: usize,
) -> Option<WeaknessPractice>
where
    V: VocabularySource + ?Sized,
{
    let weakness = analysis
        .top_weaknesses
        .iter()
        .find(|w| &w.error_type == error_type)?;
    Some(WeaknessPractice {
        error_type: error_type.clone(),
        label: weakness.label.clone(),
        advice: weakness.advice.clone(),
        words: get_words_for_weakness(weakness, vocabulary, max_items),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::VocabularyIndex;
    use crate::types::ErrorPattern;

    const NOW: i64 = 1_700_000_000_000;

    fn pattern(error_type: ErrorType, count: u32, days_ago: i64) -> ErrorPattern {
        ErrorPattern {
            error_type,
            count,
            last_occurred: NOW - days_ago * MS_PER_DAY,
            examples: vec![ErrorExample {
                expected: format!("e{count}"),
                actual: format!("a{days_ago}"),
                exercise_id: "ex".into(),
            }],
        }
    }

    fn records(entries: Vec<(&str, Vec<ErrorPattern>)>) -> BTreeMap<String, MasteryRecord> {
        entries
            .into_iter()
            .map(|(id, patterns)| {
                (
                    id.to_string(),
                    MasteryRecord {
                        error_patterns: patterns,
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn three_words_ten_errors_is_severe() {
        let data = records(vec![
            ("w1", vec![pattern(ErrorType::LetterConfusion, 3, 1)]),
            ("w2", vec![pattern(ErrorType::LetterConfusion, 3, 2)]),
            ("w3", vec![pattern(ErrorType::LetterConfusion, 4, 1)]),
        ]);
        let analysis = analyze_weaknesses(&data, &WeaknessConfig::default(), NOW);
        assert_eq!(analysis.top_weaknesses.len(), 1);
        let w = &analysis.top_weaknesses[0];
        assert_eq!(w.count, 10);
        assert_eq!(w.severity, Severity::Severe);
        assert_eq!(w.affected_word_ids.len(), 3);
        assert_eq!(w.trend, Trend::Worsening);
        assert_eq!(w.examples.len(), 3);
        assert_eq!(w.last_occurred, NOW - MS_PER_DAY);
    }

    #[test]
    fn severity_bands() {
        let config = WeaknessConfig::default();
        assert_eq!(classify_severity(4, &config), Severity::Mild);
        assert_eq!(classify_severity(5, &config), Severity::Mild);
        assert_eq!(classify_severity(6, &config), Severity::Moderate);
        assert_eq!(classify_severity(9, &config), Severity::Moderate);
        assert_eq!(classify_severity(10, &config), Severity::Severe);
        assert_eq!(classify_severity(12, &config), Severity::Severe);
    }

    #[test]
    fn below_minimum_excluded_but_counted() {
        let data = records(vec![
            ("w1", vec![pattern(ErrorType::WordOrder, 2, 1)]),
            ("w2", vec![pattern(ErrorType::MissingTashkeel, 3, 1)]),
        ]);
        let analysis = analyze_weaknesses(&data, &WeaknessConfig::default(), NOW);
        assert_eq!(analysis.total_errors, 5);
        assert_eq!(analysis.words_with_errors, 2);
        assert_eq!(analysis.top_weaknesses.len(), 1);
        assert_eq!(analysis.top_weaknesses[0].error_type, ErrorType::MissingTashkeel);
    }

    #[test]
    fn trend_from_recency() {
        let data = records(vec![
            ("w1", vec![pattern(ErrorType::WordOrder, 4, 30)]),
            (
                "w2",
                vec![
                    pattern(ErrorType::WrongWord, 3, 1),
                    pattern(ErrorType::WrongTashkeel, 2, 1),
                ],
            ),
            ("w3", vec![
                pattern(ErrorType::WrongWord, 3, 20),
                pattern(ErrorType::WrongTashkeel, 6, 20),
            ]),
        ]);
        let analysis = analyze_weaknesses(&data, &WeaknessConfig::default(), NOW);
        let trend_of = |t: ErrorType| {
            analysis
                .top_weaknesses
                .iter()
                .find(|w| w.error_type == t)
                .map(|w| w.trend)
        };
        assert_eq!(trend_of(ErrorType::WordOrder), Some(Trend::Improving));
        assert_eq!(trend_of(ErrorType::WrongWord), Some(Trend::Stable));
        assert_eq!(trend_of(ErrorType::WrongTashkeel), Some(Trend::Stable));
    }

    #[test]
    fn sorted_by_severity_then_count_and_capped() {
        let config = WeaknessConfig {
            max_top_weaknesses: 3,
            ..Default::default()
        };
        let data = records(vec![
            ("w1", vec![pattern(ErrorType::WordOrder, 4, 1)]),
            ("w2", vec![pattern(ErrorType::WrongWord, 7, 1)]),
            ("w3", vec![pattern(ErrorType::LetterConfusion, 11, 1)]),
            ("w4", vec![pattern(ErrorType::MissingTashkeel, 9, 1)]),
            ("w5", vec![pattern(ErrorType::WrongTashkeel, 5, 1)]),
        ]);
        let analysis = analyze_weaknesses(&data, &config, NOW);
        let order: Vec<ErrorType> = analysis.top_weaknesses.iter().map(|w| w.error_type.clone()).collect();
        assert_eq!(
            order,
            vec![
                ErrorType::LetterConfusion,
                ErrorType::MissingTashkeel,
                ErrorType::WrongWord
            ]
        );
        assert_eq!(analysis.total_errors, 36);
    }

    #[test]
    fn unrecognised_types_stay_separate() {
        let data = records(vec![
            ("w1", vec![pattern(ErrorType::Other("hamza_seat".into()), 4, 1)]),
            ("w2", vec![pattern(ErrorType::Other("sun_moon_letters".into()), 4, 1)]),
        ]);
        let analysis = analyze_weaknesses(&data, &WeaknessConfig::default(), NOW);
        let labels: Vec<&str> = analysis
            .top_weaknesses
            .iter()
            .map(|w| w.label.as_str())
            .collect();
        assert_eq!(labels, vec!["hamza_seat", "sun_moon_letters"]);
        assert!(analysis.top_weaknesses.iter().all(|w| w.count == 4));
    }

    #[test]
    fn huge_counts_saturate() {
        let data = records(vec![
            ("w1", vec![pattern(ErrorType::WrongWord, 3_000_000_000, 1)]),
            ("w2", vec![pattern(ErrorType::WrongWord, 3_000_000_000, 1)]),
        ]);
        let analysis = analyze_weaknesses(&data, &WeaknessConfig::default(), NOW);
        assert_eq!(analysis.total_errors, u32::MAX);
        let w = &analysis.top_weaknesses[0];
        assert_eq!(w.count, u32::MAX);
        assert_eq!(w.recent_count, u32::MAX);
        assert_eq!(w.trend, Trend::Worsening);
        assert_eq!(classify_trend(3_000_000_000, 2_000_000_000), Trend::Worsening);
    }

    #[test]
    fn summary_text() {
        let empty = WeaknessAnalysis::default();
        assert!(!has_significant_weaknesses(&empty));
        assert!(get_weakness_summary(&empty).starts_with("Keep practicing"));

        let data = records(vec![("w1", vec![pattern(ErrorType::WordOrder, 6, 1)])]);
        let analysis = analyze_weaknesses(&data, &WeaknessConfig::default(), NOW);
        assert!(has_significant_weaknesses(&analysis));
        assert_eq!(get_weakness_summary(&analysis), "Focus area: Word order");
    }

    #[test]
    fn practice_skips_unknown_words_and_caps() {
        let data = records(vec![
            ("w1", vec![pattern(ErrorType::WrongWord, 2, 1)]),
            ("w2", vec![pattern(ErrorType::WrongWord, 2, 1)]),
            ("gone", vec![pattern(ErrorType::WrongWord, 2, 1)]),
            ("w3", vec![pattern(ErrorType::WrongWord, 2, 1)]),
        ]);
        let analysis = analyze_weaknesses(&data, &WeaknessConfig::default(), NOW);
        let vocab = VocabularyIndex::new(
            ["w1", "w2", "w3"]
                .iter()
                .map(|id| WordData {
                    id: id.to_string(),
                    arabic: String::new(),
                    english: id.to_string(),
                    transliteration: None,
                    lesson_id: None,
                })
                .collect(),
        );

        let practice =
            generate_weakness_practice(&analysis, &ErrorType::WrongWord, &vocab, 10).unwrap();
        let ids: Vec<&str> = practice.words.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["w1", "w2", "w3"]);

        let capped = get_words_for_weakness(&analysis.top_weaknesses[0], &vocab, 2);
        assert_eq!(capped.len(), 2);

        assert!(generate_weakness_practice(&analysis, &ErrorType::WordOrder, &vocab, 10).is_none());
    }
}
