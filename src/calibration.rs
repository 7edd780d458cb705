//! Confidence calibration: how well self-rated confidence predicts correctness.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::CalibrationConfig;
use crate::types::{ConfidenceRating, ConfidenceRecord, MasteryRecord, MAX_CONFIDENCE_HISTORY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tendency {
    Overconfident,
    Underconfident,
    WellCalibrated,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalibrationTrend {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelStats {
    pub level: u8,
    pub count: usize,
    pub correct_count: usize,
    pub expected_accuracy: f64,
    pub actual_accuracy: f64,
    /// `actual - expected`; negative means answers were wrong more often than the rating implied.
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationStats {
    pub levels: Vec<LevelStats>,
    pub total_ratings: usize,
    pub calibration_score: f64,
    pub tendency: Tendency,
    pub feedback_message: String,
}

impl CalibrationStats {
    fn insufficient(total_ratings: usize, min_ratings: usize) -> Self {
        let missing = min_ratings.saturating_sub(total_ratings);
        let noun = if missing == 1 { "rating" } else { "ratings" };
        Self {
            levels: Vec::new(),
            total_ratings,
            calibration_score: 0.0,
            tendency: Tendency::InsufficientData,
            feedback_message: format!(
                "Rate your confidence on {missing} more {noun} to see how well you know what you know."
            ),
        }
    }
}

/// Every confidence record across all items, newest first.
pub fn aggregate_confidence_records(
    word_mastery: &BTreeMap<String, MasteryRecord>,
) -> Vec<ConfidenceRecord> {
    let mut records: Vec<ConfidenceRecord> = word_mastery
        .values()
        .flat_map(|record| record.confidence.history.iter().cloned())
        .collect();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records
}

fn level_stats(records: &[ConfidenceRecord]) -> Vec<LevelStats> {
    ConfidenceRating::ALL
        .iter()
        .filter_map(|&rating| {
            let (count, correct_count) = records
                .iter()
                .filter(|r| r.rating == rating)
                .fold((0usize, 0usize), |(n, c), r| (n + 1, c + r.was_correct as usize));
            if count == 0 {
                return None;
            }
            let actual_accuracy = correct_count as f64 / count as f64;
            let expected_accuracy = rating.expected_accuracy();
            Some(LevelStats {
                level: rating.level(),
                count,
                correct_count,
                expected_accuracy,
                actual_accuracy,
                difference: actual_accuracy - expected_accuracy,
            })
        })
        .collect()
}

fn feedback_message(tendency: Tendency, levels: &[LevelStats]) -> String {
    let worst = levels.iter().max_by(|a, b| {
        a.difference
            .abs()
            .partial_cmp(&b.difference.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let worst_level = worst.map(|l| l.level);

    match tendency {
        Tendency::Overconfident if worst_level == Some(ConfidenceRating::VerySure.level()) => {
            "When you feel very sure, double-check your answer. Those are the ones slipping through."
                .to_string()
        }
        Tendency::Overconfident => {
            "You tend to be more confident than your results show. Slow down on answers you feel good about."
                .to_string()
        }
        Tendency::Underconfident if worst_level == Some(ConfidenceRating::Unsure.level()) => {
            "You get many answers right even when unsure. Trust your instincts a little more.".to_string()
        }
        Tendency::Underconfident => {
            "You know more than you think. Your answers are more accurate than your ratings suggest."
                .to_string()
        }
        Tendency::WellCalibrated => {
            "Your confidence matches your accuracy well. You have a good sense of what you know."
                .to_string()
        }
        Tendency::InsufficientData => "Keep rating your confidence to build up a picture.".to_string(),
    }
}

pub fn calculate_calibration_stats(
    records: &[ConfidenceRecord],
    config: &CalibrationConfig,
) -> CalibrationStats {
    if records.len() < config.min_ratings {
        return CalibrationStats::insufficient(records.len(), config.min_ratings);
    }

    let levels = level_stats(records);
    let weight: usize = levels.iter().map(|l| l.count).sum();
    if weight == 0 {
        return CalibrationStats::insufficient(records.len(), config.min_ratings);
    }

    let weight = weight as f64;
    let abs_diff = levels
        .iter()
        .map(|l| l.difference.abs() * l.count as f64)
        .sum::<f64>()
        / weight;
    let signed_diff = levels
        .iter()
        .map(|l| l.difference * l.count as f64)
        .sum::<f64>()
        / weight;

    let calibration_score = (1.0 - abs_diff).clamp(0.0, 1.0);
    let tendency = if signed_diff < -config.tendency_threshold {
        Tendency::Overconfident
    } else if signed_diff > config.tendency_threshold {
        Tendency::Underconfident
    } else {
        Tendency::WellCalibrated
    };

    CalibrationStats {
        feedback_message: feedback_message(tendency, &levels),
        levels,
        total_ratings: records.len(),
        calibration_score,
        tendency,
    }
}

/// Compares the newest window of records against the one before it.
///
/// `records` must be ordered newest first, as returned by [`aggregate_confidence_records`].
pub fn get_calibration_trend(
    records: &[ConfidenceRecord],
    config: &CalibrationConfig,
) -> CalibrationTrend {
    let window = config.trend_window;
    if window == 0 || records.len() < window * 2 {
        return CalibrationTrend::InsufficientData;
    }

    let recent = calculate_calibration_stats(&records[..window], config);
    let previous = calculate_calibration_stats(&records[window..window * 2], config);
    if recent.tendency == Tendency::InsufficientData || previous.tendency == Tendency::InsufficientData {
        return CalibrationTrend::InsufficientData;
    }

    let delta = recent.calibration_score - previous.calibration_score;
    if delta > config.trend_threshold {
        CalibrationTrend::Improving
    } else if delta < -config.trend_threshold {
        CalibrationTrend::Declining
    } else {
        CalibrationTrend::Stable
    }
}

/// Appends a rating to the item's history, dropping the oldest entries past the cap.
pub fn record_confidence(
    record: &mut MasteryRecord,
    rating: ConfidenceRating,
    was_correct: bool,
    now_ms: i64,
) {
    let history = &mut record.confidence.history;
    history.push(ConfidenceRecord {
        timestamp: now_ms,
        rating,
        was_correct,
    });
    if history.len() > MAX_CONFIDENCE_HISTORY {
        let excess = history.len() - MAX_CONFIDENCE_HISTORY;
        history.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(rating: ConfidenceRating, total: usize, correct: usize, start: i64) -> Vec<ConfidenceRecord> {
        (0..total)
            .map(|i| ConfidenceRecord {
                timestamp: start + i as i64,
                rating,
                was_correct: i < correct,
            })
            .collect()
    }

    #[test]
    fn nine_ratings_are_insufficient() {
        let records = batch(ConfidenceRating::VerySure, 9, 9, 0);
        let stats = calculate_calibration_stats(&records, &CalibrationConfig::default());
        assert_eq!(stats.tendency, Tendency::InsufficientData);
        assert_eq!(stats.calibration_score, 0.0);
        assert_eq!(stats.total_ratings, 9);
        assert!(stats.feedback_message.contains("1 more rating "));
    }

    #[test]
    fn exact_expected_accuracy_scores_one() {
        let mut records = batch(ConfidenceRating::Unsure, 100, 33, 0);
        records.extend(batch(ConfidenceRating::Somewhat, 50, 33, 1_000));
        records.extend(batch(ConfidenceRating::VerySure, 10, 9, 2_000));
        let stats = calculate_calibration_stats(&records, &CalibrationConfig::default());
        assert_eq!(stats.tendency, Tendency::WellCalibrated);
        assert!((stats.calibration_score - 1.0).abs() < 1e-9);
        assert_eq!(stats.levels.len(), 3);
    }

    #[test]
    fn very_sure_but_wrong_is_overconfident() {
        let records = batch(ConfidenceRating::VerySure, 20, 10, 0);
        let stats = calculate_calibration_stats(&records, &CalibrationConfig::default());
        assert_eq!(stats.tendency, Tendency::Overconfident);
        assert!((stats.calibration_score - 0.6).abs() < 1e-9);
        assert!(stats.feedback_message.contains("very sure"));
    }

    #[test]
    fn unsure_but_right_is_underconfident() {
        let records = batch(ConfidenceRating::Unsure, 12, 12, 0);
        let stats = calculate_calibration_stats(&records, &CalibrationConfig::default());
        assert_eq!(stats.tendency, Tendency::Underconfident);
        assert!((stats.calibration_score - 0.33).abs() < 1e-9);
        assert_eq!(stats.levels[0].level, 1);
        assert_eq!(stats.levels[0].correct_count, 12);
    }

    #[test]
    fn aggregation_is_newest_first() {
        let mut mastery = BTreeMap::new();
        let mut a = MasteryRecord::default();
        record_confidence(&mut a, ConfidenceRating::Unsure, false, 10);
        record_confidence(&mut a, ConfidenceRating::VerySure, true, 30);
        let mut b = MasteryRecord::default();
        record_confidence(&mut b, ConfidenceRating::Somewhat, true, 20);
        mastery.insert("a".to_string(), a);
        mastery.insert("b".to_string(), b);

        let stamps: Vec<i64> = aggregate_confidence_records(&mastery)
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(stamps, vec![30, 20, 10]);
    }

    #[test]
    fn history_is_capped() {
        let mut record = MasteryRecord::default();
        for i in 0..(MAX_CONFIDENCE_HISTORY as i64 + 5) {
            record_confidence(&mut record, ConfidenceRating::Somewhat, true, i);
        }
        assert_eq!(record.confidence.history.len(), MAX_CONFIDENCE_HISTORY);
        assert_eq!(record.confidence.history[0].timestamp, 5);
    }

    #[test]
    fn trend_compares_recent_window_to_previous() {
        let config = CalibrationConfig::default();
        // newest first: 20 well-calibrated, then 20 badly overconfident
        let mut records = batch(ConfidenceRating::VerySure, 20, 18, 100);
        records.extend(batch(ConfidenceRating::VerySure, 20, 4, 0));
        assert_eq!(get_calibration_trend(&records, &config), CalibrationTrend::Improving);

        records.reverse();
        assert_eq!(get_calibration_trend(&records, &config), CalibrationTrend::Declining);

        let steady = batch(ConfidenceRating::Somewhat, 40, 26, 0);
        assert_eq!(get_calibration_trend(&steady, &config), CalibrationTrend::Stable);

        assert_eq!(
            get_calibration_trend(&steady[..39], &config),
            CalibrationTrend::InsufficientData
        );
    }
}
