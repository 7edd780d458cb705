//! Learner-facing operations over a [`ProgressStore`].
//!
//! Every mutating call loads progress, applies one change, and persists it before returning.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::{
    aggregate_confidence_records, calculate_calibration_stats, get_calibration_trend,
    record_confidence, CalibrationStats, CalibrationTrend,
};
use crate::challenge::{get_challenge_config, record_challenge_result, ChallengeConfig, CoinFlip, Exercise};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::graph::{apply_implicit_credit, implicit_credit, EncompassingGraph};
use crate::mastery::{
    add_encounter, calculate_strength_change, due_items, effective_strength, migrate_progress,
    migrate_record, needs_migration, quality_from_answer, update_sm2,
};
use crate::store::ProgressStore;
use crate::types::{
    ConfidenceRating, EncounterType, Encounters, ErrorExample, ErrorType, MasteryRecord, Sm2State,
};
use crate::weakness::{analyze_weaknesses, detect_error_type, record_error_pattern, WeaknessAnalysis};

/// One submitted answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub item_id: String,
    pub is_correct: bool,
    #[serde(default)]
    pub confidence: Option<ConfidenceRating>,
    #[serde(default)]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub actual: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub item_id: String,
    pub strength: u8,
    pub sm2: Sm2State,
    pub error_type: Option<ErrorType>,
    /// Encompassed items whose strength rose from implicit credit.
    pub credited_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationReport {
    pub stats: CalibrationStats,
    pub trend: CalibrationTrend,
}

pub struct ProgressTracker<S> {
    store: S,
    config: EngineConfig,
    graph: Option<Arc<EncompassingGraph>>,
}

impl<S: ProgressStore> ProgressTracker<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            graph: None,
        }
    }

    /// Enables implicit credit propagation along this graph.
    pub fn with_graph(mut self, graph: Arc<EncompassingGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Brings legacy records onto SM-2; persists only when something changed.
    pub fn migrate(&self, now: DateTime<Utc>) -> EngineResult<usize> {
        let mut progress = self.store.get_progress();
        let migrated = migrate_progress(&mut progress, now);
        if migrated > 0 {
            self.store.save_progress(&progress)?;
        }
        Ok(migrated)
    }

    pub fn record_answer(&self, answer: &Answer, now: DateTime<Utc>) -> EngineResult<AnswerOutcome> {
        let now_ms = now.timestamp_millis();
        let mut progress = self.store.get_progress();

        let record = progress
            .word_mastery
            .entry(answer.item_id.clone())
            .or_default();
        if needs_migration(record) {
            migrate_record(record, now);
        }

        let strength = calculate_strength_change(effective_strength(record, now), answer.is_correct);
        record.set_strength(strength);
        record.last_practiced = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));
        if answer.is_correct {
            record.times_correct += 1;
        } else {
            record.times_incorrect += 1;
        }

        let current = record.sm2.clone().unwrap_or_else(|| Sm2State::new(now_ms));
        let sm2 = update_sm2(
            &current,
            quality_from_answer(answer.is_correct, answer.confidence),
            now_ms,
        );
        record.sm2 = Some(sm2.clone());

        let error_type = if answer.is_correct {
            None
        } else {
            let (error_type, example) = classify(answer);
            record_error_pattern(record, error_type.clone(), example, now_ms);
            Some(error_type)
        };

        if let Some(rating) = answer.confidence {
            record_confidence(record, rating, answer.is_correct, now_ms);
        }

        let encounters = record.encounters.take().unwrap_or_default();
        record.encounters = Some(add_encounter(&encounters, EncounterType::Exercise, now));

        let credited_items = match &self.graph {
            Some(graph) if answer.is_correct && self.config.propagation.enabled => {
                let credits = implicit_credit(&answer.item_id, graph, self.config.propagation.threshold);
                apply_implicit_credit(&mut progress.word_mastery, &credits, true, now)
            }
            _ => 0,
        };

        self.store.save_progress(&progress)?;
        tracing::debug!(
            item_id = %answer.item_id,
            correct = answer.is_correct,
            strength,
            interval = sm2.interval,
            credited_items,
            "answer recorded"
        );

        Ok(AnswerOutcome {
            item_id: answer.item_id.clone(),
            strength,
            sm2,
            error_type,
            credited_items,
        })
    }

    pub fn record_encounter(
        &self,
        item_id: &str,
        kind: EncounterType,
        now: DateTime<Utc>,
    ) -> EngineResult<Encounters> {
        let mut progress = self.store.get_progress();
        let record = progress.word_mastery.entry(item_id.to_string()).or_default();
        let next = add_encounter(&record.encounters.take().unwrap_or_default(), kind, now);
        record.encounters = Some(next.clone());
        self.store.save_progress(&progress)?;
        Ok(next)
    }

    pub fn record_confidence(
        &self,
        item_id: &str,
        rating: ConfidenceRating,
        was_correct: bool,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let mut progress = self.store.get_progress();
        let record = progress.word_mastery.entry(item_id.to_string()).or_default();
        record_confidence(record, rating, was_correct, now.timestamp_millis());
        self.store.save_progress(&progress)
    }

    /// Stamps every item of a finished challenge.
    pub fn record_challenge(&self, item_ids: &[String], passed: bool, now: DateTime<Utc>) -> EngineResult<()> {
        let mut progress = self.store.get_progress();
        let today = now.date_naive();
        for id in item_ids {
            let record = progress.word_mastery.entry(id.clone()).or_default();
            record_challenge_result(record, passed, today);
        }
        self.store.save_progress(&progress)
    }

    /// Decayed strength; 0 for items never practised.
    pub fn effective_strength(&self, item_id: &str, now: DateTime<Utc>) -> u8 {
        self.store
            .get_progress()
            .word_mastery
            .get(item_id)
            .map_or(0, |record| effective_strength(record, now))
    }

    pub fn record(&self, item_id: &str) -> Option<MasteryRecord> {
        self.store.get_progress().word_mastery.remove(item_id)
    }

    pub fn due_items(&self, now: DateTime<Utc>) -> Vec<String> {
        due_items(&self.store.get_progress().word_mastery, now.timestamp_millis())
    }

    pub fn analyze_weaknesses(&self, now: DateTime<Utc>) -> WeaknessAnalysis {
        analyze_weaknesses(
            &self.store.get_progress().word_mastery,
            &self.config.weakness,
            now.timestamp_millis(),
        )
    }

    pub fn calibration(&self) -> CalibrationReport {
        let records = aggregate_confidence_records(&self.store.get_progress().word_mastery);
        CalibrationReport {
            stats: calculate_calibration_stats(&records, &self.config.calibration),
            trend: get_calibration_trend(&records, &self.config.calibration),
        }
    }

    pub fn challenge_config_for<C>(&self, exercise: &Exercise, coin: &mut C, now: DateTime<Utc>) -> ChallengeConfig
    where
        C: CoinFlip + ?Sized,
    {
        let progress = self.store.get_progress();
        get_challenge_config(
            exercise,
            |id| {
                progress
                    .word_mastery
                    .get(id)
                    .map_or(0, |record| effective_strength(record, now))
            },
            &self.config.challenge,
            coin,
        )
    }
}

fn classify(answer: &Answer) -> (ErrorType, Option<ErrorExample>) {
    match (&answer.expected, &answer.actual) {
        (Some(expected), Some(actual)) => {
            let error_type = detect_error_type(expected, actual).unwrap_or_else(ErrorType::unclassified);
            let example = ErrorExample {
                expected: expected.clone(),
                actual: actual.clone(),
                exercise_id: answer.exercise_id.clone().unwrap_or_default(),
            };
            (error_type, Some(example))
        }
        _ => (ErrorType::unclassified(), None),
    }
}
