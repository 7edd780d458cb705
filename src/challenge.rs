//! Challenge mode: a stricter exercise variant unlocked once every item it tests is strong.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ChallengeParams;
use crate::types::MasteryRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationExercise {
    pub id: String,
    pub item_ids: Vec<String>,
    pub prompt: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInBlankExercise {
    pub id: String,
    pub item_ids: Vec<String>,
    pub sentence: String,
    pub answer: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningExercise {
    pub id: String,
    pub item_ids: Vec<String>,
    pub audio_ref: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceOrderExercise {
    pub id: String,
    pub item_ids: Vec<String>,
    pub words: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Exercise {
    WordToMeaning(TranslationExercise),
    MeaningToWord(TranslationExercise),
    FillInBlank(FillInBlankExercise),
    Listening(ListeningExercise),
    SentenceOrder(SentenceOrderExercise),
}

impl Exercise {
    pub fn id(&self) -> &str {
        match self {
            Exercise::WordToMeaning(e) | Exercise::MeaningToWord(e) => &e.id,
            Exercise::FillInBlank(e) => &e.id,
            Exercise::Listening(e) => &e.id,
            Exercise::SentenceOrder(e) => &e.id,
        }
    }

    pub fn item_ids(&self) -> &[String] {
        match self {
            Exercise::WordToMeaning(e) | Exercise::MeaningToWord(e) => &e.item_ids,
            Exercise::FillInBlank(e) => &e.item_ids,
            Exercise::Listening(e) => &e.item_ids,
            Exercise::SentenceOrder(e) => &e.item_ids,
        }
    }

    pub fn is_reversible(&self) -> bool {
        matches!(self, Exercise::WordToMeaning(_) | Exercise::MeaningToWord(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeConfig {
    pub is_challenge: bool,
    pub timer_seconds: Option<u32>,
    pub require_tashkeel: bool,
    pub hide_english_hint: bool,
    pub reversed_direction: bool,
}

/// Source of the 50/50 direction-reversal decision.
pub trait CoinFlip {
    fn flip(&mut self) -> bool;
}

pub struct RngCoin<R: Rng>(pub R);

impl<R: Rng> CoinFlip for RngCoin<R> {
    fn flip(&mut self) -> bool {
        self.0.random_bool(0.5)
    }
}

pub fn thread_coin() -> RngCoin<rand::rngs::ThreadRng> {
    RngCoin(rand::rng())
}

/// Always lands the same way.
pub struct FixedCoin(pub bool);

impl CoinFlip for FixedCoin {
    fn flip(&mut self) -> bool {
        self.0
    }
}

pub fn get_challenge_config<F, C>(
    exercise: &Exercise,
    get_strength: F,
    params: &ChallengeParams,
    coin: &mut C,
) -> ChallengeConfig
where
    F: Fn(&str) -> u8,
    C: CoinFlip + ?Sized,
{
    let item_ids = exercise.item_ids();
    if item_ids.is_empty() {
        return ChallengeConfig::default();
    }
    if !item_ids.iter().all(|id| get_strength(id) >= params.threshold) {
        return ChallengeConfig::default();
    }

    let reversed_direction = exercise.is_reversible() && coin.flip();
    tracing::debug!(
        exercise_id = exercise.id(),
        reversed_direction,
        "challenge mode unlocked"
    );
    ChallengeConfig {
        is_challenge: true,
        timer_seconds: Some(params.timer_seconds),
        require_tashkeel: true,
        hide_english_hint: true,
        reversed_direction,
    }
}

/// Swaps prompt and answer and flips the direction tag. Other exercise types are returned as-is.
pub fn reverse_exercise(exercise: &Exercise) -> Exercise {
    fn swapped(e: &TranslationExercise) -> TranslationExercise {
        TranslationExercise {
            id: e.id.clone(),
            item_ids: e.item_ids.clone(),
            prompt: e.answer.clone(),
            answer: e.prompt.clone(),
            hint: e.hint.clone(),
        }
    }

    match exercise {
        Exercise::WordToMeaning(e) => Exercise::MeaningToWord(swapped(e)),
        Exercise::MeaningToWord(e) => Exercise::WordToMeaning(swapped(e)),
        other => other.clone(),
    }
}

pub fn apply_challenge(exercise: &Exercise, config: &ChallengeConfig) -> Exercise {
    if config.reversed_direction && exercise.is_reversible() {
        reverse_exercise(exercise)
    } else {
        exercise.clone()
    }
}

pub fn record_challenge_result(record: &mut MasteryRecord, passed: bool, today: NaiveDate) {
    if passed {
        record.challenges_passed += 1;
    }
    record.last_challenge_date = Some(today.format("%Y-%m-%d").to_string());
}
