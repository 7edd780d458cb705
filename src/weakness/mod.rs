//! Weakness analysis: recurring error types aggregated across items, ranked by severity.

pub mod analyzer;
pub mod detect;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::content::WordData;
use crate::types::{ErrorExample, ErrorType};

pub use analyzer::{
    analyze_weaknesses, generate_weakness_practice, get_weakness_summary, get_words_for_weakness,
    has_significant_weaknesses,
};
pub use detect::{detect_error_type, record_error_pattern, strip_tashkeel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Worsening,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weakness {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub label: String,
    pub count: u32,
    /// Errors from patterns last seen inside the recency window.
    pub recent_count: u32,
    /// Epoch milliseconds of the newest pattern in the group.
    pub last_occurred: i64,
    pub trend: Trend,
    pub severity: Severity,
    pub affected_word_ids: BTreeSet<String>,
    pub examples: Vec<ErrorExample>,
    pub description: String,
    pub advice: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaknessAnalysis {
    pub top_weaknesses: Vec<Weakness>,
    pub total_errors: u32,
    pub words_with_errors: usize,
    /// Epoch milliseconds.
    pub analyzed_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaknessPractice {
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub label: String,
    pub advice: String,
    pub words: Vec<WordData>,
}
