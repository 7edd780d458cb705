use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::graph::EncompassingEdge;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphConfig {
    /// Weight of the edge to the immediately preceding lesson; divided by distance further back.
    pub adjacent_lesson_weight: f64,
    pub cross_book_weight: f64,
    pub same_lesson_item_weight: f64,
    pub min_weight: f64,
    pub enable_lesson_encompassing: bool,
    pub manual_overrides: Vec<EncompassingEdge>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            adjacent_lesson_weight: 0.5,
            cross_book_weight: 0.1,
            same_lesson_item_weight: 0.3,
            min_weight: 0.05,
            enable_lesson_encompassing: true,
            manual_overrides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeaknessConfig {
    pub min_errors_for_weakness: u32,
    pub moderate_threshold: u32,
    pub severe_threshold: u32,
    pub recent_error_days: i64,
    pub max_top_weaknesses: usize,
    pub max_examples: usize,
}

impl Default for WeaknessConfig {
    fn default() -> Self {
        Self {
            min_errors_for_weakness: 3,
            moderate_threshold: 6,
            severe_threshold: 10,
            recent_error_days: 7,
            max_top_weaknesses: 5,
            max_examples: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalibrationConfig {
    pub min_ratings: usize,
    pub tendency_threshold: f64,
    /// Size of each half of the trend comparison window.
    pub trend_window: usize,
    pub trend_threshold: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_ratings: 10,
            tendency_threshold: 0.15,
            trend_window: 20,
            trend_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeParams {
    pub threshold: u8,
    pub timer_seconds: u32,
}

impl Default for ChallengeParams {
    fn default() -> Self {
        Self {
            threshold: 80,
            timer_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub graph: GraphConfig,
    pub weakness: WeaknessConfig,
    pub calibration: CalibrationConfig,
    pub challenge: ChallengeParams,
    pub propagation: PropagationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropagationConfig {
    pub enabled: bool,
    /// Edges lighter than this do not carry implicit review credit.
    pub threshold: f64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.3,
        }
    }
}

fn env_or<T: FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}

impl EngineConfig {
    /// Defaults overridden by `MASTERY_*` environment variables. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            graph: GraphConfig {
                adjacent_lesson_weight: env_or(
                    "MASTERY_ADJACENT_LESSON_WEIGHT",
                    d.graph.adjacent_lesson_weight,
                ),
                cross_book_weight: env_or("MASTERY_CROSS_BOOK_WEIGHT", d.graph.cross_book_weight),
                same_lesson_item_weight: env_or(
                    "MASTERY_SAME_LESSON_ITEM_WEIGHT",
                    d.graph.same_lesson_item_weight,
                ),
                min_weight: env_or("MASTERY_MIN_EDGE_WEIGHT", d.graph.min_weight),
                enable_lesson_encompassing: env_or(
                    "MASTERY_LESSON_ENCOMPASSING",
                    d.graph.enable_lesson_encompassing,
                ),
                manual_overrides: Vec::new(),
            },
            weakness: WeaknessConfig {
                min_errors_for_weakness: env_or(
                    "MASTERY_MIN_ERRORS_FOR_WEAKNESS",
                    d.weakness.min_errors_for_weakness,
                ),
                moderate_threshold: env_or(
                    "MASTERY_MODERATE_THRESHOLD",
                    d.weakness.moderate_threshold,
                ),
                severe_threshold: env_or("MASTERY_SEVERE_THRESHOLD", d.weakness.severe_threshold),
                recent_error_days: env_or(
                    "MASTERY_RECENT_ERROR_DAYS",
                    d.weakness.recent_error_days,
                ),
                max_top_weaknesses: env_or(
                    "MASTERY_MAX_TOP_WEAKNESSES",
                    d.weakness.max_top_weaknesses,
                ),
                max_examples: d.weakness.max_examples,
            },
            calibration: CalibrationConfig {
                min_ratings: env_or(
                    "MASTERY_MIN_RATINGS_FOR_CALIBRATION",
                    d.calibration.min_ratings,
                ),
                ..d.calibration
            },
            challenge: ChallengeParams {
                threshold: env_or("MASTERY_CHALLENGE_THRESHOLD", d.challenge.threshold),
                timer_seconds: env_or("MASTERY_CHALLENGE_TIMER_SECONDS", d.challenge.timer_seconds),
            },
            propagation: PropagationConfig {
                enabled: env_or("MASTERY_PROPAGATION_ENABLED", d.propagation.enabled),
                threshold: env_or("MASTERY_PROPAGATION_THRESHOLD", d.propagation.threshold),
            },
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let g = &self.graph;
        for (name, value) in [
            ("adjacentLessonWeight", g.adjacent_lesson_weight),
            ("crossBookWeight", g.cross_book_weight),
            ("sameLessonItemWeight", g.same_lesson_item_weight),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        for edge in &g.manual_overrides {
            if edge.from.is_empty() || edge.to.is_empty() || edge.from == edge.to {
                return Err(EngineError::InvalidConfig(format!(
                    "manual override {} -> {} must join two distinct nodes",
                    edge.from, edge.to
                )));
            }
            if !(edge.weight <= 1.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "manual override {} -> {} weight must be <= 1 (or <= 0 to remove), got {}",
                    edge.from, edge.to, edge.weight
                )));
            }
        }
        if !(0.0..=1.0).contains(&g.min_weight) {
            return Err(EngineError::InvalidConfig(format!(
                "minWeight must be in [0, 1], got {}",
                g.min_weight
            )));
        }

        let w = &self.weakness;
        if w.moderate_threshold > w.severe_threshold {
            return Err(EngineError::InvalidConfig(format!(
                "moderateThreshold ({}) exceeds severeThreshold ({})",
                w.moderate_threshold, w.severe_threshold
            )));
        }
        if w.recent_error_days <= 0 {
            return Err(EngineError::InvalidConfig(
                "recentErrorDays must be positive".to_string(),
            ));
        }
        if self.calibration.min_ratings == 0 || self.calibration.trend_window == 0 {
            return Err(EngineError::InvalidConfig(
                "calibration windows must be non-zero".to_string(),
            ));
        }
        if self.challenge.threshold > 100 {
            return Err(EngineError::InvalidConfig(format!(
                "challenge threshold must be <= 100, got {}",
                self.challenge.threshold
            )));
        }
        Ok(())
    }
}

/// Runtime settings for the report binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub vocabulary_path: Option<PathBuf>,
    pub engine_config_path: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("MASTERY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let file_logs = std::env::var("ENABLE_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let log_dir = file_logs.then(|| {
            std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./logs"))
        });

        Self {
            data_dir,
            manifest_path: std::env::var("MASTERY_MANIFEST_PATH").ok().map(PathBuf::from),
            vocabulary_path: std::env::var("MASTERY_VOCABULARY_PATH").ok().map(PathBuf::from),
            engine_config_path: std::env::var("MASTERY_CONFIG_PATH").ok().map(PathBuf::from),
            log_level,
            log_dir,
        }
    }
}
