//! # mastery-engine
//!
//! Learner analytics for a lesson-based language course.
//!
//! - [`mastery`] - strength arithmetic with decay on read, SM-2 scheduling,
//!   legacy migration and encounter tracking
//! - [`graph`] - weighted encompassing graph over lessons and items, with
//!   transitive queries and implicit review credit
//! - [`challenge`] - challenge-mode gating for strong items
//! - [`weakness`] - error classification and recurring-weakness ranking
//! - [`calibration`] - confidence vs. correctness scoring
//! - [`content`] - lesson manifest, vocabulary lookup, lesson and book stats
//! - [`store`] / [`context`] / [`tracker`] - persistence, lazy loading and the
//!   read-modify-persist operations tying the rest together
//!
//! Analysis is synchronous. Only dataset loading in [`context`] is async.
//!
//! ```rust
//! use chrono::Utc;
//! use mastery_engine::{Answer, EngineConfig, MemoryStore, ProgressTracker};
//!
//! let tracker = ProgressTracker::new(MemoryStore::new(), EngineConfig::default());
//! let outcome = tracker
//!     .record_answer(
//!         &Answer {
//!             item_id: "w1".into(),
//!             is_correct: true,
//!             ..Default::default()
//!         },
//!         Utc::now(),
//!     )
//!     .unwrap();
//! assert_eq!(outcome.strength, 10);
//! ```

pub mod calibration;
pub mod challenge;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod graph;
pub mod logging;
pub mod mastery;
pub mod store;
pub mod tracker;
pub mod types;
pub mod weakness;

pub use calibration::{CalibrationStats, CalibrationTrend, Tendency};
pub use challenge::{ChallengeConfig, Exercise};
pub use config::{AppConfig, EngineConfig};
pub use content::{ContentManifest, LessonContent, VocabularyIndex, VocabularySource, WordData};
pub use context::{ContentLoader, EngineContext, JsonContentLoader};
pub use error::{EngineError, EngineResult};
pub use graph::{EncompassingEdge, EncompassingGraph};
pub use store::{JsonFileStore, MemoryStore, ProgressStore};
pub use tracker::{Answer, AnswerOutcome, CalibrationReport, ProgressTracker};
pub use types::{ConfidenceRating, ErrorType, MasteryRecord, Progress, Sm2State};
pub use weakness::{Severity, Trend, Weakness, WeaknessAnalysis};
