use thiserror::Error;

/// Engine error type.
///
/// Absent or corrupt persisted data is never an error (read paths substitute
/// defaults); these variants cover caller misuse and loader failures.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown book: {0}")]
    UnknownBook(u32),

    #[error("unknown lesson: {0}")]
    UnknownLesson(String),

    #[error("load failed: {0}")]
    Load(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
