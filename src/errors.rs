use thiserror::Error;

use crate::decimal::Rate;

/// Errors surfaced by the engine.
///
/// The calculations themselves are total and clamp out-of-range input; these
/// variants cover configuration loading and the external service seams.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid tax rate in {table}: {rate}")]
    InvalidTaxRate {
        table: String,
        rate: Rate,
    },

    #[error("tax brackets out of order in {table} at bracket {index}")]
    UnsortedBrackets {
        table: String,
        index: usize,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("advice service failed: {message}")]
    AdviceUnavailable {
        message: String,
    },

    #[error("advice score out of range: {score} (expected 1-10)")]
    AdviceScoreOutOfRange {
        score: i64,
    },

    #[error("listing extraction blocked for {url}")]
    ListingBlocked {
        url: String,
    },

    #[error("listing extraction failed for {url}: {message}")]
    ListingUnavailable {
        url: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// message suitable for showing next to a retry button
    pub fn user_message(&self) -> String {
        match self {
            EngineError::ListingBlocked { .. } => {
                "The listing site blocked automated access. Try again or paste the details manually.".to_string()
            }
            EngineError::AdviceUnavailable { .. } | EngineError::AdviceScoreOutOfRange { .. } => {
                "Advice could not be generated right now. Please retry.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::AdviceUnavailable { .. }
                | EngineError::AdviceScoreOutOfRange { .. }
                | EngineError::ListingBlocked { .. }
                | EngineError::ListingUnavailable { .. }
        )
    }
}
