//! Error types for the object pool

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("No object generator was configured")]
    MissingGenerator,

    #[error("Minimum pool size must not be negative, got {0}")]
    NegativeMinimumPoolSize(i64),

    #[error("Maximum pool size must be at least 1, got {0}")]
    MaximumPoolSizeTooSmall(i64),

    #[error("Minimum pool size {minimum} exceeds maximum pool size {maximum}")]
    MinimumExceedsMaximum { minimum: usize, maximum: usize },

    #[error("Initial pool size must not be negative, got {0}")]
    NegativeInitialSize(i64),

    #[error("Invalid value '{value}' for setting {key}")]
    InvalidSetting { key: String, value: String },

    #[error("Object generator failed: {0}")]
    Generator(#[source] Arc<dyn StdError + Send + Sync>),
}

impl PoolError {
    /// Whether the error was raised while validating configuration
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, PoolError::Generator(_))
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
