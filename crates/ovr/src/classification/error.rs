//! Configuration and training errors.

use crate::data::DataError;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors from configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Parallelism must be at least 1.
    InvalidParallelism(usize),
    /// Maximum iteration count must be at least 1.
    InvalidMaxIter,
    /// Learning rate must be positive.
    InvalidLearningRate(f64),
    /// Invalid regularization parameter.
    InvalidRegularization { field: &'static str, value: f64 },
    /// Decision threshold must lie in [0, 1].
    InvalidThreshold(f64),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParallelism(v) => {
                write!(f, "parallelism must be at least 1, got {}", v)
            }
            Self::InvalidMaxIter => write!(f, "max_iter must be at least 1"),
            Self::InvalidLearningRate(v) => {
                write!(f, "learning_rate must be positive, got {}", v)
            }
            Self::InvalidRegularization { field, value } => {
                write!(f, "{} must be non-negative, got {}", field, value)
            }
            Self::InvalidThreshold(v) => write!(f, "threshold must be in [0, 1], got {}", v),
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// TrainError
// =============================================================================

/// Errors raised while fitting a classifier.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot train on an empty dataset")]
    EmptyDataset,

    #[error("label column declares no classes")]
    NoClasses,

    #[error("invalid label {value} at row {row}: {reason}")]
    InvalidLabel {
        row: usize,
        value: f64,
        reason: &'static str,
    },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("training the classifier for class {class_index} failed")]
    SubModel {
        class_index: usize,
        #[source]
        source: Box<TrainError>,
    },
}
