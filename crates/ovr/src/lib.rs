//! ovr: One-vs-Rest multiclass classification over binary classifiers.
//!
//! A k-class problem is reduced to k binary problems, one per class, each
//! fitted with the same prototype classifier. Scoring runs every binary model
//! and picks the class with the highest positive score.
//!
//! # Key Types
//!
//! - [`OneVsRest`] / [`OneVsRestModel`] - The reduction estimator and model
//! - [`OneVsRestConfig`] - Configuration builder
//! - [`Classifier`] / [`ClassificationModel`] - Contracts a binary learner implements
//! - [`LogisticRegression`] - Built-in binary learner
//! - [`DataFrame`] - In-memory column table the stages read and write
//! - [`LibFfmOptions`] / [`LibFfmReader`] - LIBFFM data source
//!
//! # Persistence
//!
//! Stages implementing [`MlWritable`] save to a directory. Nested stages are
//! loaded back through a [`Registry`] keyed by class name; register loaders
//! for custom classifiers before loading models that contain them.

pub mod classification;
pub mod data;
pub mod logger;
pub mod one_vs_rest;
pub mod params;
pub mod persist;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Reduction
pub use one_vs_rest::{OneVsRest, OneVsRestConfig, OneVsRestModel};

// Binary learners
pub use classification::{
    ClassificationModel, Classifier, ConfigError, LogisticRegression, LogisticRegressionConfig,
    LogisticRegressionModel, TrainError,
};

// Data
pub use data::io::{LibFfmError, LibFfmOptions, LibFfmReader};
pub use data::{Attribute, DataError, DataFrame, FeatureVector};

// Parameters and persistence
pub use params::{ColumnParams, ParamMap};
pub use persist::{MlWritable, PersistError, Registry};

// Shared utilities
pub use logger::TrainingLogger;
pub use utils::{run_with_threads, Parallelism};
