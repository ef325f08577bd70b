//! Binary classification contracts and the built-in logistic regression.
//!
//! - [`Classifier`] / [`ClassificationModel`]: the trainable prototype and the
//!   fitted scorer a reduction works against
//! - [`LogisticRegression`]: coordinate-descent logistic regression
//! - [`ConfigError`] / [`TrainError`]: configuration and fit failures

mod error;
mod logistic;
mod traits;

pub use error::{ConfigError, TrainError};
pub use logistic::{
    LogisticRegression, LogisticRegressionConfig, LogisticRegressionConfigBuilder,
    LogisticRegressionModel, DEFAULT_PROBABILITY_COL,
};
pub use traits::{ClassificationModel, Classifier};
