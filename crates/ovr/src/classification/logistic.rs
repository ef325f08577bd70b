//! Binary logistic regression trained by coordinate descent.
//!
//! Each round first updates the intercept, then every coefficient in turn
//! with a Newton step on the (weighted) logistic loss plus an L2 penalty:
//!
//! ```text
//! delta_j = -(G_j + lambda * w_j) / (H_j + lambda) * learning_rate
//! ```
//!
//! where `G_j = sum_i g_i x_ij` and `H_j = sum_i h_i x_ij^2` are taken at the
//! current margins. Margins are maintained incrementally, so each update sees
//! the effect of the previous ones. Training stops after `max_iter` rounds or
//! once no parameter moves by more than `tol`.

use std::path::Path;

use bon::Builder;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::data::{DataError, DataFrame, FeatureVector};
use crate::logger::TrainingLogger;
use crate::params::{
    random_uid, ColumnParams, ParamMap, DEFAULT_FEATURES_COL, DEFAULT_LABEL_COL,
    DEFAULT_PREDICTION_COL, DEFAULT_RAW_PREDICTION_COL,
};
use crate::persist::{
    LinearPayload, Metadata, MlWritable, ModelPayload, Payload, PayloadV1, PersistError,
};

use super::{ClassificationModel, Classifier, ConfigError, TrainError};

/// Default name of the probability column.
pub const DEFAULT_PROBABILITY_COL: &str = "probability";

/// File holding the model coefficients.
const DATA_FILE: &str = "data";

/// Minimum denominator for a Newton step.
const HESS_MIN: f64 = 1e-6;

// =============================================================================
// LogisticRegressionConfig
// =============================================================================

/// Configuration for [`LogisticRegression`].
///
/// # Example
///
/// ```
/// use ovr::classification::LogisticRegressionConfig;
///
/// let config = LogisticRegressionConfig::builder()
///     .max_iter(50)
///     .reg_lambda(0.1)
///     .build()
///     .unwrap();
/// assert_eq!(config.features_col, "features");
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(rename_all = "camelCase")]
pub struct LogisticRegressionConfig {
    // === Columns ===
    #[builder(into, default = DEFAULT_FEATURES_COL.to_string())]
    pub features_col: String,

    #[builder(into, default = DEFAULT_LABEL_COL.to_string())]
    pub label_col: String,

    #[builder(into, default = DEFAULT_PREDICTION_COL.to_string())]
    pub prediction_col: String,

    #[builder(into, default = DEFAULT_RAW_PREDICTION_COL.to_string())]
    pub raw_prediction_col: String,

    #[builder(into, default = DEFAULT_PROBABILITY_COL.to_string())]
    pub probability_col: String,

    /// Per-row weights. Unset or empty means unit weights.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_col: Option<String>,

    // === Optimization ===
    /// Coordinate descent rounds. Default: 100.
    #[builder(default = 100)]
    pub max_iter: u32,

    /// Step shrinkage. Default: 0.5.
    #[builder(default = 0.5)]
    pub learning_rate: f64,

    /// L2 penalty on the coefficients. Default: 0.01.
    #[builder(default = 0.01)]
    pub reg_lambda: f64,

    /// Fit an intercept term. Default: true.
    #[builder(default = true)]
    pub fit_intercept: bool,

    /// Largest parameter change below which training stops. Default: 1e-6.
    #[builder(default = 1e-6)]
    pub tol: f64,

    // === Prediction ===
    /// Probability above which a row is predicted positive. Default: 0.5.
    #[builder(default = 0.5)]
    pub threshold: f64,
}

impl<S: logistic_regression_config_builder::IsComplete> LogisticRegressionConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `max_iter == 0`, `learning_rate <= 0`,
    /// `reg_lambda < 0`, `tol < 0` or `threshold` is outside `[0, 1]`.
    pub fn build(self) -> Result<LogisticRegressionConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl LogisticRegressionConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iter == 0 {
            return Err(ConfigError::InvalidMaxIter);
        }
        if !(self.learning_rate > 0.0) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if !(self.reg_lambda >= 0.0) {
            return Err(ConfigError::InvalidRegularization {
                field: "reg_lambda",
                value: self.reg_lambda,
            });
        }
        if !(self.tol >= 0.0) {
            return Err(ConfigError::InvalidRegularization {
                field: "tol",
                value: self.tol,
            });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    pub fn columns(&self) -> ColumnParams {
        ColumnParams {
            features_col: self.features_col.clone(),
            label_col: self.label_col.clone(),
            prediction_col: self.prediction_col.clone(),
            raw_prediction_col: self.raw_prediction_col.clone(),
            weight_col: self.weight_col.clone(),
        }
    }

    /// Copy with every override in `overrides` applied.
    pub fn with_overrides(&self, overrides: &ParamMap) -> Self {
        let columns = self.columns().with_overrides(overrides);
        Self {
            features_col: columns.features_col,
            label_col: columns.label_col,
            prediction_col: columns.prediction_col,
            raw_prediction_col: columns.raw_prediction_col,
            weight_col: columns.weight_col,
            probability_col: overrides
                .probability_col
                .clone()
                .unwrap_or_else(|| self.probability_col.clone()),
            ..self.clone()
        }
    }
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}

// =============================================================================
// LogisticRegression
// =============================================================================

/// Logistic regression estimator.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    uid: String,
    config: LogisticRegressionConfig,
}

impl LogisticRegression {
    pub const CLASS_NAME: &'static str = "ovr.classification.LogisticRegression";

    pub fn new(config: LogisticRegressionConfig) -> Self {
        Self {
            uid: random_uid("logreg"),
            config,
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    pub fn config(&self) -> &LogisticRegressionConfig {
        &self.config
    }

    /// Fit with the configured columns.
    pub fn fit_default(&self, data: &DataFrame) -> Result<LogisticRegressionModel, TrainError> {
        self.train(data, &ParamMap::new())
    }

    fn train(
        &self,
        data: &DataFrame,
        overrides: &ParamMap,
    ) -> Result<LogisticRegressionModel, TrainError> {
        let config = self.config.with_overrides(overrides);
        config.validate()?;
        let logger = TrainingLogger::new(&self.uid);

        let features = data.vectors(&config.features_col)?;
        let labels = data.doubles(&config.label_col)?;
        let weights = match config.columns().active_weight_col() {
            Some(col) => data.doubles(col)?.clone(),
            None => Array1::ones(labels.len()),
        };
        let n_rows = labels.len();
        if n_rows == 0 {
            return Err(TrainError::EmptyDataset);
        }
        let num_features = features[0].size();
        for (row, (&label, &weight)) in labels.iter().zip(weights.iter()).enumerate() {
            if label != 0.0 && label != 1.0 {
                return Err(TrainError::InvalidLabel {
                    row,
                    value: label,
                    reason: "binary labels must be 0 or 1",
                });
            }
            if !(weight >= 0.0) {
                return Err(TrainError::InvalidLabel {
                    row,
                    value: weight,
                    reason: "weights must be non-negative",
                });
            }
        }

        // Feature-major active entries: columns[j] = [(row, value), ...].
        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); num_features];
        for (row, vector) in features.iter().enumerate() {
            if vector.size() != num_features {
                return Err(DataError::DimensionMismatch {
                    column: config.features_col.clone(),
                    expected: num_features,
                    got: vector.size(),
                }
                .into());
            }
            vector.for_each_active(|j, x| {
                if x != 0.0 {
                    columns[j].push((row, x));
                }
            });
        }

        let mut coefficients = Array1::<f64>::zeros(num_features);
        let mut intercept = 0.0;
        let mut margins = Array1::<f64>::zeros(n_rows);
        let lambda = config.reg_lambda;
        let lr = config.learning_rate;

        let mut rounds = 0;
        for _ in 0..config.max_iter {
            rounds += 1;
            let mut max_change: f64 = 0.0;

            if config.fit_intercept {
                let (mut sum_grad, mut sum_hess) = (0.0, 0.0);
                for i in 0..n_rows {
                    let (g, h) = grad_hess(margins[i], labels[i], weights[i]);
                    sum_grad += g;
                    sum_hess += h;
                }
                if sum_hess > HESS_MIN {
                    let delta = -sum_grad / sum_hess * lr;
                    intercept += delta;
                    margins.mapv_inplace(|m| m + delta);
                    max_change = max_change.max(delta.abs());
                }
            }

            for (j, column) in columns.iter().enumerate() {
                let (mut sum_grad, mut sum_hess) = (0.0, 0.0);
                for &(i, x) in column {
                    let (g, h) = grad_hess(margins[i], labels[i], weights[i]);
                    sum_grad += g * x;
                    sum_hess += h * x * x;
                }
                let w = coefficients[j];
                let denom = sum_hess + lambda;
                if denom < HESS_MIN {
                    continue;
                }
                let delta = -(sum_grad + lambda * w) / denom * lr;
                if delta == 0.0 {
                    continue;
                }
                coefficients[j] = w + delta;
                for &(i, x) in column {
                    margins[i] += delta * x;
                }
                max_change = max_change.max(delta.abs());
            }

            if max_change <= config.tol {
                break;
            }
        }
        logger.debug(format_args!(
            "converged after {rounds} rounds over {n_rows} rows, {num_features} features"
        ));

        Ok(LogisticRegressionModel {
            uid: self.uid.clone(),
            config,
            coefficients,
            intercept,
        })
    }

    /// Load an estimator saved with [`MlWritable::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let metadata = Metadata::read_expecting(path.as_ref(), Self::CLASS_NAME)?;
        let config: LogisticRegressionConfig = metadata.params()?;
        config.validate()?;
        Ok(Self {
            uid: metadata.uid,
            config,
        })
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(LogisticRegressionConfig::default())
    }
}

/// Gradient and hessian of the weighted logistic loss at margin `m`.
#[inline]
fn grad_hess(margin: f64, label: f64, weight: f64) -> (f64, f64) {
    let p = sigmoid(margin);
    (weight * (p - label), weight * p * (1.0 - p))
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Classifier for LogisticRegression {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn columns(&self) -> ColumnParams {
        self.config.columns()
    }

    fn fit(
        &self,
        data: &DataFrame,
        overrides: &ParamMap,
    ) -> Result<Box<dyn ClassificationModel>, TrainError> {
        Ok(Box::new(self.train(data, overrides)?))
    }

    fn supports_weight_col(&self) -> bool {
        true
    }

    fn as_writable(&self) -> Option<&dyn MlWritable> {
        Some(self)
    }
}

impl MlWritable for LogisticRegression {
    fn write_to(&self, path: &Path) -> Result<(), PersistError> {
        Metadata::new(
            Self::CLASS_NAME,
            &self.uid,
            &self.config,
            &LogisticRegressionConfig::default(),
        )?
        .write(path)
    }
}

// =============================================================================
// LogisticRegressionModel
// =============================================================================

/// Fitted logistic regression.
///
/// Emits a raw prediction `[-m, m]` for margin `m`, a probability
/// `[1 - p, p]` and a 0/1 prediction thresholded on `p`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegressionModel {
    uid: String,
    config: LogisticRegressionConfig,
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LogisticRegressionModel {
    pub const CLASS_NAME: &'static str = "ovr.classification.LogisticRegressionModel";

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn config(&self) -> &LogisticRegressionConfig {
        &self.config
    }

    /// Margin `w . x + b` of one vector.
    pub fn margin(&self, features: &FeatureVector) -> f64 {
        features.dot(self.coefficients.view()) + self.intercept
    }

    /// Positive-class probability of one vector.
    pub fn predict_probability(&self, features: &FeatureVector) -> f64 {
        sigmoid(self.margin(features))
    }

    /// Load a model saved with [`MlWritable::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let metadata = Metadata::read_expecting(path, Self::CLASS_NAME)?;
        let config: LogisticRegressionConfig = metadata.params()?;
        config.validate()?;

        let Payload::V1(payload) = Payload::read(&path.join(DATA_FILE))?;
        let ModelPayload::Linear(linear) = payload.model;
        if linear.coefficients.len() != payload.num_features as usize {
            return Err(PersistError::Validation(format!(
                "{} coefficients for {} features",
                linear.coefficients.len(),
                payload.num_features
            )));
        }
        Ok(Self {
            uid: metadata.uid,
            config,
            coefficients: Array1::from(linear.coefficients),
            intercept: linear.intercept,
        })
    }
}

impl ClassificationModel for LogisticRegressionModel {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn num_features(&self) -> usize {
        self.coefficients.len()
    }

    fn columns(&self) -> ColumnParams {
        self.config.columns()
    }

    fn transform_with(
        &self,
        data: &DataFrame,
        overrides: &ParamMap,
    ) -> Result<DataFrame, DataError> {
        let config = self.config.with_overrides(overrides);
        let features = data.vectors(&config.features_col)?;
        let outputs = [
            &config.raw_prediction_col,
            &config.probability_col,
            &config.prediction_col,
        ];
        for col in outputs.into_iter().filter(|c| !c.is_empty()) {
            if data.has_column(col) {
                return Err(DataError::ColumnExists(col.clone()));
            }
        }

        let mut margins = Vec::with_capacity(features.len());
        for vector in features {
            if vector.size() != self.num_features() {
                return Err(DataError::DimensionMismatch {
                    column: config.features_col.clone(),
                    expected: self.num_features(),
                    got: vector.size(),
                });
            }
            margins.push(self.margin(vector));
        }

        let mut out = data.clone();
        if !config.raw_prediction_col.is_empty() {
            let raw: Vec<FeatureVector> = margins
                .iter()
                .map(|&m| FeatureVector::dense(vec![-m, m]))
                .collect();
            out = out.with_column(&config.raw_prediction_col, raw)?;
        }
        if !config.probability_col.is_empty() {
            let probability: Vec<FeatureVector> = margins
                .iter()
                .map(|&m| {
                    let p = sigmoid(m);
                    FeatureVector::dense(vec![1.0 - p, p])
                })
                .collect();
            out = out.with_column(&config.probability_col, probability)?;
        }
        if !config.prediction_col.is_empty() {
            let threshold = config.threshold;
            let prediction: Vec<f64> = margins
                .iter()
                .map(|&m| if sigmoid(m) > threshold { 1.0 } else { 0.0 })
                .collect();
            out = out.with_column(&config.prediction_col, prediction)?;
        }
        Ok(out)
    }

    fn as_writable(&self) -> Option<&dyn MlWritable> {
        Some(self)
    }

    fn clone_box(&self) -> Box<dyn ClassificationModel> {
        Box::new(self.clone())
    }
}

impl MlWritable for LogisticRegressionModel {
    fn write_to(&self, path: &Path) -> Result<(), PersistError> {
        Metadata::new(
            Self::CLASS_NAME,
            &self.uid,
            &self.config,
            &LogisticRegressionConfig::default(),
        )?
        .with_extra("numFeatures", self.num_features())?
        .write(path)?;

        Payload::V1(PayloadV1 {
            num_features: self.num_features() as u32,
            model: ModelPayload::Linear(LinearPayload {
                coefficients: self.coefficients.to_vec(),
                intercept: self.intercept,
            }),
        })
        .write(&path.join(DATA_FILE))
    }
}
