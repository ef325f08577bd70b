//! One-vs-Rest estimator.

use std::sync::Arc;

use crate::classification::{ClassificationModel, Classifier, TrainError};
use crate::data::{Attribute, ColumnType, DataError, DataFrame, FeatureVector, StorageLevel};
use crate::logger::TrainingLogger;
use crate::params::{random_uid, ParamMap};
use crate::utils::run_with_threads;

use super::{OneVsRestConfig, OneVsRestModel};

/// Reduces k-class classification to k binary problems.
///
/// For every class `i` the prototype classifier is fitted on a copy of the
/// data whose label is 1.0 for class `i` and 0.0 otherwise. The k fits run on
/// a pool of `parallelism` threads and the resulting models are kept in
/// class order.
///
/// The prototype is shared, never mutated: each fit receives its column
/// bindings through a [`ParamMap`].
#[derive(Debug, Clone)]
pub struct OneVsRest {
    pub(super) uid: String,
    pub(super) classifier: Arc<dyn Classifier>,
    pub(super) config: OneVsRestConfig,
}

impl OneVsRest {
    /// Registry key of saved estimators.
    pub const CLASS_NAME: &'static str = "ovr.OneVsRest";

    pub fn new(classifier: Arc<dyn Classifier>, config: OneVsRestConfig) -> Self {
        Self {
            uid: random_uid("oneVsRest"),
            classifier,
            config,
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// The prototype classifier.
    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    pub fn config(&self) -> &OneVsRestConfig {
        &self.config
    }

    /// Copy with the column overrides in `overrides` applied. The uid and
    /// the prototype are shared.
    pub fn copy(&self, overrides: &ParamMap) -> Self {
        Self {
            uid: self.uid.clone(),
            classifier: Arc::clone(&self.classifier),
            config: self.config.with_overrides(overrides),
        }
    }

    /// Train one binary model per class.
    ///
    /// # Errors
    ///
    /// - [`TrainError::Data`] if the features, label or weight column is
    ///   missing or mistyped, or an output column already exists
    /// - [`TrainError::NoClasses`] if no class can be inferred
    /// - [`TrainError::SubModel`] for the lowest class whose fit failed
    pub fn fit(&self, data: &DataFrame) -> Result<OneVsRestModel, TrainError> {
        self.config.validate()?;
        let config = &self.config;
        let logger = TrainingLogger::new(&self.uid);
        logger.log_stage("fit");
        logger.log_params(config);
        logger.log_named_value("classifier", self.classifier.class_name());

        // Schema checks run before any training.
        data.require_type(&config.features_col, ColumnType::Vector)?;
        data.require_type(&config.label_col, ColumnType::Double)?;
        for col in [&config.prediction_col, &config.raw_prediction_col] {
            if !col.is_empty() && data.has_column(col) {
                return Err(DataError::ColumnExists(col.clone()).into());
            }
        }

        let weight_col = match config.weight_col.as_deref().filter(|c| !c.is_empty()) {
            Some(col) if self.classifier.supports_weight_col() => {
                data.require_type(col, ColumnType::Double)?;
                Some(col)
            }
            Some(_) => {
                logger.warn(format_args!(
                    "weightCol is ignored, as it is not supported by {} now.",
                    self.classifier.class_name()
                ));
                None
            }
            None => None,
        };

        let label_attribute = data.metadata(&config.label_col)?.cloned();
        let num_classes = self.num_classes(data, label_attribute.as_ref())?;
        logger.log_num_classes(num_classes);
        let num_features = data
            .vectors(&config.features_col)?
            .first()
            .map_or(0, FeatureVector::size);
        logger.log_num_features(num_features);

        let mut selected = vec![config.label_col.as_str(), config.features_col.as_str()];
        selected.extend(weight_col);
        let mut projected = data.select(&selected)?;

        // Persist the projection for the k fits if the caller hasn't.
        let handle_persistence = !data.is_persisted();
        if handle_persistence {
            projected.persist(StorageLevel::Memory);
        }
        let results = run_with_threads(config.parallelism, |parallelism| {
            parallelism.maybe_par_map(0..num_classes, |index| {
                self.fit_class(&projected, index, weight_col)
            })
        });
        if handle_persistence {
            projected.unpersist();
        }

        let models = results?
            .into_iter()
            .enumerate()
            .map(|(class_index, result)| {
                result.map_err(|source| TrainError::SubModel {
                    class_index,
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        logger.info(format_args!("trained {} binary models", models.len()));

        let label_metadata = match label_attribute {
            Some(attribute) if attribute.is_categorical() => attribute,
            _ => Attribute::nominal("label", num_classes),
        };

        Ok(OneVsRestModel::new(
            self.uid.clone(),
            label_metadata,
            models,
            config.columns(),
            Some(Arc::clone(&self.classifier)),
        ))
    }

    /// Class count from label metadata, else `floor(max(label)) + 1`.
    fn num_classes(
        &self,
        data: &DataFrame,
        attribute: Option<&Attribute>,
    ) -> Result<usize, TrainError> {
        let declared = attribute
            .filter(|a| a.is_categorical())
            .and_then(Attribute::num_classes);
        let num_classes = match declared {
            Some(n) => n,
            None => {
                let max = data.max(&self.config.label_col).map_err(|err| match err {
                    DataError::EmptyAggregate(_) => TrainError::NoClasses,
                    other => other.into(),
                })?;
                self.class_count_from_max(data, max)?
            }
        };
        if num_classes == 0 {
            return Err(TrainError::NoClasses);
        }
        Ok(num_classes)
    }

    /// `floor(max) + 1`, or 0 for a negative maximum.
    fn class_count_from_max(&self, data: &DataFrame, max: f64) -> Result<usize, TrainError> {
        let invalid = |reason: &'static str| {
            let row = data
                .doubles(&self.config.label_col)
                .ok()
                .and_then(|labels| labels.iter().position(|&v| v == max))
                .unwrap_or(0);
            TrainError::InvalidLabel {
                row,
                value: max,
                reason,
            }
        };
        if !max.is_finite() {
            return Err(invalid("labels must be finite"));
        }
        let floored = max.floor();
        if floored < 0.0 {
            return Ok(0);
        }
        // `usize::MAX as f64` rounds up, so reaching it is already out of range.
        if floored >= usize::MAX as f64 {
            return Err(invalid("label exceeds the supported class range"));
        }
        (floored as usize)
            .checked_add(1)
            .ok_or_else(|| invalid("label exceeds the supported class range"))
    }

    /// Fit the binary problem "class `index` vs the rest".
    fn fit_class(
        &self,
        data: &DataFrame,
        index: usize,
        weight_col: Option<&str>,
    ) -> Result<Box<dyn ClassificationModel>, TrainError> {
        let config = &self.config;
        let binary_label = format!("mc2b${index}");
        let class = index as f64;
        let labels = data.map_doubles(&config.label_col, |label| {
            if label == class {
                1.0
            } else {
                0.0
            }
        })?;
        let train = data.with_column_meta(&binary_label, labels, Some(Attribute::binary("label")))?;

        let mut overrides = ParamMap::new()
            .with_label_col(&binary_label)
            .with_features_col(&config.features_col)
            .with_prediction_col(&config.prediction_col);
        if let Some(col) = weight_col {
            overrides = overrides.with_weight_col(col);
        }
        log::debug!("[{}] fitting class {index} on {binary_label}", self.uid);
        self.classifier.fit(&train, &overrides)
    }
}
