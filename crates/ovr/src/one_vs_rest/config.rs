//! One-vs-Rest configuration.

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::classification::ConfigError;
use crate::params::{
    ColumnParams, ParamMap, DEFAULT_FEATURES_COL, DEFAULT_LABEL_COL, DEFAULT_PREDICTION_COL,
    DEFAULT_RAW_PREDICTION_COL,
};

/// Configuration for [`OneVsRest`](super::OneVsRest).
///
/// Column names are passed to the wrapped classifier on every per-class fit.
/// An empty `prediction_col` or `raw_prediction_col` disables that output of
/// the fitted model.
///
/// # Example
///
/// ```
/// use ovr::OneVsRestConfig;
///
/// let config = OneVsRestConfig::builder()
///     .parallelism(4)
///     .raw_prediction_col("")
///     .build()
///     .unwrap();
/// assert_eq!(config.label_col, "label");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(rename_all = "camelCase")]
pub struct OneVsRestConfig {
    #[builder(into, default = DEFAULT_FEATURES_COL.to_string())]
    pub features_col: String,

    #[builder(into, default = DEFAULT_LABEL_COL.to_string())]
    pub label_col: String,

    #[builder(into, default = DEFAULT_PREDICTION_COL.to_string())]
    pub prediction_col: String,

    #[builder(into, default = DEFAULT_RAW_PREDICTION_COL.to_string())]
    pub raw_prediction_col: String,

    /// Per-row weights, used only if the classifier supports them.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_col: Option<String>,

    /// Number of per-class fits run concurrently. Default: 1.
    #[builder(default = 1)]
    pub parallelism: usize,
}

impl<S: one_vs_rest_config_builder::IsComplete> OneVsRestConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParallelism`] if `parallelism == 0`.
    pub fn build(self) -> Result<OneVsRestConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl OneVsRestConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallelism < 1 {
            return Err(ConfigError::InvalidParallelism(self.parallelism));
        }
        Ok(())
    }

    /// Column names as a shared record.
    pub fn columns(&self) -> ColumnParams {
        ColumnParams {
            features_col: self.features_col.clone(),
            label_col: self.label_col.clone(),
            prediction_col: self.prediction_col.clone(),
            raw_prediction_col: self.raw_prediction_col.clone(),
            weight_col: self.weight_col.clone(),
        }
    }

    /// Copy with the column overrides in `overrides` applied.
    pub fn with_overrides(&self, overrides: &ParamMap) -> Self {
        let columns = self.columns().with_overrides(overrides);
        Self {
            features_col: columns.features_col,
            label_col: columns.label_col,
            prediction_col: columns.prediction_col,
            raw_prediction_col: columns.raw_prediction_col,
            weight_col: columns.weight_col,
            parallelism: self.parallelism,
        }
    }
}

impl Default for OneVsRestConfig {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = OneVsRestConfig::default();
        assert_eq!(config.features_col, "features");
        assert_eq!(config.label_col, "label");
        assert_eq!(config.prediction_col, "prediction");
        assert_eq!(config.raw_prediction_col, "rawPrediction");
        assert_eq!(config.weight_col, None);
        assert_eq!(config.parallelism, 1);
    }

    #[test]
    fn parallelism_must_be_positive() {
        assert_eq!(
            OneVsRestConfig::builder().parallelism(0).build(),
            Err(ConfigError::InvalidParallelism(0))
        );
        assert!(OneVsRestConfig::builder().parallelism(8).build().is_ok());
    }

    #[test]
    fn params_json_is_camel_case() {
        let config = OneVsRestConfig::builder()
            .weight_col("w")
            .parallelism(2)
            .build()
            .unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["featuresCol"], "features");
        assert_eq!(json["weightCol"], "w");
        assert_eq!(json["parallelism"], 2);
        let back: OneVsRestConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn overrides_keep_parallelism() {
        let config = OneVsRestConfig::builder().parallelism(3).build().unwrap();
        let copied = config.with_overrides(&ParamMap::new().with_prediction_col("p"));
        assert_eq!(copied.prediction_col, "p");
        assert_eq!(copied.parallelism, 3);
    }
}
