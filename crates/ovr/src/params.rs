//! Column parameters, per-call overrides and identifiers.
//!
//! Every stage reads and writes named frame columns. [`ColumnParams`] holds
//! the configured names; a [`ParamMap`] binds replacement names for a single
//! call (for example one `fit` of a prototype classifier) without touching the
//! stage's own configuration.

use serde::{Deserialize, Serialize};

/// Default name of the feature-vector column.
pub const DEFAULT_FEATURES_COL: &str = "features";
/// Default name of the label column.
pub const DEFAULT_LABEL_COL: &str = "label";
/// Default name of the prediction column.
pub const DEFAULT_PREDICTION_COL: &str = "prediction";
/// Default name of the raw-prediction (score vector) column.
pub const DEFAULT_RAW_PREDICTION_COL: &str = "rawPrediction";

// =============================================================================
// ColumnParams
// =============================================================================

/// Column names shared by classifiers and their models.
///
/// An empty output column name disables that output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnParams {
    pub features_col: String,
    pub label_col: String,
    pub prediction_col: String,
    pub raw_prediction_col: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_col: Option<String>,
}

impl Default for ColumnParams {
    fn default() -> Self {
        Self {
            features_col: DEFAULT_FEATURES_COL.to_string(),
            label_col: DEFAULT_LABEL_COL.to_string(),
            prediction_col: DEFAULT_PREDICTION_COL.to_string(),
            raw_prediction_col: DEFAULT_RAW_PREDICTION_COL.to_string(),
            weight_col: None,
        }
    }
}

impl ColumnParams {
    /// Copy of these params with every override in `overrides` applied.
    pub fn with_overrides(&self, overrides: &ParamMap) -> Self {
        let mut out = self.clone();
        if let Some(col) = &overrides.features_col {
            out.features_col = col.clone();
        }
        if let Some(col) = &overrides.label_col {
            out.label_col = col.clone();
        }
        if let Some(col) = &overrides.prediction_col {
            out.prediction_col = col.clone();
        }
        if let Some(col) = &overrides.raw_prediction_col {
            out.raw_prediction_col = col.clone();
        }
        if let Some(col) = &overrides.weight_col {
            out.weight_col = Some(col.clone());
        }
        out
    }

    /// The weight column, if one is set and non-empty.
    pub fn active_weight_col(&self) -> Option<&str> {
        self.weight_col.as_deref().filter(|c| !c.is_empty())
    }
}

// =============================================================================
// ParamMap
// =============================================================================

/// Per-call column overrides.
///
/// `None` keeps the stage's configured value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    pub features_col: Option<String>,
    pub label_col: Option<String>,
    pub prediction_col: Option<String>,
    pub raw_prediction_col: Option<String>,
    pub weight_col: Option<String>,
    /// Probability output, for classifiers that produce one.
    pub probability_col: Option<String>,
}

impl ParamMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_features_col(mut self, col: impl Into<String>) -> Self {
        self.features_col = Some(col.into());
        self
    }

    pub fn with_label_col(mut self, col: impl Into<String>) -> Self {
        self.label_col = Some(col.into());
        self
    }

    pub fn with_prediction_col(mut self, col: impl Into<String>) -> Self {
        self.prediction_col = Some(col.into());
        self
    }

    pub fn with_raw_prediction_col(mut self, col: impl Into<String>) -> Self {
        self.raw_prediction_col = Some(col.into());
        self
    }

    pub fn with_weight_col(mut self, col: impl Into<String>) -> Self {
        self.weight_col = Some(col.into());
        self
    }

    pub fn with_probability_col(mut self, col: impl Into<String>) -> Self {
        self.probability_col = Some(col.into());
        self
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Random stage identifier of the form `<prefix>_<12 hex digits>`.
pub fn random_uid(prefix: &str) -> String {
    let suffix = rand::random::<u64>() & 0xffff_ffff_ffff;
    format!("{prefix}_{suffix:012x}")
}

/// Column name that will not collide with user columns or with other calls.
pub fn temp_column_name(prefix: &str) -> String {
    format!("{prefix}{:032x}", rand::random::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_columns() {
        let base = ColumnParams::default();
        let overrides = ParamMap::new()
            .with_label_col("mc2b$0")
            .with_weight_col("w");

        let applied = base.with_overrides(&overrides);
        assert_eq!(applied.label_col, "mc2b$0");
        assert_eq!(applied.weight_col.as_deref(), Some("w"));
        assert_eq!(applied.features_col, DEFAULT_FEATURES_COL);
        assert_eq!(applied.raw_prediction_col, DEFAULT_RAW_PREDICTION_COL);
        // The base record is untouched.
        assert_eq!(base.label_col, DEFAULT_LABEL_COL);
    }

    #[test]
    fn empty_weight_col_is_inactive() {
        let mut params = ColumnParams::default();
        assert_eq!(params.active_weight_col(), None);
        params.weight_col = Some(String::new());
        assert_eq!(params.active_weight_col(), None);
        params.weight_col = Some("w".into());
        assert_eq!(params.active_weight_col(), Some("w"));
    }

    #[test]
    fn param_map_is_empty() {
        assert!(ParamMap::new().is_empty());
        assert!(!ParamMap::new().with_features_col("f").is_empty());
    }

    #[test]
    fn uid_has_prefix_and_suffix() {
        let uid = random_uid("oneVsRest");
        let (prefix, suffix) = uid.split_once('_').unwrap();
        assert_eq!(prefix, "oneVsRest");
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn temp_columns_are_unique() {
        let a = temp_column_name("mbc$acc");
        let b = temp_column_name("mbc$acc");
        assert!(a.starts_with("mbc$acc"));
        assert_ne!(a, b);
    }

    #[test]
    fn column_params_serde_uses_camel_case() {
        let json = serde_json::to_value(ColumnParams::default()).unwrap();
        assert_eq!(json["rawPredictionCol"], "rawPrediction");
        assert!(json.get("weightCol").is_none());
    }
}
