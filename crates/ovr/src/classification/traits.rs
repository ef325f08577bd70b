//! Classifier and model contracts.
//!
//! A [`Classifier`] is a trainable prototype: it is never mutated by `fit`,
//! and per-call column bindings arrive through a [`ParamMap`]. A
//! [`ClassificationModel`] scores frames and must emit a raw-prediction
//! vector column whose component 1 is the positive-class score.

use std::fmt;

use crate::data::{DataError, DataFrame};
use crate::params::{ColumnParams, ParamMap};
use crate::persist::MlWritable;

use super::TrainError;

/// A trainable binary classifier.
pub trait Classifier: fmt::Debug + Send + Sync {
    /// Stage identifier.
    fn uid(&self) -> &str;

    /// Registry key under which the classifier is saved.
    fn class_name(&self) -> &'static str;

    /// Concrete Rust type, for error messages.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Configured column names.
    fn columns(&self) -> ColumnParams;

    /// Train on `data`, with `overrides` replacing configured columns for
    /// this call only.
    fn fit(
        &self,
        data: &DataFrame,
        overrides: &ParamMap,
    ) -> Result<Box<dyn ClassificationModel>, TrainError>;

    /// Whether `fit` honours a weight column.
    fn supports_weight_col(&self) -> bool {
        false
    }

    /// Persistence capability, if the classifier has one.
    fn as_writable(&self) -> Option<&dyn MlWritable> {
        None
    }
}

/// A fitted binary model.
pub trait ClassificationModel: fmt::Debug + Send + Sync {
    fn uid(&self) -> &str;

    /// Registry key under which the model is saved.
    fn class_name(&self) -> &'static str;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Input dimension.
    fn num_features(&self) -> usize;

    fn num_classes(&self) -> usize {
        2
    }

    fn columns(&self) -> ColumnParams;

    /// Score `data`, with `overrides` replacing configured columns for this
    /// call only. Empty output column names disable those outputs.
    fn transform_with(&self, data: &DataFrame, overrides: &ParamMap)
        -> Result<DataFrame, DataError>;

    fn transform(&self, data: &DataFrame) -> Result<DataFrame, DataError> {
        self.transform_with(data, &ParamMap::new())
    }

    fn as_writable(&self) -> Option<&dyn MlWritable> {
        None
    }

    fn clone_box(&self) -> Box<dyn ClassificationModel>;
}

impl Clone for Box<dyn ClassificationModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
