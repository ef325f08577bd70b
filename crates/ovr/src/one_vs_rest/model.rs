//! One-vs-Rest model and its scoring fold.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::classification::{ClassificationModel, Classifier};
use crate::data::{
    Attribute, ColumnData, ColumnType, DataError, DataFrame, FeatureVector, StorageLevel,
};
use crate::params::{temp_column_name, ColumnParams, ParamMap};
use crate::utils::argmax;

/// k binary models, one per class, scored together.
///
/// Model `i` separates class `i` from the rest. A row is assigned the class
/// whose model gives the highest positive score; ties go to the lowest class
/// index.
#[derive(Debug, Clone)]
pub struct OneVsRestModel {
    pub(super) uid: String,
    pub(super) parent: Option<String>,
    pub(super) label_metadata: Attribute,
    pub(super) models: Vec<Box<dyn ClassificationModel>>,
    pub(super) columns: ColumnParams,
    pub(super) classifier: Option<Arc<dyn Classifier>>,
}

impl OneVsRestModel {
    /// Registry key of saved models.
    pub const CLASS_NAME: &'static str = "ovr.OneVsRestModel";

    /// Model fitted by the estimator `uid`. `models` is non-empty and in
    /// class order.
    pub(super) fn new(
        uid: String,
        label_metadata: Attribute,
        models: Vec<Box<dyn ClassificationModel>>,
        columns: ColumnParams,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        Self {
            parent: Some(uid.clone()),
            uid,
            label_metadata,
            models,
            columns,
            classifier,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Uid of the estimator that produced this model.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn num_classes(&self) -> usize {
        self.models.len()
    }

    /// Input dimension shared by every sub-model.
    pub fn num_features(&self) -> usize {
        self.models.first().map_or(0, |m| m.num_features())
    }

    /// Sub-models in class order.
    pub fn models(&self) -> &[Box<dyn ClassificationModel>] {
        &self.models
    }

    /// Attribute attached to the prediction column.
    pub fn label_metadata(&self) -> &Attribute {
        &self.label_metadata
    }

    /// The prototype the sub-models were trained from, when known.
    pub fn classifier(&self) -> Option<&Arc<dyn Classifier>> {
        self.classifier.as_ref()
    }

    pub fn columns(&self) -> &ColumnParams {
        &self.columns
    }

    pub fn with_features_col(mut self, col: impl Into<String>) -> Self {
        self.columns.features_col = col.into();
        self
    }

    pub fn with_prediction_col(mut self, col: impl Into<String>) -> Self {
        self.columns.prediction_col = col.into();
        self
    }

    pub fn with_raw_prediction_col(mut self, col: impl Into<String>) -> Self {
        self.columns.raw_prediction_col = col.into();
        self
    }

    /// Copy with the column overrides in `overrides` applied.
    pub fn copy(&self, overrides: &ParamMap) -> Self {
        Self {
            columns: self.columns.with_overrides(overrides),
            ..self.clone()
        }
    }

    // =========================================================================
    // Scoring
    // =========================================================================

    /// Add the prediction column and, if configured, the raw-prediction
    /// column.
    ///
    /// The prediction is the class index as `f64` and carries the label
    /// metadata. The raw prediction is a dense vector of the k positive
    /// scores. With both outputs disabled the input is returned unchanged.
    pub fn transform(&self, data: &DataFrame) -> Result<DataFrame, DataError> {
        let columns = &self.columns;
        if columns.prediction_col.is_empty() && columns.raw_prediction_col.is_empty() {
            log::warn!(
                "[{}] OneVsRestModel.transform() was called as NOOP since no output columns were set.",
                self.uid
            );
            return Ok(data.clone());
        }

        data.require_type(&columns.features_col, ColumnType::Vector)?;
        for col in [&columns.prediction_col, &columns.raw_prediction_col] {
            if !col.is_empty() && data.has_column(col) {
                return Err(DataError::ColumnExists(col.clone()));
            }
        }

        let acc_col = temp_column_name("mbc$acc");
        let mut working = data.with_column(
            &acc_col,
            ColumnData::Scores(vec![BTreeMap::new(); data.n_rows()]),
        )?;

        // Persist the input across the k scoring passes if the caller hasn't.
        let handle_persistence = !data.is_persisted();
        if handle_persistence {
            working.persist(StorageLevel::Memory);
        }
        let folded = self
            .models
            .iter()
            .enumerate()
            .try_fold(working.clone(), |frame, (index, model)| {
                self.accumulate(&frame, &acc_col, index, model.as_ref())
            });
        if handle_persistence {
            working.unpersist();
        }
        let folded = folded?;

        let scores = folded.scores(&acc_col)?;
        let num_classes = self.num_classes();
        let mut out = folded.clone();
        if !columns.raw_prediction_col.is_empty() {
            let dense: Vec<Vec<f64>> = scores
                .iter()
                .map(|row| {
                    let mut dense = vec![0.0; num_classes];
                    for (&index, &score) in row {
                        if index < num_classes {
                            dense[index] = score;
                        }
                    }
                    dense
                })
                .collect();
            let prediction: Vec<f64> = dense
                .iter()
                .map(|v| argmax(v.iter().copied().enumerate()).unwrap_or(0) as f64)
                .collect();
            let raw: Vec<FeatureVector> = dense.into_iter().map(FeatureVector::dense).collect();
            out = out.with_column(&columns.raw_prediction_col, raw)?;
            if !columns.prediction_col.is_empty() {
                out = out.with_column_meta(
                    &columns.prediction_col,
                    prediction,
                    Some(self.label_metadata.clone()),
                )?;
            }
        } else {
            let prediction: Vec<f64> = scores
                .iter()
                .map(|row| argmax(row.iter().map(|(&i, &s)| (i, s))).unwrap_or(0) as f64)
                .collect();
            out = out.with_column_meta(
                &columns.prediction_col,
                prediction,
                Some(self.label_metadata.clone()),
            )?;
        }
        Ok(out.drop(&acc_col))
    }

    /// Score `frame` with sub-model `index` and record its positive score in
    /// the accumulator.
    fn accumulate(
        &self,
        frame: &DataFrame,
        acc_col: &str,
        index: usize,
        model: &dyn ClassificationModel,
    ) -> Result<DataFrame, DataError> {
        let raw_col = temp_column_name("mbc$raw");
        let overrides = ParamMap::new()
            .with_features_col(&self.columns.features_col)
            .with_raw_prediction_col(&raw_col)
            .with_prediction_col("")
            .with_probability_col("");
        let scored = model.transform_with(frame, &overrides)?;
        let raw = scored.vectors(&raw_col)?;

        let updated = frame
            .scores(acc_col)?
            .iter()
            .zip(raw)
            .map(|(acc, raw)| {
                let positive = raw.get(1).ok_or_else(|| DataError::DimensionMismatch {
                    column: raw_col.clone(),
                    expected: 2,
                    got: raw.size(),
                })?;
                let mut acc = acc.clone();
                acc.insert(index, positive);
                Ok(acc)
            })
            .collect::<Result<Vec<_>, DataError>>()?;

        let tmp_col = temp_column_name("mbc$tmp");
        frame
            .with_column(&tmp_col, ColumnData::Scores(updated))?
            .drop(acc_col)
            .with_column_renamed(&tmp_col, acc_col)
    }
}
