//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use ovr::data::{DataError, DataFrame, FeatureVector};
use ovr::params::{ColumnParams, ParamMap};
use ovr::persist::{Metadata, MlWritable, PersistError, Registry};
use ovr::{ClassificationModel, Classifier, TrainError};

/// Rows `(0, [1,0])`, `(1, [0,1])`, `(2, [1,1])`.
pub fn three_class() -> DataFrame {
    DataFrame::new()
        .with_column("label", vec![0.0, 1.0, 2.0])
        .unwrap()
        .with_column(
            "features",
            vec![
                FeatureVector::dense(vec![1.0, 0.0]),
                FeatureVector::dense(vec![0.0, 1.0]),
                FeatureVector::dense(vec![1.0, 1.0]),
            ],
        )
        .unwrap()
}

/// Two noisy rows per class around the unit axes of R^3, stored sparse.
pub fn clustered() -> DataFrame {
    let rows = [
        (0.0, vec![(0, 1.0)]),
        (0.0, vec![(0, 0.9), (1, 0.1)]),
        (1.0, vec![(1, 1.0)]),
        (1.0, vec![(0, 0.1), (1, 0.9)]),
        (2.0, vec![(2, 1.0)]),
        (2.0, vec![(1, 0.1), (2, 0.9)]),
    ];
    let labels: Vec<f64> = rows.iter().map(|(l, _)| *l).collect();
    let features: Vec<FeatureVector> = rows
        .iter()
        .map(|(_, entries)| {
            let (indices, values) = entries.iter().copied().unzip();
            FeatureVector::sparse(3, indices, values).unwrap()
        })
        .collect();
    DataFrame::new()
        .with_column("label", labels)
        .unwrap()
        .with_column("features", features)
        .unwrap()
}

/// Class index encoded in a binary label column name such as `mc2b$3`.
pub fn class_of(label_col: &str) -> usize {
    label_col
        .rsplit('$')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

// =============================================================================
// TableClassifier
// =============================================================================

/// Classifier whose model for class `i` always scores `scores[i]`.
///
/// Records the overrides of every `fit` call. Fails for classes listed in
/// `fail_on`. Persistence is available only when `writable` is set.
#[derive(Debug, Default)]
pub struct TableClassifier {
    pub uid: String,
    pub scores: Vec<f64>,
    pub supports_weights: bool,
    pub writable: bool,
    pub fail_on: Vec<usize>,
    pub seen: Mutex<Vec<ParamMap>>,
}

impl TableClassifier {
    pub const CLASS_NAME: &'static str = "test.TableClassifier";

    pub fn new(scores: Vec<f64>) -> Self {
        Self {
            uid: "table_1".into(),
            scores,
            ..Self::default()
        }
    }

    pub fn writable(mut self) -> Self {
        self.writable = true;
        self
    }

    pub fn seen(&self) -> Vec<ParamMap> {
        let mut seen = self.seen.lock().unwrap().clone();
        seen.sort_by_key(|p| p.label_col.clone());
        seen
    }

    pub fn load(path: &Path, _: &Registry) -> Result<Arc<dyn Classifier>, PersistError> {
        let metadata = Metadata::read_expecting(path, Self::CLASS_NAME)?;
        let scores: Vec<f64> = metadata.extra_field("scores")?;
        Ok(Arc::new(Self {
            uid: metadata.uid,
            scores,
            writable: true,
            ..Self::default()
        }))
    }
}

impl Classifier for TableClassifier {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn columns(&self) -> ColumnParams {
        ColumnParams::default()
    }

    fn fit(
        &self,
        data: &DataFrame,
        overrides: &ParamMap,
    ) -> Result<Box<dyn ClassificationModel>, TrainError> {
        self.seen.lock().unwrap().push(overrides.clone());
        let columns = self.columns().with_overrides(overrides);
        data.doubles(&columns.label_col)?;
        let num_features = data
            .vectors(&columns.features_col)?
            .first()
            .map_or(0, FeatureVector::size);

        let class = class_of(&columns.label_col);
        if self.fail_on.contains(&class) {
            return Err(TrainError::EmptyDataset);
        }
        Ok(Box::new(TableModel {
            uid: format!("tableModel_{class}"),
            score: self.scores.get(class).copied().unwrap_or(0.0),
            num_features,
            writable: self.writable,
        }))
    }

    fn supports_weight_col(&self) -> bool {
        self.supports_weights
    }

    fn as_writable(&self) -> Option<&dyn MlWritable> {
        if self.writable {
            Some(self)
        } else {
            None
        }
    }
}

impl MlWritable for TableClassifier {
    fn write_to(&self, path: &Path) -> Result<(), PersistError> {
        Metadata::new(Self::CLASS_NAME, &self.uid, &(), &())?
            .with_extra("scores", &self.scores)?
            .write(path)
    }
}

/// Model that gives every row the same positive score.
#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    pub uid: String,
    pub score: f64,
    pub num_features: usize,
    pub writable: bool,
}

impl TableModel {
    pub const CLASS_NAME: &'static str = "test.TableModel";

    pub fn load(path: &Path, _: &Registry) -> Result<Box<dyn ClassificationModel>, PersistError> {
        let metadata = Metadata::read_expecting(path, Self::CLASS_NAME)?;
        Ok(Box::new(Self {
            uid: metadata.uid.clone(),
            score: metadata.extra_field("score")?,
            num_features: metadata.extra_field("numFeatures")?,
            writable: true,
        }))
    }
}

impl ClassificationModel for TableModel {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn columns(&self) -> ColumnParams {
        ColumnParams::default()
    }

    fn transform_with(
        &self,
        data: &DataFrame,
        overrides: &ParamMap,
    ) -> Result<DataFrame, DataError> {
        let columns = self.columns().with_overrides(overrides);
        let n = data.vectors(&columns.features_col)?.len();
        let raw = vec![FeatureVector::dense(vec![-self.score, self.score]); n];
        let mut out = data.with_column(&columns.raw_prediction_col, raw)?;
        if !columns.prediction_col.is_empty() {
            let prediction = if self.score > 0.0 { 1.0 } else { 0.0 };
            out = out.with_column(&columns.prediction_col, vec![prediction; n])?;
        }
        Ok(out)
    }

    fn as_writable(&self) -> Option<&dyn MlWritable> {
        if self.writable {
            Some(self)
        } else {
            None
        }
    }

    fn clone_box(&self) -> Box<dyn ClassificationModel> {
        Box::new(self.clone())
    }
}

impl MlWritable for TableModel {
    fn write_to(&self, path: &Path) -> Result<(), PersistError> {
        Metadata::new(Self::CLASS_NAME, &self.uid, &(), &())?
            .with_extra("score", self.score)?
            .with_extra("numFeatures", self.num_features)?
            .write(path)
    }
}

/// Built-in loaders plus the table fixtures.
pub fn test_registry() -> Registry {
    let mut registry = Registry::default();
    registry
        .register_classifier(TableClassifier::CLASS_NAME, TableClassifier::load)
        .register_model(TableModel::CLASS_NAME, TableModel::load);
    registry
}

/// Route `log` output to the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
