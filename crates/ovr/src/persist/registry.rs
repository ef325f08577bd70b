//! Class-name keyed loaders.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::{Metadata, PersistError};
use crate::classification::{
    ClassificationModel, Classifier, LogisticRegression, LogisticRegressionModel,
};

/// Loads a saved classifier from its directory.
pub type ClassifierLoader = fn(&Path, &Registry) -> Result<Arc<dyn Classifier>, PersistError>;

/// Loads a saved binary model from its directory.
pub type ModelLoader = fn(&Path, &Registry) -> Result<Box<dyn ClassificationModel>, PersistError>;

/// Maps the `class` recorded in stage metadata to a loader.
///
/// [`Registry::default`] knows the built-in stages. Register loaders for
/// custom classifiers before loading anything that nests them.
#[derive(Clone)]
pub struct Registry {
    classifiers: HashMap<String, ClassifierLoader>,
    models: HashMap<String, ModelLoader>,
}

impl Registry {
    /// A registry with no loaders.
    pub fn empty() -> Self {
        Self {
            classifiers: HashMap::new(),
            models: HashMap::new(),
        }
    }

    pub fn register_classifier(&mut self, class: impl Into<String>, loader: ClassifierLoader) -> &mut Self {
        self.classifiers.insert(class.into(), loader);
        self
    }

    pub fn register_model(&mut self, class: impl Into<String>, loader: ModelLoader) -> &mut Self {
        self.models.insert(class.into(), loader);
        self
    }

    pub fn knows_classifier(&self, class: &str) -> bool {
        self.classifiers.contains_key(class)
    }

    pub fn knows_model(&self, class: &str) -> bool {
        self.models.contains_key(class)
    }

    /// Load the classifier saved in `path`.
    pub fn load_classifier(&self, path: &Path) -> Result<Arc<dyn Classifier>, PersistError> {
        let metadata = Metadata::read(path)?;
        let loader = self
            .classifiers
            .get(&metadata.class)
            .ok_or(PersistError::UnknownClass(metadata.class))?;
        loader(path, self)
    }

    /// Load the binary model saved in `path`.
    pub fn load_model(&self, path: &Path) -> Result<Box<dyn ClassificationModel>, PersistError> {
        let metadata = Metadata::read(path)?;
        let loader = self
            .models
            .get(&metadata.class)
            .ok_or(PersistError::UnknownClass(metadata.class))?;
        loader(path, self)
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register_classifier(LogisticRegression::CLASS_NAME, load_logistic_regression)
            .register_model(
                LogisticRegressionModel::CLASS_NAME,
                load_logistic_regression_model,
            );
        registry
    }
}

fn load_logistic_regression(
    path: &Path,
    _: &Registry,
) -> Result<Arc<dyn Classifier>, PersistError> {
    Ok(Arc::new(LogisticRegression::load(path)?))
}

fn load_logistic_regression_model(
    path: &Path,
    _: &Registry,
) -> Result<Box<dyn ClassificationModel>, PersistError> {
    Ok(Box::new(LogisticRegressionModel::load(path)?))
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classifiers: Vec<_> = self.classifiers.keys().collect();
        let mut models: Vec<_> = self.models.keys().collect();
        classifiers.sort();
        models.sort();
        f.debug_struct("Registry")
            .field("classifiers", &classifiers)
            .field("models", &models)
            .finish()
    }
}
