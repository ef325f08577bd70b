//! Saving and loading One-vs-Rest stages.
//!
//! ```text
//! <path>/metadata          params, plus labelMetadata and numClasses for models
//! <path>/classifier/...    the prototype classifier
//! <path>/model_<i>/...     sub-model i (models only)
//! ```

use std::path::Path;

use crate::data::Attribute;
use crate::params::ColumnParams;
use crate::persist::{
    require_writable, write_nested, Metadata, MlWritable, PersistError, Registry,
};

use super::{OneVsRest, OneVsRestConfig, OneVsRestModel};

const CLASSIFIER_DIR: &str = "classifier";
const LABEL_METADATA: &str = "labelMetadata";
const NUM_CLASSES: &str = "numClasses";
const PARENT: &str = "parent";

fn model_dir(index: usize) -> String {
    format!("model_{index}")
}

// =============================================================================
// OneVsRest
// =============================================================================

impl MlWritable for OneVsRest {
    fn validate(&self) -> Result<(), PersistError> {
        require_writable(
            self.classifier.as_writable(),
            "classifier",
            self.classifier.uid(),
            self.classifier.type_name(),
        )?
        .validate()
    }

    fn write_to(&self, path: &Path) -> Result<(), PersistError> {
        Metadata::new(
            Self::CLASS_NAME,
            &self.uid,
            &self.config,
            &OneVsRestConfig::default(),
        )?
        .write(path)?;

        let classifier = require_writable(
            self.classifier.as_writable(),
            "classifier",
            self.classifier.uid(),
            self.classifier.type_name(),
        )?;
        write_nested(classifier, &path.join(CLASSIFIER_DIR))
    }
}

impl OneVsRest {
    /// Load an estimator, resolving the classifier with the built-in
    /// registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        Self::load_with(path, &Registry::default())
    }

    /// Load an estimator, resolving the classifier with `registry`.
    pub fn load_with(path: impl AsRef<Path>, registry: &Registry) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let metadata = Metadata::read_expecting(path, Self::CLASS_NAME)?;
        let config: OneVsRestConfig = metadata.params()?;
        config.validate()?;
        let classifier = registry.load_classifier(&path.join(CLASSIFIER_DIR))?;
        Ok(Self {
            uid: metadata.uid,
            classifier,
            config,
        })
    }
}

// =============================================================================
// OneVsRestModel
// =============================================================================

impl MlWritable for OneVsRestModel {
    fn validate(&self) -> Result<(), PersistError> {
        if let Some(classifier) = &self.classifier {
            require_writable(
                classifier.as_writable(),
                "classifier",
                classifier.uid(),
                classifier.type_name(),
            )?
            .validate()?;
        }
        for (index, model) in self.models.iter().enumerate() {
            require_writable(
                model.as_writable(),
                format!("sub-model {index}"),
                model.uid(),
                model.type_name(),
            )?
            .validate()?;
        }
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<(), PersistError> {
        let mut metadata = Metadata::new(
            Self::CLASS_NAME,
            &self.uid,
            &self.columns,
            &ColumnParams::default(),
        )?
        .with_extra(LABEL_METADATA, self.label_metadata.to_json()?)?
        .with_extra(NUM_CLASSES, self.num_classes())?;
        if let Some(parent) = &self.parent {
            metadata = metadata.with_extra(PARENT, parent)?;
        }
        metadata.write(path)?;

        if let Some(classifier) = &self.classifier {
            let writable = require_writable(
                classifier.as_writable(),
                "classifier",
                classifier.uid(),
                classifier.type_name(),
            )?;
            write_nested(writable, &path.join(CLASSIFIER_DIR))?;
        }
        for (index, model) in self.models.iter().enumerate() {
            let writable = require_writable(
                model.as_writable(),
                format!("sub-model {index}"),
                model.uid(),
                model.type_name(),
            )?;
            write_nested(writable, &path.join(model_dir(index)))?;
        }
        Ok(())
    }
}

impl OneVsRestModel {
    /// Load a model, resolving nested stages with the built-in registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        Self::load_with(path, &Registry::default())
    }

    /// Load a model, resolving nested stages with `registry`.
    ///
    /// Sub-models are read from `model_0 .. model_<numClasses - 1>` in order.
    /// The prototype classifier is re-bound when a `classifier` directory is
    /// present.
    pub fn load_with(path: impl AsRef<Path>, registry: &Registry) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let metadata = Metadata::read_expecting(path, Self::CLASS_NAME)?;
        let columns: ColumnParams = metadata.params()?;
        let num_classes: usize = metadata.extra_field(NUM_CLASSES)?;
        let label_json: String = metadata.extra_field(LABEL_METADATA)?;
        let label_metadata = Attribute::from_json(&label_json)?;
        let parent: Option<String> = metadata.extra_field_opt(PARENT)?;
        if num_classes == 0 {
            return Err(PersistError::Validation(format!(
                "model {} declares no classes",
                metadata.uid
            )));
        }

        let classifier_path = path.join(CLASSIFIER_DIR);
        let classifier = if classifier_path.is_dir() {
            Some(registry.load_classifier(&classifier_path)?)
        } else {
            None
        };

        let models = (0..num_classes)
            .map(|index| registry.load_model(&path.join(model_dir(index))))
            .collect::<Result<Vec<_>, _>>()?;
        let num_features = models[0].num_features();
        if let Some((index, model)) = models
            .iter()
            .enumerate()
            .find(|(_, m)| m.num_features() != num_features)
        {
            return Err(PersistError::Validation(format!(
                "sub-model {index} has {} features, sub-model 0 has {num_features}",
                model.num_features()
            )));
        }

        log::debug!(
            "loaded {} with {num_classes} sub-models from {}",
            metadata.uid,
            path.display()
        );
        Ok(Self {
            uid: metadata.uid,
            parent,
            label_metadata,
            models,
            columns,
            classifier,
        })
    }
}
