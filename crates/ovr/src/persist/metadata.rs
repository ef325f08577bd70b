//! The `metadata` file written at the root of every saved stage.
//!
//! ```json
//! {"class":"ovr.OneVsRestModel","timestamp":1700000000000,"crateVersion":"0.1.0",
//!  "uid":"oneVsRest_3f2a9c0d1e4b","paramMap":{...},"defaultParamMap":{...},
//!  "labelMetadata":"...","numClasses":3}
//! ```
//!
//! Keys other than the fixed ones are stage-specific extras.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PersistError;

/// File name of the metadata file inside a stage directory.
pub const METADATA_FILE: &str = "metadata";

/// Stage metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Registry key of the saved stage.
    pub class: String,
    /// Milliseconds since the Unix epoch at save time.
    pub timestamp: u64,
    pub crate_version: String,
    pub uid: String,
    /// Explicitly set parameters.
    pub param_map: Value,
    /// Default parameters of the stage type.
    pub default_param_map: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    /// Metadata for a stage whose params are `params`, with `defaults` as
    /// the defaults of its type.
    pub fn new<P: Serialize>(
        class: &str,
        uid: &str,
        params: &P,
        defaults: &P,
    ) -> Result<Self, PersistError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        Ok(Self {
            class: class.to_string(),
            timestamp,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            uid: uid.to_string(),
            param_map: serde_json::to_value(params)?,
            default_param_map: serde_json::to_value(defaults)?,
            extra: Map::new(),
        })
    }

    /// Attach a stage-specific extra field.
    pub fn with_extra(mut self, key: &str, value: impl Serialize) -> Result<Self, PersistError> {
        self.extra
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Read a required extra field.
    pub fn extra_field<T: DeserializeOwned>(&self, key: &str) -> Result<T, PersistError> {
        let value = self.extra.get(key).ok_or_else(|| {
            PersistError::Validation(format!("metadata of {} has no `{key}` field", self.uid))
        })?;
        Ok(T::deserialize(value)?)
    }

    /// Read an optional extra field.
    pub fn extra_field_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistError> {
        match self.extra.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(T::deserialize(value)?)),
        }
    }

    /// Parameters with defaults filled in: `defaultParamMap` overlaid by
    /// `paramMap`.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, PersistError> {
        let mut merged = match &self.default_param_map {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(PersistError::Validation(format!(
                    "defaultParamMap must be an object, got {other}"
                )))
            }
        };
        match &self.param_map {
            Value::Object(map) => {
                merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Value::Null => {}
            other => {
                return Err(PersistError::Validation(format!(
                    "paramMap must be an object, got {other}"
                )))
            }
        }
        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    /// Write `<dir>/metadata`.
    pub fn write(&self, dir: &Path) -> Result<(), PersistError> {
        fs::write(dir.join(METADATA_FILE), serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Read `<dir>/metadata`.
    pub fn read(dir: &Path) -> Result<Self, PersistError> {
        let file = dir.join(METADATA_FILE);
        if !file.is_file() {
            return Err(PersistError::MissingMetadata(dir.to_path_buf()));
        }
        Ok(serde_json::from_str(&fs::read_to_string(file)?)?)
    }

    /// Read `<dir>/metadata` and check that it was written by `class`.
    pub fn read_expecting(dir: &Path, class: &str) -> Result<Self, PersistError> {
        let metadata = Self::read(dir)?;
        if metadata.class != class {
            return Err(PersistError::ClassMismatch {
                expected: class.to_string(),
                found: metadata.class,
            });
        }
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ColumnParams;

    #[test]
    fn params_overlay_defaults() {
        let mut metadata = Metadata::new(
            "test.Stage",
            "stage_1",
            &ColumnParams::default(),
            &ColumnParams::default(),
        )
        .unwrap();
        metadata.param_map = serde_json::json!({ "predictionCol": "pred" });

        let params: ColumnParams = metadata.params().unwrap();
        assert_eq!(params.prediction_col, "pred");
        assert_eq!(params.features_col, "features");
    }

    #[test]
    fn extras_are_flattened() {
        let metadata = Metadata::new("test.Stage", "stage_1", &(), &())
            .unwrap()
            .with_extra("numClasses", 3)
            .unwrap();
        let json: Value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["numClasses"], 3);
        assert_eq!(json["class"], "test.Stage");
        assert!(json.get("crateVersion").is_some());

        let back: Metadata = serde_json::from_value(json).unwrap();
        assert_eq!(back.extra_field::<usize>("numClasses").unwrap(), 3);
        assert_eq!(back.extra_field_opt::<String>("parent").unwrap(), None);
        assert!(back.extra_field::<usize>("missing").is_err());
    }

    #[test]
    fn read_checks_class() {
        let dir = tempfile::tempdir().unwrap();
        Metadata::new("test.A", "a_1", &(), &())
            .unwrap()
            .write(dir.path())
            .unwrap();

        assert_eq!(Metadata::read(dir.path()).unwrap().uid, "a_1");
        assert!(matches!(
            Metadata::read_expecting(dir.path(), "test.B"),
            Err(PersistError::ClassMismatch { .. })
        ));
        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            Metadata::read(empty.path()),
            Err(PersistError::MissingMetadata(_))
        ));
    }
}
