//! Directory-based persistence.
//!
//! A saved stage is a directory holding a JSON [`Metadata`] file plus
//! whatever the stage writes next to it: nested stage directories
//! (`classifier`, `model_<i>`) or binary [`Payload`] files.
//!
//! Loading goes through a [`Registry`] that maps the `class` recorded in the
//! metadata to a loader function.

mod error;
mod metadata;
pub mod payload;
mod registry;

use std::fs;
use std::path::Path;

pub use error::PersistError;
pub use metadata::{Metadata, METADATA_FILE};
pub use payload::{LinearPayload, ModelPayload, Payload, PayloadV1};
pub use registry::{ClassifierLoader, ModelLoader, Registry};

/// A stage that can write itself to a directory.
pub trait MlWritable {
    /// Check that the stage and everything it nests can be written.
    ///
    /// Runs before any file is created.
    fn validate(&self) -> Result<(), PersistError> {
        Ok(())
    }

    /// Write the stage into `path`, which exists and is empty.
    fn write_to(&self, path: &Path) -> Result<(), PersistError>;

    /// Save to a new directory. Fails if `path` exists.
    fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError>
    where
        Self: Sized,
    {
        self.save_with(path, false)
    }

    /// Save to `path`, replacing it when `overwrite` is set.
    fn save_with(&self, path: impl AsRef<Path>, overwrite: bool) -> Result<(), PersistError>
    where
        Self: Sized,
    {
        let path = path.as_ref();
        self.validate()?;
        prepare_dir(path, overwrite)?;
        log::debug!("saving stage to {}", path.display());
        self.write_to(path)
    }
}

/// Create `path` as an empty directory.
pub fn prepare_dir(path: &Path, overwrite: bool) -> Result<(), PersistError> {
    if path.exists() {
        if !overwrite {
            return Err(PersistError::PathExists(path.to_path_buf()));
        }
        if path.is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Write a nested stage into its own sub-directory.
pub fn write_nested(stage: &dyn MlWritable, path: &Path) -> Result<(), PersistError> {
    fs::create_dir_all(path)?;
    stage.write_to(path)
}

/// Unwrap a writable capability or report which component lacks it.
pub fn require_writable<'a>(
    writable: Option<&'a dyn MlWritable>,
    component: impl Into<String>,
    uid: &str,
    type_name: &'static str,
) -> Result<&'a dyn MlWritable, PersistError> {
    writable.ok_or_else(|| PersistError::Unsupported {
        component: component.into(),
        uid: uid.to_string(),
        type_name,
    })
}
