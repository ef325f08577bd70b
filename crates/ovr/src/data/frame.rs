//! In-memory column-oriented frame.
//!
//! [`DataFrame`] is the tabular collaborator the classifiers work against:
//! named columns of equal length, optional per-column [`Attribute`]s, and a
//! persistence flag that records whether the caller asked for the frame to be
//! kept materialized.
//!
//! Frames are immutable values. Deriving a frame (`select`, `with_column`,
//! `drop`, ...) returns a new frame sharing the untouched columns through
//! [`Arc`], so projections handed to worker threads are cheap and read-only.

use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::Array1;

use super::attribute::Attribute;
use super::error::DataError;
use super::vector::FeatureVector;

// =============================================================================
// Column data
// =============================================================================

/// Column type, without the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Double,
    Vector,
    Scores,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Vector => "vector",
            Self::Scores => "map<int,double>",
        }
    }
}

/// Column values.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// One `f64` per row.
    Double(Array1<f64>),
    /// One feature vector per row.
    Vector(Vec<FeatureVector>),
    /// One `index -> score` map per row.
    Scores(Vec<BTreeMap<usize, f64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Double(v) => v.len(),
            Self::Vector(v) => v.len(),
            Self::Scores(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Double(_) => ColumnType::Double,
            Self::Vector(_) => ColumnType::Vector,
            Self::Scores(_) => ColumnType::Scores,
        }
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(values: Vec<f64>) -> Self {
        Self::Double(Array1::from(values))
    }
}

impl From<Array1<f64>> for ColumnData {
    fn from(values: Array1<f64>) -> Self {
        Self::Double(values)
    }
}

impl From<Vec<FeatureVector>> for ColumnData {
    fn from(values: Vec<FeatureVector>) -> Self {
        Self::Vector(values)
    }
}

/// A named column with optional attribute metadata.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    data: Arc<ColumnData>,
    metadata: Option<Attribute>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn metadata(&self) -> Option<&Attribute> {
        self.metadata.as_ref()
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }
}

// =============================================================================
// DataFrame
// =============================================================================

/// Persistence level of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageLevel {
    /// Not persisted; derived data is recomputed by whoever needs it.
    #[default]
    None,
    /// Kept materialized in memory until unpersisted.
    Memory,
}

/// Column-oriented table of equal-length columns.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    fields: Vec<Field>,
    n_rows: usize,
    storage_level: StorageLevel,
}

impl DataFrame {
    /// An empty frame with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn field(&self, name: &str) -> Result<&Field, DataError> {
        self.position(name)
            .map(|i| &self.fields[i])
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&ColumnData, DataError> {
        self.field(name).map(Field::data)
    }

    pub fn column_type(&self, name: &str) -> Result<ColumnType, DataError> {
        self.field(name).map(Field::column_type)
    }

    /// Attribute attached to a column, if any.
    pub fn metadata(&self, name: &str) -> Result<Option<&Attribute>, DataError> {
        self.field(name).map(Field::metadata)
    }

    /// Fail unless `name` exists and has type `expected`.
    pub fn require_type(&self, name: &str, expected: ColumnType) -> Result<(), DataError> {
        let got = self.column_type(name)?;
        if got == expected {
            Ok(())
        } else {
            Err(DataError::TypeMismatch {
                column: name.to_string(),
                expected: expected.name(),
                got: got.name(),
            })
        }
    }

    pub fn doubles(&self, name: &str) -> Result<&Array1<f64>, DataError> {
        match self.column(name)? {
            ColumnData::Double(v) => Ok(v),
            other => Err(self.mismatch(name, ColumnType::Double, other)),
        }
    }

    pub fn vectors(&self, name: &str) -> Result<&[FeatureVector], DataError> {
        match self.column(name)? {
            ColumnData::Vector(v) => Ok(v),
            other => Err(self.mismatch(name, ColumnType::Vector, other)),
        }
    }

    pub fn scores(&self, name: &str) -> Result<&[BTreeMap<usize, f64>], DataError> {
        match self.column(name)? {
            ColumnData::Scores(v) => Ok(v),
            other => Err(self.mismatch(name, ColumnType::Scores, other)),
        }
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    /// Add or replace a column.
    pub fn with_column(
        &self,
        name: &str,
        data: impl Into<ColumnData>,
    ) -> Result<Self, DataError> {
        self.with_column_meta(name, data, None)
    }

    /// Add or replace a column, attaching `metadata`.
    ///
    /// The first column of an empty frame fixes the row count; later columns
    /// must match it.
    pub fn with_column_meta(
        &self,
        name: &str,
        data: impl Into<ColumnData>,
        metadata: Option<Attribute>,
    ) -> Result<Self, DataError> {
        let data = data.into();
        let replacing = self.position(name);
        let sole_column = self.fields.is_empty()
            || (self.fields.len() == 1 && replacing.is_some());
        if !sole_column && data.len() != self.n_rows {
            return Err(DataError::LengthMismatch {
                column: name.to_string(),
                expected: self.n_rows,
                got: data.len(),
            });
        }

        let n_rows = data.len();
        let field = Field {
            name: name.to_string(),
            data: Arc::new(data),
            metadata,
        };
        let mut fields = self.fields.clone();
        match replacing {
            Some(i) => fields[i] = field,
            None => fields.push(field),
        }
        Ok(Self {
            fields,
            n_rows,
            storage_level: StorageLevel::None,
        })
    }

    /// Keep only `names`, in the given order.
    pub fn select(&self, names: &[&str]) -> Result<Self, DataError> {
        let fields = names
            .iter()
            .map(|name| self.field(name).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let n_rows = if fields.is_empty() { 0 } else { self.n_rows };
        Ok(Self {
            fields,
            n_rows,
            storage_level: StorageLevel::None,
        })
    }

    /// Remove a column. Dropping a missing column is a no-op.
    pub fn drop(&self, name: &str) -> Self {
        let fields: Vec<Field> = self
            .fields
            .iter()
            .filter(|f| f.name != name)
            .cloned()
            .collect();
        let n_rows = if fields.is_empty() { 0 } else { self.n_rows };
        Self {
            fields,
            n_rows,
            storage_level: StorageLevel::None,
        }
    }

    /// Rename a column, keeping its data and metadata.
    pub fn with_column_renamed(&self, from: &str, to: &str) -> Result<Self, DataError> {
        let index = self
            .position(from)
            .ok_or_else(|| DataError::MissingColumn(from.to_string()))?;
        if from != to && self.has_column(to) {
            return Err(DataError::ColumnExists(to.to_string()));
        }
        let mut out = Self {
            fields: self.fields.clone(),
            n_rows: self.n_rows,
            storage_level: StorageLevel::None,
        };
        out.fields[index].name = to.to_string();
        Ok(out)
    }

    /// Apply `f` to every value of a double column.
    pub fn map_doubles(
        &self,
        name: &str,
        f: impl Fn(f64) -> f64,
    ) -> Result<Array1<f64>, DataError> {
        Ok(self.doubles(name)?.mapv(f))
    }

    // =========================================================================
    // Aggregation
    // =========================================================================

    /// Maximum of a double column. NaN values are skipped.
    pub fn max(&self, name: &str) -> Result<f64, DataError> {
        self.doubles(name)?
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
            .ok_or_else(|| DataError::EmptyAggregate(name.to_string()))
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    pub fn storage_level(&self) -> StorageLevel {
        self.storage_level
    }

    pub fn is_persisted(&self) -> bool {
        self.storage_level != StorageLevel::None
    }

    /// Mark the frame as persisted at `level`.
    pub fn persist(&mut self, level: StorageLevel) -> &mut Self {
        log::debug!(
            "persisting frame ({} rows, {} columns) at {:?}",
            self.n_rows,
            self.fields.len(),
            level
        );
        self.storage_level = level;
        self
    }

    /// Release a persisted frame.
    pub fn unpersist(&mut self) -> &mut Self {
        if self.is_persisted() {
            log::debug!("unpersisting frame ({} rows)", self.n_rows);
        }
        self.storage_level = StorageLevel::None;
        self
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    fn mismatch(&self, name: &str, expected: ColumnType, got: &ColumnData) -> DataError {
        DataError::TypeMismatch {
            column: name.to_string(),
            expected: expected.name(),
            got: got.column_type().name(),
        }
    }
}
