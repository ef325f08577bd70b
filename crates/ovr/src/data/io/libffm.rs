//! LIBFFM data source.
//!
//! The source is configured through a case-insensitive string map:
//!
//! | key           | values             | default  |
//! |---------------|--------------------|----------|
//! | `numFeatures` | positive integer   | inferred |
//! | `numFields`   | positive integer   | unbounded|
//! | `vectorType`  | `sparse`, `dense`  | `sparse` |
//! | `keyType`     | `int`, `long`      | `int`    |
//!
//! Unknown `vectorType`/`keyType` values are rejected when the options are
//! built. Integer options that are not positive numbers are treated as unset.
//!
//! Each data line reads `label field:index:value ...` with 0-based indices.
//! Blank lines and lines starting with `#` are skipped.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::data::{DataError, DataFrame, FeatureVector};

/// Option key for the feature count.
pub const NUM_FEATURES: &str = "numFeatures";
/// Option key for the field count.
pub const NUM_FIELDS: &str = "numFields";
/// Option key for vector density.
pub const VECTOR_TYPE: &str = "vectorType";
/// Option key for key width.
pub const KEY_TYPE: &str = "keyType";

/// Output column holding the labels.
pub const LABEL_COL: &str = "label";
/// Output column holding the feature vectors.
pub const FEATURES_COL: &str = "features";
/// Output column holding the field id of every active feature.
pub const FIELDS_COL: &str = "fields";

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while configuring or reading a LIBFFM source.
#[derive(Debug, thiserror::Error)]
pub enum LibFfmError {
    #[error("invalid value `{value}` for parameter `{key}`, expected one of {expected}")]
    InvalidOption {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: feature index {index} out of range for numFeatures = {num_features}")]
    IndexOutOfRange {
        line: usize,
        index: u64,
        num_features: usize,
    },

    #[error("line {line}: field {field} out of range for numFields = {num_fields}")]
    FieldOutOfRange {
        line: usize,
        field: u64,
        num_fields: usize,
    },

    #[error("line {line}: index {index} does not fit key type {key_type}")]
    KeyOverflow {
        line: usize,
        index: u64,
        key_type: KeyType,
    },

    #[error("line {line}: duplicate feature index {index}")]
    DuplicateIndex { line: usize, index: u64 },

    #[error(transparent)]
    Data(#[from] DataError),
}

// =============================================================================
// CaseInsensitiveMap
// =============================================================================

/// String map whose keys compare ASCII case-insensitively.
///
/// The last insert of a key wins; the spelling of that insert is kept for
/// iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseInsensitiveMap {
    entries: BTreeMap<String, (String, String)>,
}

impl CaseInsensitiveMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        self.entries
            .insert(key.to_ascii_lowercase(), (key, value.into()))
            .map(|(_, old)| old)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as `(key, value)` in the spelling they were inserted with.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CaseInsensitiveMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// =============================================================================
// Option values
// =============================================================================

/// Feature vector density.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VectorType {
    #[default]
    Sparse,
    Dense,
}

impl FromStr for VectorType {
    type Err = LibFfmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sparse" => Ok(Self::Sparse),
            "dense" => Ok(Self::Dense),
            other => Err(LibFfmError::InvalidOption {
                key: VECTOR_TYPE,
                value: other.to_string(),
                expected: "`sparse`, `dense`",
            }),
        }
    }
}

impl fmt::Display for VectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sparse => "sparse",
            Self::Dense => "dense",
        })
    }
}

/// Width of feature keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// 32-bit signed keys.
    #[default]
    Int,
    /// 64-bit signed keys.
    Long,
}

impl KeyType {
    /// Largest key representable at this width.
    pub fn max_key(self) -> u64 {
        match self {
            Self::Int => i32::MAX as u64,
            Self::Long => i64::MAX as u64,
        }
    }
}

impl FromStr for KeyType {
    type Err = LibFfmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "long" => Ok(Self::Long),
            other => Err(LibFfmError::InvalidOption {
                key: KEY_TYPE,
                value: other.to_string(),
                expected: "`int`, `long`",
            }),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
            Self::Long => "long",
        })
    }
}

// =============================================================================
// LibFfmOptions
// =============================================================================

/// Validated LIBFFM source options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibFfmOptions {
    num_features: Option<usize>,
    num_fields: Option<usize>,
    vector_type: VectorType,
    key_type: KeyType,
}

impl LibFfmOptions {
    /// Parse options from a string map.
    ///
    /// # Errors
    ///
    /// [`LibFfmError::InvalidOption`] if `vectorType` or `keyType` holds an
    /// unrecognized value.
    pub fn new(parameters: &CaseInsensitiveMap) -> Result<Self, LibFfmError> {
        let vector_type = match parameters.get(VECTOR_TYPE) {
            Some(v) => v.parse()?,
            None => VectorType::default(),
        };
        let key_type = match parameters.get(KEY_TYPE) {
            Some(v) => v.parse()?,
            None => KeyType::default(),
        };
        Ok(Self {
            num_features: parameters.get(NUM_FEATURES).and_then(parse_positive),
            num_fields: parameters.get(NUM_FIELDS).and_then(parse_positive),
            vector_type,
            key_type,
        })
    }

    /// Parse options from `(key, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, LibFfmError>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::new(&pairs.into_iter().collect())
    }

    #[inline]
    pub fn num_features(&self) -> Option<usize> {
        self.num_features
    }

    #[inline]
    pub fn num_fields(&self) -> Option<usize> {
        self.num_fields
    }

    #[inline]
    pub fn vector_type(&self) -> VectorType {
        self.vector_type
    }

    #[inline]
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    #[inline]
    pub fn is_sparse(&self) -> bool {
        self.vector_type == VectorType::Sparse
    }

    #[inline]
    pub fn is_long_key(&self) -> bool {
        self.key_type == KeyType::Long
    }

    /// Normalized map form. Parsing it again yields equal options.
    pub fn to_map(&self) -> CaseInsensitiveMap {
        let mut map = CaseInsensitiveMap::new();
        if let Some(n) = self.num_features {
            map.insert(NUM_FEATURES, n.to_string());
        }
        if let Some(n) = self.num_fields {
            map.insert(NUM_FIELDS, n.to_string());
        }
        map.insert(VECTOR_TYPE, self.vector_type.to_string());
        map.insert(KEY_TYPE, self.key_type.to_string());
        map
    }
}

/// Positive integer, or `None` for anything else.
fn parse_positive(value: &str) -> Option<usize> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|&n| n > 0)
        .and_then(|n| usize::try_from(n).ok())
}

// =============================================================================
// LibFfmReader
// =============================================================================

/// One parsed data line.
struct Row {
    label: f64,
    /// `(index, field, value)` sorted by index.
    entries: Vec<(usize, f64, f64)>,
}

/// Reads LIBFFM text into a [`DataFrame`].
///
/// The frame has a `label` column, a `features` vector column and a `fields`
/// vector column holding the field id of each feature at the same index.
#[derive(Debug, Clone, Default)]
pub struct LibFfmReader {
    options: LibFfmOptions,
}

impl LibFfmReader {
    pub fn new(options: LibFfmOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LibFfmOptions {
        &self.options
    }

    /// Read a file.
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<DataFrame, LibFfmError> {
        let file = File::open(path)?;
        self.read(BufReader::new(file))
    }

    /// Read every line of `reader`.
    pub fn read(&self, reader: impl BufRead) -> Result<DataFrame, LibFfmError> {
        let mut rows = Vec::new();
        let mut max_index: Option<usize> = None;
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let row = self.parse_line(i + 1, trimmed)?;
            if let Some(&(last, _, _)) = row.entries.last() {
                max_index = Some(max_index.map_or(last, |m| m.max(last)));
            }
            rows.push(row);
        }

        let dim = self
            .options
            .num_features
            .unwrap_or_else(|| max_index.map_or(0, |m| m + 1));
        log::debug!(
            "read {} LIBFFM rows with {} features ({})",
            rows.len(),
            dim,
            self.options.vector_type
        );

        let mut labels = Vec::with_capacity(rows.len());
        let mut features = Vec::with_capacity(rows.len());
        let mut fields = Vec::with_capacity(rows.len());
        for row in rows {
            labels.push(row.label);
            let (feature, field) = self.build_vectors(dim, &row.entries)?;
            features.push(feature);
            fields.push(field);
        }

        let frame = DataFrame::new()
            .with_column(LABEL_COL, labels)?
            .with_column(FEATURES_COL, features)?
            .with_column(FIELDS_COL, fields)?;
        Ok(frame)
    }

    fn parse_line(&self, line: usize, text: &str) -> Result<Row, LibFfmError> {
        let mut tokens = text.split_whitespace();
        let label_token = tokens.next().unwrap_or_default();
        let label = label_token.parse::<f64>().map_err(|_| LibFfmError::Parse {
            line,
            message: format!("invalid label `{label_token}`"),
        })?;

        let mut entries = Vec::new();
        for token in tokens {
            let mut parts = token.splitn(3, ':');
            let (Some(field), Some(index), Some(value)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(LibFfmError::Parse {
                    line,
                    message: format!("expected `field:index:value`, got `{token}`"),
                });
            };
            let malformed = || LibFfmError::Parse {
                line,
                message: format!("malformed token `{token}`"),
            };
            let field = field.parse::<u64>().map_err(|_| malformed())?;
            let index = index.parse::<u64>().map_err(|_| malformed())?;
            let value = value.parse::<f64>().map_err(|_| malformed())?;

            if index > self.options.key_type.max_key() {
                return Err(LibFfmError::KeyOverflow {
                    line,
                    index,
                    key_type: self.options.key_type,
                });
            }
            if let Some(n) = self.options.num_features {
                if index >= n as u64 {
                    return Err(LibFfmError::IndexOutOfRange {
                        line,
                        index,
                        num_features: n,
                    });
                }
            }
            if let Some(n) = self.options.num_fields {
                if field >= n as u64 {
                    return Err(LibFfmError::FieldOutOfRange {
                        line,
                        field,
                        num_fields: n,
                    });
                }
            }
            let index = usize::try_from(index).map_err(|_| LibFfmError::KeyOverflow {
                line,
                index,
                key_type: self.options.key_type,
            })?;
            entries.push((index, field as f64, value));
        }

        entries.sort_by_key(|&(index, _, _)| index);
        if let Some(w) = entries.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(LibFfmError::DuplicateIndex {
                line,
                index: w[0].0 as u64,
            });
        }
        Ok(Row { label, entries })
    }

    fn build_vectors(
        &self,
        dim: usize,
        entries: &[(usize, f64, f64)],
    ) -> Result<(FeatureVector, FeatureVector), DataError> {
        match self.options.vector_type {
            VectorType::Sparse => {
                let indices: Vec<usize> = entries.iter().map(|e| e.0).collect();
                let fields = entries.iter().map(|e| e.1).collect();
                let values = entries.iter().map(|e| e.2).collect();
                Ok((
                    FeatureVector::sparse(dim, indices.clone(), values)?,
                    FeatureVector::sparse(dim, indices, fields)?,
                ))
            }
            VectorType::Dense => {
                let mut values = vec![0.0; dim];
                let mut fields = vec![0.0; dim];
                for &(index, field, value) in entries {
                    values[index] = value;
                    fields[index] = field;
                }
                Ok((FeatureVector::dense(values), FeatureVector::dense(fields)))
            }
        }
    }
}
