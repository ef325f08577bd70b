//! Dense and sparse feature vectors.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::error::DataError;

/// Sparse vector: logical size plus strictly increasing active indices.
///
/// Deserialization goes through [`SparseVector::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SparseParts")]
pub struct SparseVector {
    size: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

/// Unchecked serialized form of a [`SparseVector`].
#[derive(Deserialize)]
struct SparseParts {
    size: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl TryFrom<SparseParts> for SparseVector {
    type Error = DataError;

    fn try_from(parts: SparseParts) -> Result<Self, Self::Error> {
        Self::new(parts.size, parts.indices, parts.values)
    }
}

impl SparseVector {
    /// Create a sparse vector.
    ///
    /// # Errors
    ///
    /// Fails if `indices` and `values` differ in length, if indices are not
    /// strictly increasing, or if an index is `>= size`.
    pub fn new(size: usize, indices: Vec<usize>, values: Vec<f64>) -> Result<Self, DataError> {
        if indices.len() != values.len() {
            return Err(DataError::InvalidSparseVector(format!(
                "{} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        if let Some(w) = indices.windows(2).find(|w| w[0] >= w[1]) {
            return Err(DataError::InvalidSparseVector(format!(
                "indices must be strictly increasing, found {} before {}",
                w[0], w[1]
            )));
        }
        if let Some(&last) = indices.last() {
            if last >= size {
                return Err(DataError::InvalidSparseVector(format!(
                    "index {last} out of bounds for size {size}"
                )));
            }
        }
        Ok(Self {
            size,
            indices,
            values,
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `index`; inactive entries read as 0.0.
    pub fn get(&self, index: usize) -> Option<f64> {
        if index >= self.size {
            return None;
        }
        Some(
            self.indices
                .binary_search(&index)
                .map_or(0.0, |pos| self.values[pos]),
        )
    }
}

/// A feature vector, dense or sparse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureVector {
    Dense(Array1<f64>),
    Sparse(SparseVector),
}

impl FeatureVector {
    /// Dense vector from values.
    pub fn dense(values: Vec<f64>) -> Self {
        Self::Dense(Array1::from(values))
    }

    /// Sparse vector; see [`SparseVector::new`] for the checks applied.
    pub fn sparse(size: usize, indices: Vec<usize>, values: Vec<f64>) -> Result<Self, DataError> {
        SparseVector::new(size, indices, values).map(Self::Sparse)
    }

    /// Logical dimension.
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            Self::Dense(v) => v.len(),
            Self::Sparse(v) => v.size(),
        }
    }

    /// Value at `index`, or `None` when out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            Self::Dense(v) => v.get(index).copied(),
            Self::Sparse(v) => v.get(index),
        }
    }

    /// Visit every stored entry as `(index, value)`.
    ///
    /// Dense vectors visit all entries; sparse vectors only active ones.
    pub fn for_each_active(&self, mut f: impl FnMut(usize, f64)) {
        match self {
            Self::Dense(v) => v.iter().enumerate().for_each(|(i, &x)| f(i, x)),
            Self::Sparse(v) => v
                .indices
                .iter()
                .zip(&v.values)
                .for_each(|(&i, &x)| f(i, x)),
        }
    }

    /// Dot product with a weight vector of the same dimension.
    pub fn dot(&self, weights: ArrayView1<'_, f64>) -> f64 {
        debug_assert_eq!(self.size(), weights.len());
        match self {
            Self::Dense(v) => v.dot(&weights),
            Self::Sparse(v) => v
                .indices
                .iter()
                .zip(&v.values)
                .map(|(&i, &x)| weights[i] * x)
                .sum(),
        }
    }

    /// Number of stored entries.
    pub fn num_active(&self) -> usize {
        match self {
            Self::Dense(v) => v.len(),
            Self::Sparse(v) => v.indices.len(),
        }
    }

    pub fn to_dense(&self) -> Array1<f64> {
        match self {
            Self::Dense(v) => v.clone(),
            Self::Sparse(v) => {
                let mut out = Array1::zeros(v.size);
                for (&i, &x) in v.indices.iter().zip(&v.values) {
                    out[i] = x;
                }
                out
            }
        }
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self::dense(values)
    }
}

impl From<Array1<f64>> for FeatureVector {
    fn from(values: Array1<f64>) -> Self {
        Self::Dense(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sparse_rejects_unsorted_indices() {
        let err = SparseVector::new(4, vec![2, 1], vec![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, DataError::InvalidSparseVector(_)));
    }

    #[test]
    fn sparse_rejects_out_of_bounds() {
        assert!(SparseVector::new(2, vec![0, 2], vec![1.0, 1.0]).is_err());
        assert!(SparseVector::new(2, vec![0], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn sparse_get_reads_zero_for_inactive() {
        let v = FeatureVector::sparse(5, vec![1, 3], vec![2.0, 4.0]).unwrap();
        assert_eq!(v.get(0), Some(0.0));
        assert_eq!(v.get(3), Some(4.0));
        assert_eq!(v.get(5), None);
        assert_eq!(v.num_active(), 2);
    }

    #[test]
    fn dot_matches_between_layouts() {
        let weights = array![0.5, -1.0, 2.0];
        let dense = FeatureVector::dense(vec![1.0, 0.0, 3.0]);
        let sparse = FeatureVector::sparse(3, vec![0, 2], vec![1.0, 3.0]).unwrap();
        assert_eq!(dense.dot(weights.view()), 6.5);
        assert_eq!(sparse.dot(weights.view()), 6.5);
        assert_eq!(sparse.to_dense(), dense.to_dense());
    }

    #[test]
    fn for_each_active_visits_stored_entries() {
        let sparse = FeatureVector::sparse(10, vec![4, 7], vec![1.5, -2.0]).unwrap();
        let mut seen = Vec::new();
        sparse.for_each_active(|i, x| seen.push((i, x)));
        assert_eq!(seen, vec![(4, 1.5), (7, -2.0)]);
    }

    #[test]
    fn deserialize_applies_sparse_checks() {
        let good = FeatureVector::sparse(3, vec![0, 2], vec![1.0, 3.0]).unwrap();
        let json = serde_json::to_string(&good).unwrap();
        assert_eq!(serde_json::from_str::<FeatureVector>(&json).unwrap(), good);

        for bad in [
            r#"{"Sparse":{"size":2,"indices":[0,5],"values":[1.0,1.0]}}"#,
            r#"{"Sparse":{"size":4,"indices":[2,1],"values":[1.0,1.0]}}"#,
            r#"{"Sparse":{"size":4,"indices":[1],"values":[1.0,2.0]}}"#,
        ] {
            assert!(serde_json::from_str::<FeatureVector>(bad).is_err(), "{bad}");
        }
    }
}
