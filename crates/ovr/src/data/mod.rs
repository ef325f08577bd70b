//! Data layer: feature vectors, column attributes and the in-memory frame.
//!
//! - [`FeatureVector`]: dense ([`ndarray::Array1`]) or sparse vectors
//! - [`Attribute`]: label metadata carried by frame columns
//! - [`DataFrame`]: immutable column-oriented table shared across threads
//! - [`io`]: readers for external formats (LIBFFM)

mod attribute;
mod error;
mod frame;
pub mod io;
mod vector;

pub use attribute::Attribute;
pub use error::DataError;
pub use frame::{ColumnData, ColumnType, DataFrame, Field, StorageLevel};
pub use vector::{FeatureVector, SparseVector};
