//! One-vs-Rest reduction of multiclass classification to binary problems.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use ovr::classification::LogisticRegression;
//! use ovr::data::{DataFrame, FeatureVector};
//! use ovr::{OneVsRest, OneVsRestConfig};
//!
//! let data = DataFrame::new()
//!     .with_column("label", vec![0.0, 1.0, 2.0])?
//!     .with_column(
//!         "features",
//!         vec![
//!             FeatureVector::dense(vec![1.0, 0.0]),
//!             FeatureVector::dense(vec![0.0, 1.0]),
//!             FeatureVector::dense(vec![1.0, 1.0]),
//!         ],
//!     )?;
//!
//! let ovr = OneVsRest::new(Arc::new(LogisticRegression::default()), OneVsRestConfig::default());
//! let model = ovr.fit(&data)?;
//! assert_eq!(model.num_classes(), 3);
//!
//! let scored = model.transform(&data)?;
//! assert_eq!(scored.doubles("prediction")?.to_vec(), vec![0.0, 1.0, 2.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod estimator;
mod model;
mod persist;

pub use config::{OneVsRestConfig, OneVsRestConfigBuilder};
pub use estimator::OneVsRest;
pub use model::OneVsRestModel;
