//! Data source readers.
//!
//! - [`libffm`]: LIBFFM text format (`label field:index:value ...`) and its
//!   string-keyed options.

pub mod libffm;

pub use libffm::{
    CaseInsensitiveMap, KeyType, LibFfmError, LibFfmOptions, LibFfmReader, VectorType,
    FEATURES_COL, FIELDS_COL, LABEL_COL,
};
