//! Column attribute metadata.
//!
//! Attributes describe what a numeric column means. Label columns carry a
//! nominal or binary attribute that records the class count; prediction
//! columns inherit the label attribute so downstream stages can map indices
//! back to class names.

use serde::{Deserialize, Serialize};

/// Attribute attached to a frame column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attribute {
    /// Categorical values `0..num_values`.
    Nominal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        num_values: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        values: Option<Vec<String>>,
    },
    /// Two-valued column.
    Binary {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        values: Option<Vec<String>>,
    },
    /// Continuous values.
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Nothing is known about the column.
    Unresolved,
}

impl Attribute {
    /// Nominal attribute with a name and a value count.
    pub fn nominal(name: impl Into<String>, num_values: usize) -> Self {
        Self::Nominal {
            name: Some(name.into()),
            num_values: Some(num_values),
            values: None,
        }
    }

    /// Binary attribute with a name.
    pub fn binary(name: impl Into<String>) -> Self {
        Self::Binary {
            name: Some(name.into()),
            values: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Nominal { name, .. } | Self::Binary { name, .. } | Self::Numeric { name } => {
                name.as_deref()
            }
            Self::Unresolved => None,
        }
    }

    /// Number of classes this attribute declares, if any.
    ///
    /// Binary attributes declare 2; nominal attributes declare their value
    /// count, falling back to the number of named values.
    pub fn num_classes(&self) -> Option<usize> {
        match self {
            Self::Binary { .. } => Some(2),
            Self::Nominal {
                num_values, values, ..
            } => num_values.or_else(|| values.as_ref().map(Vec::len)),
            Self::Numeric { .. } | Self::Unresolved => None,
        }
    }

    /// Returns `true` for nominal and binary attributes.
    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::Nominal { .. } | Self::Binary { .. })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
