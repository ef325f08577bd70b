//! Binary payloads for model coefficients.
//!
//! Payloads are postcard-encoded behind a 4-byte magic header. New layouts
//! add variants to [`Payload`] rather than modifying existing ones, so an
//! older reader fails on the discriminant instead of misreading data.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::PersistError;

/// Header written before every payload.
pub const MAGIC: [u8; 4] = *b"OVRP";

// ============================================================================
// Top-Level Payload
// ============================================================================

/// Version-tagged payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    V1(PayloadV1),
}

/// Version 1 payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadV1 {
    /// Number of input features.
    pub num_features: u32,
    pub model: ModelPayload,
}

/// Model-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelPayload {
    /// Binary linear model.
    Linear(LinearPayload),
}

/// Coefficients and intercept of a linear model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPayload {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Payload {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistError> {
        let body = postcard::to_allocvec(self)?;
        let mut bytes = Vec::with_capacity(MAGIC.len() + body.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistError> {
        let body = bytes
            .strip_prefix(&MAGIC[..])
            .ok_or_else(|| PersistError::Validation("payload has no magic header".into()))?;
        Ok(postcard::from_bytes(body)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), PersistError> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, PersistError> {
        Self::from_bytes(&fs::read(path)?)
    }
}
