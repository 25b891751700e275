//! Versioned feature schema for the fused clinical feature vector.
//!
//! The ordering below is the single most safety-critical invariant in the
//! pipeline: it must match the column order the classifiers were trained on
//! exactly. A divergence produces wrong predictions with no error signal,
//! which is why the schema identifier travels with both the trained model
//! artifacts and every assembled vector, and why a mismatch is rejected
//! instead of inferred around.

use serde::{Deserialize, Serialize};

use crate::error::TriageError;

/// Structured feature names, in training column order. Positions 0–5 of every
/// feature vector.
pub const STRUCTURED_FEATURES: &[&str] = &[
    "Age",
    "Gender",
    "Blood_Pressure",
    "Heart_Rate",
    "Temperature",
    "Pre_Existing_Conditions",
];

/// Name prefix for raw embedding dimensions. Features carrying this prefix
/// participate in prediction and attribution arithmetic but are never shown
/// in a human-facing explanation.
pub const EMBEDDING_FEATURE_PREFIX: &str = "symptom_emb_";

/// Versioned description of the fused feature vector layout.
///
/// `F = 6 + E`: six structured fields followed by the symptom embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    id: String,
    embedding_dim: usize,
}

impl FeatureSchema {
    /// The v1 layout for a given embedding dimensionality.
    pub fn v1(embedding_dim: usize) -> Self {
        Self {
            id: format!("triage.features.v1+e{embedding_dim}"),
            embedding_dim,
        }
    }

    /// Schema identifier, recorded in model artifacts at training time.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Embedding dimensionality `E`.
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Total vector length `F = 6 + E`.
    pub fn len(&self) -> usize {
        STRUCTURED_FEATURES.len() + self.embedding_dim
    }

    /// Canonical ordered feature names: the six structured fields, then one
    /// `symptom_emb_{i}` name per embedding dimension.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = STRUCTURED_FEATURES.iter().map(|s| s.to_string()).collect();
        names.extend((0..self.embedding_dim).map(|i| format!("{EMBEDDING_FEATURE_PREFIX}{i}")));
        names
    }

    /// Whether a feature name denotes a raw embedding dimension.
    pub fn is_embedding_feature(name: &str) -> bool {
        name.starts_with(EMBEDDING_FEATURE_PREFIX)
    }
}

/// An assembled, ordered feature vector tagged with its schema identifier.
///
/// Shared read-only by both classifiers and the attribution engine for the
/// duration of one inference call.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema_id: String,
    values: Vec<f32>,
}

impl FeatureVector {
    /// Wrap assembled values, checking length against the schema.
    pub fn new(schema: &FeatureSchema, values: Vec<f32>) -> Result<Self, TriageError> {
        if values.len() != schema.len() {
            return Err(TriageError::DimensionMismatch {
                expected: schema.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            schema_id: schema.id().to_string(),
            values,
        })
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
