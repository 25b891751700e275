//! Deterministic fusion of structured vitals and symptom embeddings into the
//! ordered feature vector both classifiers consume.

use tracing::debug;

use triage_core::{FeatureSchema, FeatureVector, PatientInput, TriageError};

/// Gender encoding: `"Female"` → 1, anything else → 0.
///
/// A fixed two-way fold — the source domain only distinguishes male/non-male.
/// This is a deliberate simplification carried over from training, not an
/// oversight; unseen strings land in the 0 bucket by construction.
pub fn encode_gender(raw: &str) -> f32 {
    if raw == "Female" { 1.0 } else { 0.0 }
}

/// Pre-existing-conditions encoding: `"None"` → 0, any other non-blank
/// string → 1.
///
/// A blank field also encodes to 0: an absent report is treated as "no
/// reported conditions" rather than inventing a comorbidity signal from
/// missing data. Richer multi-label encoding requires a new schema version
/// and retraining both classifiers in lockstep.
pub fn encode_pre_existing(raw: &str) -> f32 {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "None" {
        0.0
    } else {
        1.0
    }
}

/// Builds the fused feature vector for one request.
///
/// Numeric vitals pass through unscaled: the downstream classifiers are tree
/// ensembles, which are scale-invariant. Revalidate this if the classifier
/// family ever changes to a scale-sensitive one.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    schema: FeatureSchema,
}

impl FeatureAssembler {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Assemble positions 0–5 from the structured fields and 6..F-1 from the
    /// first embedding row.
    ///
    /// The embedder contract yields one row per symptom string; only one
    /// fused vector is needed per request, so the first row is used. Zero
    /// rows is a contract violation (`ShapeMismatch`), a row of the wrong
    /// width is `DimensionMismatch`.
    pub fn assemble(
        &self,
        patient: &PatientInput,
        embedding_rows: &[Vec<f32>],
    ) -> Result<FeatureVector, TriageError> {
        patient.validate()?;

        let embedding = embedding_rows
            .first()
            .ok_or(TriageError::ShapeMismatch {
                texts: patient.symptoms.len(),
            })?;
        if embedding.len() != self.schema.embedding_dim() {
            return Err(TriageError::DimensionMismatch {
                expected: self.schema.embedding_dim(),
                actual: embedding.len(),
            });
        }

        let mut values = Vec::with_capacity(self.schema.len());
        values.push(patient.age as f32);
        values.push(encode_gender(&patient.gender));
        values.push(patient.blood_pressure as f32);
        values.push(patient.heart_rate as f32);
        values.push(patient.temperature as f32);
        values.push(encode_pre_existing(&patient.pre_existing_conditions));
        values.extend_from_slice(embedding);

        debug!(len = values.len(), schema = self.schema.id(), "assembled feature vector");
        FeatureVector::new(&self.schema, values)
    }
}
