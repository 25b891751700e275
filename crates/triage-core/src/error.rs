use thiserror::Error;

/// Failure taxonomy for one inference request.
///
/// Every variant is terminal for the request that raised it: the assembler and
/// classifiers are deterministic, so nothing here is retryable.
#[derive(Debug, Error)]
pub enum TriageError {
    /// A required input field is missing, malformed, or out of range.
    #[error("invalid field '{field}': {reason}")]
    Encoding { field: &'static str, reason: String },

    /// A produced vector has the wrong length for the declared schema.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The feature vector length disagrees with what the model was trained on.
    #[error("input shape rejected by {model}: expected {expected} features, got {actual}")]
    InputShape {
        model: String,
        expected: usize,
        actual: usize,
    },

    /// The embedder returned zero rows for a non-empty symptom list.
    #[error("embedder produced no rows for {texts} input text(s)")]
    ShapeMismatch { texts: usize },

    /// The request's feature schema identifier differs from the one the model
    /// artifact was trained against. A wrong-but-same-length vector would
    /// otherwise pass the length check and silently mis-predict.
    #[error("feature schema mismatch: model trained on '{model}', request built with '{request}'")]
    SchemaMismatch { model: String, request: String },

    /// A model artifact was not present or not loaded before inference.
    #[error("model not loaded: {0}")]
    ModelNotLoaded(&'static str),

    /// The model family does not support exact tree attribution. Distinct
    /// from the "no positive contributors" outcome, which is a valid result.
    #[error("attribution unavailable: {model} is not a tree ensemble")]
    AttributionUnavailable { model: String },

    /// A predicted class index has no entry in the label table. This is
    /// model/table version drift, a fatal configuration error.
    #[error("class index {index} has no entry in the {table} label table")]
    LabelLookup { table: &'static str, index: usize },

    /// A model artifact failed to load or failed its consistency checks.
    #[error("invalid model artifact '{path}': {reason}")]
    Artifact { path: String, reason: String },
}

impl TriageError {
    /// Stable machine-readable kind, surfaced in structured error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Encoding { .. } => "encoding_error",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::InputShape { .. } => "input_shape_error",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::ModelNotLoaded(_) => "model_not_loaded",
            Self::AttributionUnavailable { .. } => "attribution_unavailable",
            Self::LabelLookup { .. } => "label_lookup_error",
            Self::Artifact { .. } => "artifact_error",
        }
    }
}
