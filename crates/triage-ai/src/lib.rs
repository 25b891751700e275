//! AI inference layer: ONNX Runtime symptom embeddings, tree-ensemble
//! classification, and tree-exact per-prediction attribution.

pub mod attribution;
#[cfg(feature = "onnx")]
mod embedder;
pub mod encoder;
pub mod ensemble;

pub use attribution::{Attribution, AttributionSet, ContributionResult, RawContributions};
#[cfg(feature = "onnx")]
pub use embedder::Embedder;
pub use encoder::SymptomEncoder;
pub use ensemble::{Classifier, ClassifierOutput, EnsembleKind, TreeEnsemble};
