//! Request pipeline: feature assembly and the per-request inference
//! orchestrator over the process-wide model context.

pub mod assembler;
pub mod orchestrator;

pub use assembler::{FeatureAssembler, encode_gender, encode_pre_existing};
pub use orchestrator::{
    ExplanationPayload, InferenceRun, RequestState, TriageContext, TriageResponse, run_triage,
};
