//! Shared types for the triage inference pipeline: patient input, the
//! versioned feature schema, closed label enumerations, and the error taxonomy.

pub mod error;
pub mod labels;
pub mod patient;
pub mod schema;

pub use error::TriageError;
pub use labels::{DepartmentLabel, RiskLabel};
pub use patient::PatientInput;
pub use schema::{FeatureSchema, FeatureVector};
