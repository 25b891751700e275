//! Inbound triage request as received from the serving layer.

use serde::{Deserialize, Serialize};

use crate::error::TriageError;

/// One triage request: structured vitals plus free-text symptom descriptions.
///
/// Field names on the wire match the upstream EHR extraction
/// (`Age`, `Gender`, `Blood_Pressure`, ...). `Gender` and
/// `Pre_Existing_Conditions` stay free strings: the feature encoding is a
/// two-way fold, so unseen values must remain representable rather than
/// failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientInput {
    #[serde(rename = "Age")]
    pub age: i64,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Blood_Pressure")]
    pub blood_pressure: f64,
    #[serde(rename = "Heart_Rate")]
    pub heart_rate: f64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Pre_Existing_Conditions")]
    pub pre_existing_conditions: String,
    pub symptoms: Vec<String>,
}

impl PatientInput {
    /// Fail-fast validation of the inbound request.
    ///
    /// Rejects anything the classifiers were never trained to see: negative
    /// or non-finite vitals, out-of-range age, an empty symptom list.
    pub fn validate(&self) -> Result<(), TriageError> {
        if !(0..=150).contains(&self.age) {
            return Err(TriageError::Encoding {
                field: "Age",
                reason: format!("must be between 0 and 150, got {}", self.age),
            });
        }

        for (field, value) in [
            ("Blood_Pressure", self.blood_pressure),
            ("Heart_Rate", self.heart_rate),
            ("Temperature", self.temperature),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TriageError::Encoding {
                    field,
                    reason: format!("must be a finite value >= 0, got {value}"),
                });
            }
        }

        if self.symptoms.is_empty() || self.symptoms.iter().all(|s| s.trim().is_empty()) {
            return Err(TriageError::Encoding {
                field: "symptoms",
                reason: "at least one non-empty symptom description is required".into(),
            });
        }

        Ok(())
    }
}
