//! Closed label enumerations for the two classifier heads.
//!
//! Classifiers only know integer class indices; the mapping to display
//! strings is owned here, versioned together with the model artifacts. Each
//! artifact records its label table in training order, and
//! [`verify_label_table`] rejects any drift at load time rather than letting
//! an out-of-range index surface mid-request.

use serde::{Deserialize, Serialize};

use crate::error::TriageError;

/// Ordinal severity classes for the risk head. Training label order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    Medium,
    High,
}

impl RiskLabel {
    pub const TABLE: &'static [Self] = &[Self::Low, Self::Medium, Self::High];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::TABLE.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }
}

/// Nominal routing targets for the department head. Training label order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepartmentLabel {
    Cardiology,
    Neurology,
    Orthopedics,
    GeneralMedicine,
}

impl DepartmentLabel {
    pub const TABLE: &'static [Self] = &[
        Self::Cardiology,
        Self::Neurology,
        Self::Orthopedics,
        Self::GeneralMedicine,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::TABLE.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cardiology => "Cardiology",
            Self::Neurology => "Neurology",
            Self::Orthopedics => "Orthopedics",
            Self::GeneralMedicine => "General Medicine",
        }
    }
}

/// Check that a model artifact's label table matches the closed enumeration
/// it will be resolved through.
///
/// `expected` is the enumeration's display strings in index order; `actual`
/// is the table shipped inside the artifact. Any difference means the model
/// and this binary disagree about what the class indices mean.
pub fn verify_label_table(
    table: &'static str,
    expected: &[&str],
    actual: &[String],
) -> Result<(), TriageError> {
    if expected.len() != actual.len()
        || expected.iter().zip(actual).any(|(e, a)| *e != a.as_str())
    {
        tracing::warn!(table, ?actual, "label table does not match this build");
        return Err(TriageError::Artifact {
            path: table.to_string(),
            reason: format!(
                "label table drift: artifact has {actual:?}, this build expects {expected:?}"
            ),
        });
    }
    Ok(())
}
