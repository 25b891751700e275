//! One-request inference orchestration over the process-wide model context.
//!
//! The context is built once at startup and passed by reference into every
//! request — never a bare global, so there is no initialization-order hazard
//! to trip over. Each request runs an explicit all-or-nothing state machine:
//! any component failure lands in `Failed` and no partial prediction is ever
//! returned, including on attribution failure.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use triage_ai::ensemble::TreeEnsemble;
use triage_ai::{AttributionSet, Classifier, ClassifierOutput, SymptomEncoder, attribution};
use triage_core::labels::verify_label_table;
use triage_core::{DepartmentLabel, FeatureSchema, PatientInput, RiskLabel, TriageError};

use crate::assembler::FeatureAssembler;

/// Artifact file names under the models directory.
pub const RISK_ARTIFACT: &str = "risk_classifier.json";
pub const DEPARTMENT_ARTIFACT: &str = "department_classifier.json";

/// Process-wide, immutable inference context: the feature schema and both
/// classifier heads, loaded once and shared read-only across requests.
pub struct TriageContext {
    schema: FeatureSchema,
    feature_names: Vec<String>,
    assembler: FeatureAssembler,
    risk: Box<dyn Classifier>,
    department: Box<dyn Classifier>,
}

impl std::fmt::Debug for TriageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageContext")
            .field("schema", &self.schema)
            .field("feature_names", &self.feature_names)
            .field("assembler", &self.assembler)
            .finish_non_exhaustive()
    }
}

impl TriageContext {
    /// Load both classifier artifacts from a models directory.
    ///
    /// `embedding_dim` comes from the loaded embedder; the schema derived
    /// from it must be the one both artifacts were trained against.
    pub fn load(models_dir: &Path, embedding_dim: usize) -> Result<Self, TriageError> {
        let risk_path = models_dir.join(RISK_ARTIFACT);
        let department_path = models_dir.join(DEPARTMENT_ARTIFACT);
        if !risk_path.exists() {
            return Err(TriageError::ModelNotLoaded("risk classifier"));
        }
        if !department_path.exists() {
            return Err(TriageError::ModelNotLoaded("department classifier"));
        }

        let risk = TreeEnsemble::load(&risk_path)?;
        let department = TreeEnsemble::load(&department_path)?;
        Self::from_parts(
            FeatureSchema::v1(embedding_dim),
            Box::new(risk),
            Box::new(department),
        )
    }

    /// Assemble a context from already-loaded classifiers, enforcing the
    /// load-time consistency checks: label tables must agree with the closed
    /// enumerations and both models must have been trained on this schema.
    pub fn from_parts(
        schema: FeatureSchema,
        risk: Box<dyn Classifier>,
        department: Box<dyn Classifier>,
    ) -> Result<Self, TriageError> {
        let risk_expected: Vec<&str> = RiskLabel::TABLE.iter().map(|l| l.as_str()).collect();
        verify_label_table("risk", &risk_expected, risk.labels())?;

        let department_expected: Vec<&str> =
            DepartmentLabel::TABLE.iter().map(|l| l.as_str()).collect();
        verify_label_table("department", &department_expected, department.labels())?;

        for model in [risk.as_ref(), department.as_ref()] {
            if model.schema_id() != schema.id() {
                return Err(TriageError::SchemaMismatch {
                    model: model.schema_id().to_string(),
                    request: schema.id().to_string(),
                });
            }
            if model.feature_count() != schema.len() {
                return Err(TriageError::InputShape {
                    model: model.model_id().to_string(),
                    expected: schema.len(),
                    actual: model.feature_count(),
                });
            }
        }

        let feature_names = schema.feature_names();
        let assembler = FeatureAssembler::new(schema.clone());
        Ok(Self {
            schema,
            feature_names,
            assembler,
            risk,
            department,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn risk(&self) -> &dyn Classifier {
        self.risk.as_ref()
    }

    pub fn department(&self) -> &dyn Classifier {
        self.department.as_ref()
    }
}

/// Request lifecycle states. One execution per request, no retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    FeatureAssembled,
    Predicted,
    Explained,
    Completed,
    /// Terminal failure carrying the originating error kind.
    Failed { kind: &'static str },
}

/// Tracks one request's progress through the state machine.
#[derive(Debug)]
pub struct InferenceRun {
    state: RequestState,
}

impl InferenceRun {
    pub fn new() -> Self {
        Self {
            state: RequestState::Received,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    fn advance(&mut self, next: RequestState) {
        debug!(from = ?self.state, to = ?next, "request state transition");
        self.state = next;
    }
}

impl Default for InferenceRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal artifact of one successful request: both predictions with their
/// resolved labels and attributions, plus a free-text summary. Downstream
/// narrative generation consumes this read-only.
#[derive(Debug, Clone, Serialize)]
pub struct ExplanationPayload {
    pub risk: ClassifierOutput,
    pub risk_label: RiskLabel,
    pub risk_attribution: AttributionSet,
    pub department: ClassifierOutput,
    pub department_label: DepartmentLabel,
    pub department_attribution: AttributionSet,
    pub summary: String,
}

impl ExplanationPayload {
    /// The outbound wire form.
    pub fn response(&self) -> TriageResponse {
        TriageResponse {
            risk: self.risk_label.as_str().to_string(),
            risk_explanation: self.risk_attribution.summary.clone(),
            department: self.department_label.as_str().to_string(),
            department_explanation: self.department_attribution.summary.clone(),
        }
    }
}

/// Outbound response: resolved labels and one explanation string per head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResponse {
    pub risk: String,
    pub risk_explanation: String,
    pub department: String,
    pub department_explanation: String,
}

/// Run one triage request through the full pipeline.
pub fn run_triage(
    ctx: &TriageContext,
    encoder: &mut dyn SymptomEncoder,
    patient: &PatientInput,
    top_k: usize,
) -> Result<ExplanationPayload, TriageError> {
    let mut run = InferenceRun::new();
    run_traced(ctx, encoder, patient, top_k, &mut run)
}

/// As [`run_triage`], with the caller observing state transitions.
pub fn run_traced(
    ctx: &TriageContext,
    encoder: &mut dyn SymptomEncoder,
    patient: &PatientInput,
    top_k: usize,
    run: &mut InferenceRun,
) -> Result<ExplanationPayload, TriageError> {
    match execute(ctx, encoder, patient, top_k, run) {
        Ok(payload) => {
            run.advance(RequestState::Completed);
            Ok(payload)
        }
        Err(err) => {
            run.advance(RequestState::Failed { kind: err.kind() });
            Err(err)
        }
    }
}

fn execute(
    ctx: &TriageContext,
    encoder: &mut dyn SymptomEncoder,
    patient: &PatientInput,
    top_k: usize,
    run: &mut InferenceRun,
) -> Result<ExplanationPayload, TriageError> {
    if encoder.dim() != ctx.schema.embedding_dim() {
        return Err(TriageError::DimensionMismatch {
            expected: ctx.schema.embedding_dim(),
            actual: encoder.dim(),
        });
    }

    patient.validate()?;

    let texts: Vec<&str> = patient.symptoms.iter().map(String::as_str).collect();
    let rows = encoder
        .embed_batch(&texts)
        .map_err(|e| TriageError::Encoding {
            field: "symptoms",
            reason: format!("embedding failed: {e}"),
        })?;

    let vector = ctx.assembler.assemble(patient, &rows)?;
    run.advance(RequestState::FeatureAssembled);

    // Both heads always run; a failure in either fails the whole request.
    let risk_out = ctx.risk.infer(&vector)?;
    let department_out = ctx.department.infer(&vector)?;
    run.advance(RequestState::Predicted);

    let risk_attribution = attribution::explain(
        ctx.risk.as_ref(),
        &vector,
        risk_out.predicted_class,
        &ctx.feature_names,
        top_k,
    )?;
    let department_attribution = attribution::explain(
        ctx.department.as_ref(),
        &vector,
        department_out.predicted_class,
        &ctx.feature_names,
        top_k,
    )?;
    run.advance(RequestState::Explained);

    let risk_label =
        RiskLabel::from_index(risk_out.predicted_class).ok_or(TriageError::LabelLookup {
            table: "risk",
            index: risk_out.predicted_class,
        })?;
    let department_label = DepartmentLabel::from_index(department_out.predicted_class).ok_or(
        TriageError::LabelLookup {
            table: "department",
            index: department_out.predicted_class,
        },
    )?;

    let summary = format!(
        "Assessed as {} with recommended routing to {}.",
        risk_label.as_str(),
        department_label.as_str()
    );

    Ok(ExplanationPayload {
        risk: risk_out,
        risk_label,
        risk_attribution,
        department: department_out,
        department_label,
        department_attribution,
        summary,
    })
}
