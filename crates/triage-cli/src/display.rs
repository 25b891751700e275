//! Card-style terminal rendering for predictions and artifacts.

use std::path::Path;

use triage_ai::ensemble::TreeEnsemble;
use triage_ai::{AttributionSet, Classifier, ClassifierOutput};
use triage_core::PatientInput;
use triage_pipeline::ExplanationPayload;

const BAR_WIDTH: usize = 24;

/// Render the full result card for one request.
pub fn render_payload(patient: &PatientInput, payload: &ExplanationPayload) {
    section("Patient");
    field("Age", &patient.age.to_string());
    field("Gender", &patient.gender);
    field("Blood pressure", &patient.blood_pressure.to_string());
    field("Heart rate", &patient.heart_rate.to_string());
    field("Temperature", &patient.temperature.to_string());
    field("Pre-existing", &patient.pre_existing_conditions);
    println!("  Symptoms:");
    for symptom in &patient.symptoms {
        println!("    - {symptom}");
    }

    section("Risk");
    prediction_card(
        payload.risk_label.as_str(),
        &payload.risk,
        &payload.risk_attribution,
        &["Low Risk", "Medium Risk", "High Risk"],
    );

    section("Department");
    prediction_card(
        payload.department_label.as_str(),
        &payload.department,
        &payload.department_attribution,
        &["Cardiology", "Neurology", "Orthopedics", "General Medicine"],
    );

    section("Summary");
    println!("  {}", payload.summary);
}

/// Render one classifier head: label, probability bars, contributors.
fn prediction_card(
    label: &str,
    output: &ClassifierOutput,
    attribution: &AttributionSet,
    class_names: &[&str],
) {
    field("Prediction", label);
    println!("  Probabilities:");
    for (name, &p) in class_names.iter().zip(&output.class_probabilities) {
        println!("    {name:<18} {p:>6.3}  {}", bar(p));
    }
    if attribution.has_contributors() {
        println!("  Top contributors:");
        for a in &attribution.contributors {
            println!("    {:<18} {:+.4}", a.feature, a.contribution);
        }
    }
    field("Explanation", &attribution.summary);
}

/// Render a classifier artifact's metadata.
pub fn render_artifact(path: &Path, ensemble: &TreeEnsemble) {
    section("Artifact");
    field("Path", &path.display().to_string());
    field("Model", ensemble.model_id());
    field("Kind", &format!("{:?}", ensemble.kind()));
    field("Schema", ensemble.schema_id());
    field("Features", &ensemble.feature_count().to_string());
    field("Trees", &ensemble.tree_count().to_string());
    field("Classes", &ensemble.n_classes().to_string());
    field("Labels", &ensemble.labels().join(", "));
    if let Some(trained_at) = &ensemble.trained_at {
        field("Trained at", trained_at);
    }
}

fn section(title: &str) {
    println!("\n── {title} ──");
}

fn field(name: &str, value: &str) {
    println!("  {name:<16} {value}");
}

fn bar(p: f32) -> String {
    let filled = (p.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize;
    "█".repeat(filled)
}
