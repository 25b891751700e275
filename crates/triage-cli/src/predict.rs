//! One-off prediction and artifact inspection drivers.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;

use triage_ai::ensemble::TreeEnsemble;
use triage_ai::Embedder;
use triage_core::PatientInput;
use triage_pipeline::{TriageContext, run_triage};

use crate::EMBEDDER_DIR;
use crate::display;

/// Load the models, read one request file, run the pipeline, print the result.
pub fn run_predict(models: &Path, request: &Path, top_k: usize, json: bool) -> anyhow::Result<()> {
    let start = Instant::now();

    // 1. Load the embedder first: the feature schema derives its embedding
    //    dimensionality from the loaded model.
    let mut embedder = Embedder::load(&models.join(EMBEDDER_DIR))?;

    // 2. Load both classifier artifacts against that schema.
    let ctx = TriageContext::load(models, embedder.dim())?;
    eprintln!(
        "  Loaded models in {:.2}s (embedding dim {})",
        start.elapsed().as_secs_f64(),
        embedder.dim()
    );

    // 3. Read and run the request.
    let raw = std::fs::read_to_string(request)
        .with_context(|| format!("reading request file {}", request.display()))?;
    let patient: PatientInput = serde_json::from_str(&raw).context("parsing request JSON")?;

    let payload = run_triage(&ctx, &mut embedder, &patient, top_k)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        display::render_payload(&patient, &payload);
    }
    Ok(())
}

/// Print a classifier artifact's metadata without running inference.
pub fn run_inspect(model: &Path) -> anyhow::Result<()> {
    let ensemble = TreeEnsemble::load(model)?;
    display::render_artifact(model, &ensemble);
    Ok(())
}
