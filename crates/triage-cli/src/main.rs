mod display;
mod predict;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::Mutex;

use triage_ai::Embedder;
use triage_pipeline::TriageContext;
use triage_server::AppState;

/// Embedder files live in this subdirectory of the models directory.
const EMBEDDER_DIR: &str = "clinical-bert";

#[derive(Parser)]
#[command(name = "triage", version, about = "Clinical triage inference and attribution pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one prediction from a JSON request file
    Predict {
        /// Directory holding the classifier artifacts and embedder
        #[arg(long, env = "TRIAGE_MODELS_DIR")]
        models: PathBuf,
        /// Path to the request JSON file
        #[arg(long)]
        request: PathBuf,
        /// Contributors surfaced per explanation
        #[arg(long, default_value_t = triage_ai::attribution::DEFAULT_TOP_K)]
        top_k: usize,
        /// Emit the full payload as JSON instead of the card view
        #[arg(long)]
        json: bool,
    },
    /// Start the HTTP serving layer
    Serve {
        #[arg(long, env = "TRIAGE_MODELS_DIR")]
        models: PathBuf,
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: SocketAddr,
        #[arg(long, default_value_t = triage_ai::attribution::DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Print classifier artifact metadata
    Inspect {
        /// Path to a classifier artifact JSON file
        #[arg(long)]
        model: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("triage v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Predict {
            models,
            request,
            top_k,
            json,
        } => predict::run_predict(&models, &request, top_k, json),
        Command::Serve {
            models,
            addr,
            top_k,
        } => {
            let embedder = Embedder::load(&models.join(EMBEDDER_DIR))?;
            let ctx = TriageContext::load(&models, embedder.dim())?;
            let state = AppState {
                ctx: Arc::new(ctx),
                encoder: Arc::new(Mutex::new(Box::new(embedder))),
                top_k,
            };
            triage_server::serve(state, addr).await
        }
        Command::Inspect { model } => predict::run_inspect(&model),
    }
}
