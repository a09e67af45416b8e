//! classify_frame - one-shot capture and classification.
//!
//! Grabs a single frame, encodes it, and prints what the classifier saw.
//! Failures are printed to stderr and the process exits non-zero.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::{Arc, Mutex};

use ar_assist::detect::{backend_for_endpoint, SharedEventStore};
use ar_assist::{open_source, AssistConfig, DetectionClient, FrameSampler, SqliteEventStore};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about = "Classify a single camera frame")]
struct Args {
    /// Frame source: image file/directory, snapshot URL, or stub://<label>.
    #[arg(long)]
    source: Option<String>,

    /// Detect endpoint URL (stub:// for the offline demo classifier).
    #[arg(long)]
    endpoint: Option<String>,

    /// Send the frame at native resolution instead of the loop's bounded size.
    #[arg(long)]
    full: bool,

    /// Record known detections in the event database.
    #[arg(long)]
    record: bool,

    /// UI mode for stderr progress (auto|plain|pretty).
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let mut cfg = AssistConfig::load()?;
    if let Some(endpoint) = args.endpoint {
        cfg.endpoint.url = endpoint;
    }
    let source_location = args.source.unwrap_or_else(|| cfg.source.clone());
    let catalog = cfg.catalog()?;

    let frame = {
        let _stage = ui.stage("Capture frame");
        let mut source = open_source(&source_location)?;
        source
            .current_frame()
            .filter(|frame| frame.is_renderable())
            .ok_or_else(|| anyhow!("no frame available from {}", source.describe()))?
    };

    let image = {
        let _stage = ui.stage("Encode frame");
        let sampler = FrameSampler::new(cfg.sampling);
        let encoded = if args.full {
            sampler.sample_full(&frame)
        } else {
            sampler.sample(&frame)
        };
        encoded.ok_or_else(|| {
            anyhow!("failed to encode {}x{} frame", frame.width, frame.height)
        })?
    };

    let backend = backend_for_endpoint(&cfg.endpoint.url, cfg.endpoint.timeout)?;
    let mut client = DetectionClient::new(backend, catalog.clone());
    if args.record {
        let store: SharedEventStore = Arc::new(Mutex::new(SqliteEventStore::open(&cfg.db_path)?));
        client = client.with_event_store(store);
    }

    let stage = ui.stage("Classify");
    let outcome = client.classify(&image);
    if let Some(diagnostic) = &outcome.error {
        stage.fail(diagnostic);
        eprintln!("{}", diagnostic);
        std::process::exit(1);
    }
    drop(stage);

    ui.result(&outcome.result, &catalog);
    Ok(())
}
