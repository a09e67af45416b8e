//! ar_assist - continuous detection against a camera source.
//!
//! Samples a frame every interval, classifies it, and pauses for the cooldown
//! after a confident hit. Runs until Ctrl-C, the optional duration elapses, or
//! (with `--confirm-first`) the first confident detection is confirmed.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ar_assist::detect::{backend_for_endpoint, SharedEventStore};
use ar_assist::{
    open_source, AssistConfig, ClassificationResult, DetectionClient, EventStore, FrameSampler,
    LoopExit, LoopHandle, LoopObserver, LoopRuntime, ObjectCatalog, SqliteEventStore,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about = "Continuously classify camera frames")]
struct Args {
    /// Frame source: image file/directory, snapshot URL, or stub://<label>.
    #[arg(long)]
    source: Option<String>,

    /// Detect endpoint URL (stub:// for the offline demo classifier).
    #[arg(long)]
    endpoint: Option<String>,

    /// Stop after this many seconds.
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Confirm the first confident detection and exit.
    #[arg(long)]
    confirm_first: bool,

    /// UI mode for result output (auto|plain|pretty).
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

struct WatchObserver {
    ui: ui::Ui,
    catalog: ObjectCatalog,
    confirm_with: Option<LoopHandle>,
}

impl LoopObserver for WatchObserver {
    fn on_detection(&mut self, result: &ClassificationResult) {
        self.ui.result(result, &self.catalog);
        if let Some(handle) = &self.confirm_with {
            if let Err(e) = handle.confirm(result.object_type.clone()) {
                log::warn!("failed to confirm detection: {:#}", e);
            }
        }
    }

    fn on_error(&mut self, diagnostic: &str) {
        log::warn!("{}", diagnostic);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

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
    let backend = backend_for_endpoint(&cfg.endpoint.url, cfg.endpoint.timeout)?;
    let sqlite = Arc::new(Mutex::new(SqliteEventStore::open(&cfg.db_path)?));
    let store: SharedEventStore = sqlite.clone();
    let client = DetectionClient::new(backend, catalog.clone()).with_event_store(store);
    log::info!(
        "classifier backend {} at {}",
        client.backend_name(),
        cfg.endpoint.url
    );

    let source = {
        let stage = ui.stage("Open frame source");
        match open_source(&source_location) {
            Ok(source) => source,
            Err(e) => {
                stage.fail(&format!("{:#}", e));
                return Err(e);
            }
        }
    };

    let sampler = FrameSampler::new(cfg.sampling);
    let mut runtime = LoopRuntime::new(cfg.detection, sampler, Arc::new(client));
    let handle = runtime.handle();
    runtime = runtime.with_observer(WatchObserver {
        ui,
        catalog,
        confirm_with: args.confirm_first.then(|| handle.clone()),
    });

    let interrupt = handle.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt.stop();
    })
    .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

    runtime.start(source);
    let limit = args.duration_secs.map(Duration::from_secs);
    match runtime.run(limit)? {
        LoopExit::Confirmed(confirmation) => {
            log::info!("confirmed {}", confirmation.object_type);
            let matches_result = confirmation
                .last_result
                .as_ref()
                .is_some_and(|result| result.object_type == confirmation.object_type);
            match confirmation.event_id.filter(|_| matches_result) {
                Some(id) => {
                    sqlite
                        .lock()
                        .map_err(|_| anyhow!("event store lock poisoned"))?
                        .set_confirmed(id, true)?;
                    log::info!("detection event #{} marked confirmed", id);
                }
                None => log::warn!("confirmed detection has no logged event"),
            }
        }
        LoopExit::TimedOut => log::info!("run time limit reached"),
        LoopExit::Stopped | LoopExit::Reset => log::info!("detection loop stopped"),
    }
    Ok(())
}
