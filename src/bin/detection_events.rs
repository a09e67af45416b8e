//! detection_events - list logged detections and record user feedback.

use anyhow::Result;
use clap::Parser;

use ar_assist::{AssistConfig, EventStore, SqliteEventStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "List recent detection events")]
struct Args {
    /// Event database (defaults to the configured db_path).
    #[arg(long, env = "AR_ASSIST_DB_PATH")]
    db_path: Option<String>,

    /// Number of events to show.
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Mark this event id as confirmed by the user.
    #[arg(long, conflicts_with = "reject")]
    confirm: Option<i64>,

    /// Mark this event id as rejected by the user.
    #[arg(long)]
    reject: Option<i64>,

    /// Print events as JSON lines.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = match args.db_path {
        Some(path) => path,
        None => AssistConfig::load()?.db_path,
    };
    let mut store = SqliteEventStore::open(&db_path)?;

    if let Some(id) = args.confirm {
        store.set_confirmed(id, true)?;
        log::info!("event #{} confirmed", id);
    }
    if let Some(id) = args.reject {
        store.set_confirmed(id, false)?;
        log::info!("event #{} rejected", id);
    }

    for stored in store.recent(args.limit)? {
        if args.json {
            println!("{}", serde_json::to_string(&stored)?);
            continue;
        }
        let feedback = match stored.event.confirmed {
            Some(true) => "confirmed",
            Some(false) => "rejected",
            None => "-",
        };
        println!(
            "#{}\t{}\t{}\t{}%\t{}\t{}",
            stored.id,
            stored.created_at,
            stored.event.object_type,
            stored.event.confidence,
            stored.event.source,
            feedback
        );
    }
    Ok(())
}
