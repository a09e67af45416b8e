use anyhow::{anyhow, Result};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source tag for detections coming from the live camera loop.
pub const CAMERA_SOURCE: &str = "camera";

/// A classification worth remembering: a known object type seen by the camera.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionEvent {
    pub object_type: String,
    pub confidence: u8,
    pub source: String,
    /// Set later by the user confirming or rejecting the detection.
    pub confirmed: Option<bool>,
}

impl DetectionEvent {
    pub fn new(object_type: &str, confidence: u8, source: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            confidence: confidence.min(100),
            source: source.to_string(),
            confirmed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub id: i64,
    pub created_at: i64,
    #[serde(flatten)]
    pub event: DetectionEvent,
}

/// Persistence collaborator for detection events.
pub trait EventStore {
    /// Persist an event, returning its id.
    fn record(&mut self, event: &DetectionEvent) -> Result<i64>;

    /// Most recent events first.
    fn recent(&self, limit: usize) -> Result<Vec<StoredEvent>>;

    fn set_confirmed(&mut self, id: i64, confirmed: bool) -> Result<()>;
}

pub struct SqliteEventStore {
    conn: Connection,
}

impl SqliteEventStore {
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let mut store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS detection_events (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              created_at INTEGER NOT NULL,
              object_type TEXT NOT NULL,
              confidence INTEGER NOT NULL,
              source TEXT NOT NULL,
              confirmed INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_detection_events_created
              ON detection_events(created_at);
            "#,
        )?;
        Ok(())
    }
}

impl EventStore for SqliteEventStore {
    fn record(&mut self, event: &DetectionEvent) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO detection_events(created_at, object_type, confidence, source, confirmed)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                now_s()?,
                event.object_type,
                i64::from(event.confidence),
                event.source,
                event.confirmed,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredEvent>> {
        let limit = i64::try_from(limit).map_err(|_| anyhow!("limit exceeds i64 range"))?;
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, object_type, confidence, source, confirmed
             FROM detection_events ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let confidence: i64 = row.get(3)?;
            Ok(StoredEvent {
                id: row.get(0)?,
                created_at: row.get(1)?,
                event: DetectionEvent {
                    object_type: row.get(2)?,
                    confidence: confidence.clamp(0, 100) as u8,
                    source: row.get(4)?,
                    confirmed: row.get(5)?,
                },
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn set_confirmed(&mut self, id: i64, confirmed: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE detection_events SET confirmed = ?1 WHERE id = ?2",
            params![confirmed, id],
        )?;
        if changed == 0 {
            return Err(anyhow!("detection event {} not found", id));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEventStore {
    events: Vec<StoredEvent>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventStore for InMemoryEventStore {
    fn record(&mut self, event: &DetectionEvent) -> Result<i64> {
        let id = self.events.len() as i64 + 1;
        self.events.push(StoredEvent {
            id,
            created_at: now_s()?,
            event: event.clone(),
        });
        Ok(id)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredEvent>> {
        Ok(self.events.iter().rev().take(limit).cloned().collect())
    }

    fn set_confirmed(&mut self, id: i64, confirmed: bool) -> Result<()> {
        let stored = self
            .events
            .iter_mut()
            .find(|stored| stored.id == id)
            .ok_or_else(|| anyhow!("detection event {} not found", id))?;
        stored.event.confirmed = Some(confirmed);
        Ok(())
    }
}

fn now_s() -> Result<i64> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| anyhow!("system clock before unix epoch"))?
        .as_secs();
    i64::try_from(secs).map_err(|_| anyhow!("timestamp exceeds i64 range"))
}
