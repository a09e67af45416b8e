use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};

use crate::detect::backend::ClassifierBackend;
use crate::detect::registry::ObjectCatalog;
use crate::detect::result::ClassificationResult;
use crate::frame::EncodedImage;
use crate::storage::{DetectionEvent, EventStore, CAMERA_SOURCE};

/// Shared handle to the event persistence collaborator.
pub type SharedEventStore = Arc<Mutex<dyn EventStore + Send>>;

/// Outcome of one classification call.
///
/// `result` is always usable. `error` carries the diagnostic when the call
/// failed and `result` is the unknown fallback. `event_id` is set when the
/// result was logged to the event store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionOutcome {
    pub result: ClassificationResult,
    pub error: Option<String>,
    pub event_id: Option<i64>,
}

impl DetectionOutcome {
    pub fn classified(result: ClassificationResult) -> Self {
        Self {
            result,
            error: None,
            event_id: None,
        }
    }

    pub fn failed(diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        Self {
            result: ClassificationResult::fallback(diagnostic.clone()),
            error: Some(diagnostic),
            event_id: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Submits frames to the classifier and normalizes what comes back.
///
/// Never fails outward: transport errors, error statuses and malformed
/// replies all become [`DetectionOutcome::failed`].
pub struct DetectionClient {
    backend: Arc<dyn ClassifierBackend>,
    catalog: ObjectCatalog,
    events: Option<SharedEventStore>,
    source_tag: String,
}

impl DetectionClient {
    pub fn new(backend: Arc<dyn ClassifierBackend>, catalog: ObjectCatalog) -> Self {
        Self {
            backend,
            catalog,
            events: None,
            source_tag: CAMERA_SOURCE.to_string(),
        }
    }

    /// Record known-object classifications on `store`.
    pub fn with_event_store(mut self, store: SharedEventStore) -> Self {
        self.events = Some(store);
        self
    }

    pub fn with_source_tag(mut self, source_tag: &str) -> Self {
        self.source_tag = source_tag.to_string();
        self
    }

    pub fn catalog(&self) -> &ObjectCatalog {
        &self.catalog
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Classify one frame. Blocks for the duration of the remote call.
    pub fn classify(&self, image: &EncodedImage) -> DetectionOutcome {
        match self.try_classify(image) {
            Ok(result) => {
                log::debug!(
                    "classified frame: {} ({}%)",
                    result.object_type,
                    result.confidence
                );
                let event_id = self.record_event(&result);
                DetectionOutcome {
                    event_id,
                    ..DetectionOutcome::classified(result)
                }
            }
            Err(err) => {
                let diagnostic = format!("Error analyzing image: {:#}", err);
                log::debug!("{}", diagnostic);
                DetectionOutcome::failed(diagnostic)
            }
        }
    }

    fn try_classify(&self, image: &EncodedImage) -> Result<ClassificationResult> {
        if image.payload().is_empty() {
            return Err(anyhow!("empty image payload"));
        }
        let raw = self
            .backend
            .classify(image)
            .with_context(|| format!("{} classifier request failed", self.backend.name()))?;
        raw.normalize(&self.catalog)
    }

    /// Log a known-object result. Store failures are only logged.
    fn record_event(&self, result: &ClassificationResult) -> Option<i64> {
        if result.object_type.is_unknown() {
            return None;
        }
        let store = self.events.as_ref()?;
        let event = DetectionEvent::new(
            result.object_type.as_str(),
            result.confidence,
            &self.source_tag,
        );
        let recorded = store
            .lock()
            .map_err(|_| anyhow!("event store lock poisoned"))
            .and_then(|mut store| store.record(&event));
        match recorded {
            Ok(id) => {
                log::debug!("detection event #{} recorded ({})", id, event.object_type);
                Some(id)
            }
            Err(e) => {
                log::warn!("failed to record detection event: {:#}", e);
                None
            }
        }
    }
}
