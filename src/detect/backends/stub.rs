use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::detect::backend::ClassifierBackend;
use crate::detect::result::{decode_reply, RawClassification};
use crate::frame::EncodedImage;

/// One canned classifier reply.
#[derive(Clone, Debug)]
pub enum ScriptedReply {
    /// Reply body, decoded exactly like an HTTP response body.
    Body(String),
    /// Transport-level failure with the given message.
    Fail(String),
}

impl ScriptedReply {
    pub fn object(object_type: &str, confidence: f64) -> Self {
        Self::Body(
            serde_json::json!({
                "objectType": object_type,
                "confidence": confidence,
                "explanation": format!("scripted {}", object_type),
            })
            .to_string(),
        )
    }
}

/// Stub classifier for testing and offline demos. Replies cycle in order.
pub struct ScriptedClassifier {
    replies: Vec<ScriptedReply>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Street walk used by `stub://` endpoints: nothing, a weak guess, then graffiti.
    pub fn demo() -> Self {
        Self::new(vec![
            ScriptedReply::Body(
                r#"{"objectType":"unknown","confidence":95,"explanation":"a footpath and a bench",
                    "otherObjects":[{"name":"bench","confidence":90},{"name":"footpath","confidence":85}]}"#
                    .to_string(),
            ),
            ScriptedReply::object("water-bottle", 42.0),
            ScriptedReply::object("graffiti", 82.0),
        ])
    }

    /// Simulated network latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ClassifierBackend for ScriptedClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn classify(&self, _image: &EncodedImage) -> Result<RawClassification> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.replies.is_empty() {
            return Err(anyhow!("stub classifier has no scripted replies"));
        }
        match &self.replies[call % self.replies.len()] {
            ScriptedReply::Body(body) => decode_reply(body),
            ScriptedReply::Fail(message) => Err(anyhow!("{}", message)),
        }
    }
}
