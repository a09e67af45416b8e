use std::fmt;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use super::registry::ObjectCatalog;

/// Sentinel object type for "nothing recognized" and for failed calls.
pub const UNKNOWN_OBJECT: &str = "unknown";

/// Object kind reported by the classifier.
///
/// This is an open string rather than an enum: the set of recognized objects
/// lives in [`ObjectCatalog`] and grows without touching the control loop.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectType(String);

impl ObjectType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_lowercase())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_OBJECT.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_OBJECT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectType {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secondary object seen in the frame. Informational only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherObject {
    pub name: String,
    pub confidence: u8,
}

/// Validated classification of one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub object_type: ObjectType,
    /// Always within 0..=100.
    pub confidence: u8,
    pub explanation: String,
    #[serde(default)]
    pub other_objects: Vec<OtherObject>,
}

impl ClassificationResult {
    /// Result used when the classifier could not be reached or replied with garbage.
    pub fn fallback(diagnostic: impl Into<String>) -> Self {
        Self {
            object_type: ObjectType::unknown(),
            confidence: 0,
            explanation: diagnostic.into(),
            other_objects: Vec::new(),
        }
    }

    /// A recognized object at or above the threshold.
    pub fn is_confident(&self, min_confidence: u8) -> bool {
        !self.object_type.is_unknown() && self.confidence >= min_confidence
    }
}

/// Classifier reply as received on the wire, before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawClassification {
    pub object_type: Option<String>,
    pub confidence: Option<f64>,
    pub explanation: Option<String>,
    pub other_objects: Option<Vec<RawOtherObject>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawOtherObject {
    #[serde(default)]
    pub name: String,
    pub confidence: Option<f64>,
}

impl RawClassification {
    /// Validate and clamp a reply into a [`ClassificationResult`].
    ///
    /// A reply without `objectType` or `confidence` is malformed. Object types
    /// outside the catalog collapse to `unknown`.
    pub fn normalize(self, catalog: &ObjectCatalog) -> Result<ClassificationResult> {
        let raw_type = self
            .object_type
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("classifier reply missing objectType"))?;
        let confidence = self
            .confidence
            .ok_or_else(|| anyhow!("classifier reply missing confidence"))?;

        let object_type = catalog.resolve(&raw_type);
        if object_type.is_unknown() && !raw_type.trim().eq_ignore_ascii_case(UNKNOWN_OBJECT) {
            log::debug!(
                "classifier returned unrecognized object type '{}'; treating as unknown",
                raw_type.trim()
            );
        }

        let other_objects = self
            .other_objects
            .unwrap_or_default()
            .into_iter()
            .map(|other| OtherObject {
                name: other.name,
                confidence: clamp_confidence(other.confidence.unwrap_or(0.0)),
            })
            .collect();

        Ok(ClassificationResult {
            object_type,
            confidence: clamp_confidence(confidence),
            explanation: self.explanation.unwrap_or_default(),
            other_objects,
        })
    }
}

/// Round and clamp a classifier confidence into 0..=100.
pub fn clamp_confidence(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Parse a reply body, tolerating a markdown code fence around the JSON.
pub fn decode_reply(body: &str) -> Result<RawClassification> {
    let json = strip_code_fence(body.trim());
    serde_json::from_str(json).context("malformed classifier reply")
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
