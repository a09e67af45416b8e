use anyhow::Result;

use crate::detect::result::RawClassification;
use crate::frame::EncodedImage;

/// Remote classifier backend.
///
/// The classifier is an opaque dependency: implementations transport the
/// image and return the reply as received. Validation and clamping happen in
/// [`crate::detect::DetectionClient`], which also turns every `Err` into the
/// unknown fallback result.
///
/// `classify` runs on a detection worker thread and may block.
pub trait ClassifierBackend: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Submit one encoded frame and return the unvalidated reply.
    fn classify(&self, image: &EncodedImage) -> Result<RawClassification>;
}
