//! Frame classification.
//!
//! [`DetectionClient`] sends an encoded frame to a [`ClassifierBackend`] and
//! validates the reply against the [`ObjectCatalog`]. [`RequestGate`] tags
//! each request so superseded replies can be discarded.

mod backend;
pub mod backends;
mod client;
mod gate;
mod registry;
mod result;

pub use backend::ClassifierBackend;
pub use backends::{
    backend_for_endpoint, EndpointSettings, HttpClassifier, ScriptedClassifier, ScriptedReply,
};
pub use client::{DetectionClient, DetectionOutcome, SharedEventStore};
pub use gate::{RequestGate, RequestTicket};
pub use registry::{validate_object_id, ObjectCatalog, ObjectProfile, DEFAULT_OBJECTS};
pub use result::{
    clamp_confidence, decode_reply, ClassificationResult, ObjectType, OtherObject,
    RawClassification, RawOtherObject, UNKNOWN_OBJECT,
};
