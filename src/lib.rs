//! AR Assist detection loop
//!
//! Continuously samples frames from a camera, asks a remote vision service
//! what civic issue (if any) is in view, and pauses when it is confident
//! enough to prompt the user.
//!
//! # Architecture
//!
//! The loop is split so that the state machine never blocks:
//!
//! 1. **Sampling**: a frame is downscaled and JPEG-encoded into a data URL.
//! 2. **Classification**: a worker sends the image to the detect endpoint and
//!    normalizes the reply. Failures become a diagnostic fallback result.
//! 3. **Control**: the [`DetectionLoop`] owns all state, arms timers, and
//!    discards results from superseded or cancelled requests.
//! 4. **Persistence**: confident known hits are logged as detection events.
//!
//! # Module Structure
//!
//! - `controller`: the loop state machine
//! - `runtime`: thread/channel driver for real time
//! - `detect`: object catalog, result normalization, classifier backends
//! - `frame`: video frames and encoded images
//! - `sampler`: downscale + JPEG encode
//! - `scheduler`: one-shot timer queue
//! - `ingest`: headless frame sources (files, snapshots, synthetic)
//! - `storage`: detection event store
//! - `config`: file + environment configuration

pub mod config;
pub mod controller;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod runtime;
pub mod sampler;
pub mod scheduler;
pub mod storage;

pub use config::AssistConfig;
pub use controller::{
    Confirmation, DetectionLoop, Dispatcher, LoopObserver, LoopPhase, LoopSettings, LoopState,
    NoopObserver,
};
pub use detect::{
    ClassificationResult, ClassifierBackend, DetectionClient, DetectionOutcome, ObjectCatalog,
    ObjectType, OtherObject, RequestTicket,
};
pub use frame::{EncodedImage, FrameSource, VideoFrame};
pub use ingest::{open_source, SnapshotSource, StillImageSource, SyntheticSource};
pub use runtime::{LoopCommand, LoopExit, LoopHandle, LoopRuntime};
pub use sampler::{FrameSampler, SamplerSettings};
pub use scheduler::{Scheduler, TimerHandle, TimerKind, TimerQueue};
pub use storage::{DetectionEvent, EventStore, InMemoryEventStore, SqliteEventStore, StoredEvent};
