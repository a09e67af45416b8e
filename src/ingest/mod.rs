//! Frame sources for the detection loop.
//!
//! - Still images on disk (single file or directory)
//! - HTTP camera snapshots
//! - Synthetic frames (`stub://`, testing and demos)
//!
//! The live browser camera is owned by the presentation layer; these sources
//! stand in for it when the loop runs headless.

pub mod file;
pub mod snapshot;

use anyhow::Result;

pub use file::{StillImageSource, SyntheticSource};
pub use snapshot::{SnapshotConfig, SnapshotSource};

use crate::frame::FrameSource;

const SYNTHETIC_WIDTH: u32 = 1280;
const SYNTHETIC_HEIGHT: u32 = 720;

/// Open a frame source from a CLI/config string.
///
/// `stub://<label>` gives synthetic frames, `http(s)://` a snapshot camera,
/// anything else is treated as a local image file or directory.
pub fn open_source(location: &str) -> Result<Box<dyn FrameSource>> {
    if let Some(label) = location.strip_prefix("stub://") {
        let label = if label.is_empty() { "camera" } else { label };
        return Ok(Box::new(SyntheticSource::new(
            label,
            SYNTHETIC_WIDTH,
            SYNTHETIC_HEIGHT,
        )));
    }
    if location.starts_with("http://") || location.starts_with("https://") {
        let config = SnapshotConfig {
            url: location.to_string(),
            ..SnapshotConfig::default()
        };
        return Ok(Box::new(SnapshotSource::new(config)?));
    }
    Ok(Box::new(StillImageSource::open(location)?))
}
