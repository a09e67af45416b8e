//! HTTP snapshot frame source.
//!
//! Fetches a single JPEG from a camera snapshot URL (ESP32-CAM `/capture`,
//! IP camera `snapshot.jpg`, ...) every time the loop asks for a frame.
//! Fetch or decode failures yield no frame, so the tick is skipped.

use std::io::Read;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use url::Url;

use crate::frame::{FrameSource, VideoFrame};

const MAX_SNAPSHOT_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct SnapshotConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:81/capture".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SnapshotStats {
    pub frames_captured: u64,
    pub failures: u64,
    pub url: String,
}

pub struct SnapshotSource {
    config: SnapshotConfig,
    agent: ureq::Agent,
    frames_captured: u64,
    failures: u64,
    last_frame_at: Option<Instant>,
    last_error: Option<String>,
}

impl SnapshotSource {
    pub fn new(config: SnapshotConfig) -> Result<Self> {
        let url = Url::parse(&config.url).context("parse snapshot url")?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "unsupported snapshot scheme '{}'; expected http(s)",
                url.scheme()
            ));
        }
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Ok(Self {
            config,
            agent,
            frames_captured: 0,
            failures: 0,
            last_frame_at: None,
            last_error: None,
        })
    }

    /// Healthy when the last fetch succeeded within the last 30 seconds.
    pub fn is_healthy(&self) -> bool {
        if self.last_error.is_some() {
            return false;
        }
        self.last_frame_at
            .map(|at| at.elapsed() <= Duration::from_secs(30))
            .unwrap_or(false)
    }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            frames_captured: self.frames_captured,
            failures: self.failures,
            url: self.config.url.clone(),
        }
    }

    fn fetch(&self) -> Result<VideoFrame> {
        let response = self
            .agent
            .get(&self.config.url)
            .call()
            .with_context(|| format!("fetch snapshot from {}", self.config.url))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_SNAPSHOT_BYTES + 1)
            .read_to_end(&mut bytes)
            .context("read snapshot body")?;
        if bytes.is_empty() {
            return Err(anyhow!("empty snapshot"));
        }
        if bytes.len() as u64 > MAX_SNAPSHOT_BYTES {
            return Err(anyhow!("snapshot exceeds {} bytes", MAX_SNAPSHOT_BYTES));
        }
        let image = image::load_from_memory(&bytes).context("decode snapshot")?;
        Ok(VideoFrame::from_image(image))
    }
}

impl FrameSource for SnapshotSource {
    fn describe(&self) -> String {
        format!("snapshot {}", self.config.url)
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        match self.fetch() {
            Ok(frame) => {
                self.frames_captured += 1;
                self.last_frame_at = Some(Instant::now());
                self.last_error = None;
                Some(frame)
            }
            Err(e) => {
                self.failures += 1;
                log::warn!("snapshot source: {:#}", e);
                self.last_error = Some(format!("{:#}", e));
                None
            }
        }
    }
}
