//! Local frame sources.
//!
//! - `StillImageSource`: one image file, or a directory of images cycled in
//!   name order. Useful for replaying captured street scenes.
//! - `SyntheticSource`: generated gradient frames for `stub://` sources.
//!
//! Neither source touches the network or writes to disk.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::frame::{FrameSource, VideoFrame};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Replays still images from disk.
pub struct StillImageSource {
    root: PathBuf,
    paths: Vec<PathBuf>,
    next: usize,
    frames_served: u64,
}

impl StillImageSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let paths = if root.is_dir() {
            let mut paths = Vec::new();
            for entry in std::fs::read_dir(&root)
                .with_context(|| format!("read image directory {}", root.display()))?
            {
                let path = entry?.path();
                if is_image_path(&path) {
                    paths.push(path);
                }
            }
            paths.sort();
            paths
        } else if root.is_file() {
            vec![root.clone()]
        } else {
            return Err(anyhow!("image source {} does not exist", root.display()));
        };
        if paths.is_empty() {
            return Err(anyhow!("no jpeg/png images found in {}", root.display()));
        }
        Ok(Self {
            root,
            paths,
            next: 0,
            frames_served: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn frames_served(&self) -> u64 {
        self.frames_served
    }
}

impl FrameSource for StillImageSource {
    fn describe(&self) -> String {
        format!("{} ({} images)", self.root.display(), self.paths.len())
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        let path = &self.paths[self.next % self.paths.len()];
        self.next = (self.next + 1) % self.paths.len();
        match image::open(path) {
            Ok(image) => {
                self.frames_served += 1;
                Some(VideoFrame::from_image(image))
            }
            Err(e) => {
                log::warn!("failed to decode {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Generated frames: a diagonal gradient that shifts every frame.
pub struct SyntheticSource {
    label: String,
    width: u32,
    height: u32,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(label: &str, width: u32, height: u32) -> Self {
        Self {
            label: label.to_string(),
            width,
            height,
            frame_count: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn describe(&self) -> String {
        format!("synthetic {} ({}x{})", self.label, self.width, self.height)
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        self.frame_count += 1;
        let shift = (self.frame_count % 256) as u32;
        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                let v = ((x + y + shift) % 256) as u8;
                pixels.extend_from_slice(&[v, v / 2, 255 - v]);
            }
        }
        Some(VideoFrame::from_rgb(pixels, self.width, self.height))
    }
}
