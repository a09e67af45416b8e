//! Frame sampler: downscale a live frame and encode it for the classifier.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};

use crate::frame::{EncodedImage, VideoFrame};

/// Longest side sent to the classifier in continuous mode.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;
/// JPEG quality used in continuous mode.
pub const DEFAULT_JPEG_QUALITY: u8 = 70;
/// JPEG quality used for single-shot photo capture.
pub const CAPTURE_JPEG_QUALITY: u8 = 80;

const JPEG_MIME: &str = "image/jpeg";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerSettings {
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameSampler {
    settings: SamplerSettings,
}

impl FrameSampler {
    pub fn new(settings: SamplerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> SamplerSettings {
        self.settings
    }

    /// Downscale to the configured bound and encode as a JPEG data URL.
    ///
    /// `None` means "skip this tick": the frame had nothing to draw or the
    /// encoder failed.
    pub fn sample(&self, frame: &VideoFrame) -> Option<EncodedImage> {
        let (width, height) =
            target_dimensions(frame.width, frame.height, self.settings.max_dimension);
        encode_frame(frame, width, height, self.settings.jpeg_quality)
    }

    /// Encode at native resolution for a manual photo capture.
    pub fn sample_full(&self, frame: &VideoFrame) -> Option<EncodedImage> {
        encode_frame(frame, frame.width, frame.height, CAPTURE_JPEG_QUALITY)
    }
}

/// Scale `(width, height)` so the longer side is at most `max_dimension`.
///
/// Dimensions already within the bound are returned unchanged. Aspect ratio is
/// preserved and neither side rounds down to zero.
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if max_dimension == 0 || (width <= max_dimension && height <= max_dimension) {
        return (width, height);
    }
    let (w, h, max) = (width as u64, height as u64, max_dimension as u64);
    if width >= height {
        let scaled = ((h * max + w / 2) / w).max(1);
        (max_dimension, scaled as u32)
    } else {
        let scaled = ((w * max + h / 2) / h).max(1);
        (scaled as u32, max_dimension)
    }
}

fn encode_frame(frame: &VideoFrame, width: u32, height: u32, quality: u8) -> Option<EncodedImage> {
    let Some(raster) = frame.raster() else {
        log::debug!("frame sampler: no renderable frame ({:?})", frame);
        return None;
    };
    let mut jpeg = Vec::new();
    let encoded = {
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
        if (width, height) == (frame.width, frame.height) {
            encoder.encode_image(&raster)
        } else {
            let scaled = imageops::resize(&raster, width, height, FilterType::Triangle);
            encoder.encode_image(&scaled)
        }
    };
    if let Err(e) = encoded {
        log::warn!("frame sampler: jpeg encode failed: {}", e);
        return None;
    }
    Some(EncodedImage::from_bytes(&jpeg, JPEG_MIME, width, height))
}
