//! Video frames and encoded image payloads.
//!
//! - `VideoFrame`: one RGB still grabbed from a live source. Pixels are private.
//! - `EncodedImage`: compressed still ready for transmission (data URL).
//! - `FrameSource`: anything that can hand the sampler its current frame.
//!
//! Frame sources are owned by the camera layer. The detection core only reads
//! from them and never keeps a frame past the tick that sampled it.

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use image::{DynamicImage, ImageBuffer, Rgb};

const DATA_URL_BASE64_MARKER: &str = ";base64,";

/// A single RGB8 video frame.
pub struct VideoFrame {
    /// Row-major RGB8 pixels, `width * height * 3` bytes when well formed.
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl VideoFrame {
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn from_image(image: DynamicImage) -> Self {
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_rgb(rgb.into_raw(), width, height)
    }

    /// A frame with no pixels or mismatched buffer length cannot be drawn.
    pub fn is_renderable(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.pixels.len() == self.width as usize * self.height as usize * 3
    }

    /// Borrowed raster view; `None` when the frame is not renderable.
    pub(crate) fn raster(&self) -> Option<ImageBuffer<Rgb<u8>, &[u8]>> {
        if !self.is_renderable() {
            return None;
        }
        ImageBuffer::from_raw(self.width, self.height, self.pixels.as_slice())
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Source of live frames (camera, file, snapshot URL).
pub trait FrameSource: Send {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// The frame currently on screen, or `None` if nothing can be grabbed right now.
    fn current_frame(&mut self) -> Option<VideoFrame>;
}

/// Compressed still encoded as a self-describing data URL.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data: String,
    width: u32,
    height: u32,
}

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8], mime_type: &str, width: u32, height: u32) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            data: format!("data:{}{}{}", mime_type, DATA_URL_BASE64_MARKER, payload),
            width,
            height,
        }
    }

    /// Wrap an existing base64 payload or data URL. Dimensions are unknown (0x0).
    pub fn from_data(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            width: 0,
            height: 0,
        }
    }

    pub fn as_data_url(&self) -> &str {
        &self.data
    }

    /// Base64 payload with any `data:...;base64,` prefix removed.
    pub fn payload(&self) -> &str {
        strip_data_url_prefix(&self.data)
    }

    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.data.strip_prefix("data:")?;
        let end = rest.find(DATA_URL_BASE64_MARKER)?;
        Some(&rest[..end])
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.payload())
            .context("decode base64 image payload")
    }

    pub fn decode_image(&self) -> Result<DynamicImage> {
        let bytes = self.decode_bytes()?;
        if bytes.is_empty() {
            return Err(anyhow!("empty image payload"));
        }
        image::load_from_memory(&bytes).context("decode image payload")
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime_type", &self.mime_type())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("payload_len", &self.payload().len())
            .finish()
    }
}

/// Remove a leading `data:<mime>;base64,` prefix, if present.
pub fn strip_data_url_prefix(data: &str) -> &str {
    if !data.starts_with("data:") {
        return data;
    }
    match data.find(DATA_URL_BASE64_MARKER) {
        Some(idx) => &data[idx + DATA_URL_BASE64_MARKER.len()..],
        None => data,
    }
}
