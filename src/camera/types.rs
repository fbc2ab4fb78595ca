use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel dimensions of a surface or frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of bytes in a packed RGB24 buffer of this size.
    pub fn rgb_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Constraints passed to a media acquisition capability.
///
/// Width and height are soft hints: an implementation may deliver a
/// different native resolution. Audio is never requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: Dimensions,
}

impl MediaConstraints {
    /// Video-only constraints targeting the given dimensions.
    pub fn video(dimensions: Dimensions) -> Self {
        Self {
            audio: false,
            video: dimensions,
        }
    }
}

/// Still-image encoding for sampled frames.
///
/// Serialised as its MIME type. Unknown MIME types resolve to PNG, which is
/// what a canvas does when asked for a format it cannot produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Resolve a MIME type string, falling back to PNG.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            _ => Self::Png,
        }
    }

    /// Whether the encoder honours a quality setting for this format.
    pub fn uses_quality(&self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl From<String> for ImageFormat {
    fn from(mime: String) -> Self {
        Self::from_mime(&mime)
    }
}

impl From<ImageFormat> for String {
    fn from(format: ImageFormat) -> Self {
        format.mime().to_string()
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Raw RGB24 pixels read from a live source or drawn onto a surface.
#[derive(Debug, Clone)]
pub struct RasterFrame {
    pub data: Vec<u8>,
    pub dimensions: Dimensions,
}

/// A single encoded still frame from a capture run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub format: ImageFormat,
    pub dimensions: Dimensions,
    pub bytes: Vec<u8>,
}

impl EncodedFrame {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Render as a `data:` URL with a base64 payload.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}
