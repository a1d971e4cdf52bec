//! Encoder adapters.
//!
//! Every output container is driven through the same [`sink::FrameEncoder`] capability:
//! `open`, `append` in sequence order, then `finalize` or `abort`.

/// APNG output via the `png` crate.
pub mod apng;
/// Bounded retry of transient `EncoderBusy` appends.
pub mod backoff;
/// `ffmpeg`-based MP4 output.
pub mod ffmpeg;
/// GIF output via the `gif` crate.
pub mod gif;
/// Read back format, size, frame count and loop count of a finished artifact.
pub mod probe;
/// Encoder contract and the in-memory encoder.
pub mod sink;

use crate::foundation::error::{KinetypeError, KinetypeResult};
use sink::FrameEncoder;
use std::path::Path;

/// Output container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Animated GIF.
    Gif,
    /// Animated PNG.
    Apng,
    /// H.264 MP4 video.
    #[serde(rename = "mp4", alias = "video")]
    Video,
    /// Animated WebP. Recognized but has no encoder.
    #[serde(rename = "webp")]
    WebP,
}

impl ExportFormat {
    /// Every format, adapter or not.
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Gif,
        ExportFormat::Apng,
        ExportFormat::Video,
        ExportFormat::WebP,
    ];

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Apng => "png",
            Self::Video => "mp4",
            Self::WebP => "webp",
        }
    }

    /// Return `true` when an encoder adapter exists for this format.
    pub fn has_adapter(self) -> bool {
        !matches!(self, Self::WebP)
    }

    /// Guess the format from a file extension (`gif`, `png`/`apng`, `mp4`, `webp`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "gif" => Some(Self::Gif),
            "png" | "apng" => Some(Self::Apng),
            "mp4" => Some(Self::Video),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Gif => "GIF",
            Self::Apng => "APNG",
            Self::Video => "MP4",
            Self::WebP => "WebP",
        })
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gif" => Ok(Self::Gif),
            "apng" | "png" => Ok(Self::Apng),
            "mp4" | "video" => Ok(Self::Video),
            "webp" => Ok(Self::WebP),
            other => Err(format!("unknown format '{other}'")),
        }
    }
}

/// Adapter tuning shared by all encoders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderOpts {
    /// GIF palette quantization speed, 1 (best) to 30 (fastest).
    pub gif_speed: i32,
    /// Frames buffered between the video adapter and its `ffmpeg` writer thread.
    pub channel_capacity: usize,
}

impl Default for EncoderOpts {
    fn default() -> Self {
        Self {
            gif_speed: 10,
            channel_capacity: 4,
        }
    }
}

/// Builds a fresh encoder for each export job.
pub trait EncoderFactory: Send + Sync {
    /// Create an unopened encoder for `format`.
    fn create(&self, format: ExportFormat, opts: &EncoderOpts)
    -> KinetypeResult<Box<dyn FrameEncoder>>;
}

impl<F> EncoderFactory for F
where
    F: Fn(ExportFormat, &EncoderOpts) -> KinetypeResult<Box<dyn FrameEncoder>> + Send + Sync,
{
    fn create(
        &self,
        format: ExportFormat,
        opts: &EncoderOpts,
    ) -> KinetypeResult<Box<dyn FrameEncoder>> {
        self(format, opts)
    }
}

/// Create the built-in encoder for `format`.
///
/// WebP fails with [`KinetypeError::UnsupportedFormat`] before any state is created.
pub fn create_encoder(
    format: ExportFormat,
    opts: &EncoderOpts,
) -> KinetypeResult<Box<dyn FrameEncoder>> {
    match format {
        ExportFormat::Gif => Ok(Box::new(gif::GifEncoder::new(opts.gif_speed))),
        ExportFormat::Apng => Ok(Box::new(apng::ApngEncoder::new())),
        ExportFormat::Video => Ok(Box::new(ffmpeg::FfmpegEncoder::new(opts.channel_capacity))),
        ExportFormat::WebP => Err(KinetypeError::unsupported_format(
            "WebP export has no encoder",
        )),
    }
}
