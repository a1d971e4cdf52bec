use crate::encode::ExportFormat;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::render::frame::{FrameRGBA, RenderedFrame};
use crate::scene::color::Color;
use std::path::{Path, PathBuf};

/// Configuration passed to [`FrameEncoder::open`].
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderConfig {
    /// File the encoder writes.
    pub path: PathBuf,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Nominal frame rate.
    pub fps: Fps,
    /// Number of frames that will be appended.
    pub frame_count: u64,
    /// Whether frames carry meaningful alpha.
    pub transparent: bool,
    /// Color used where a container cannot store alpha.
    pub background: Color,
}

/// Uniform encoder capability.
///
/// Ordering contract: `append` is called with strictly increasing sequence numbers. An append
/// that failed with [`KinetypeError::EncoderBusy`] did not consume the frame and may be retried
/// with the same frame.
///
/// Resource contract: after `finalize` or `abort` returns the encoder holds no file or process
/// handle, and on any failure the output file is removed. Dropping an open encoder aborts it.
pub trait FrameEncoder: Send {
    /// Container this encoder produces.
    fn format(&self) -> ExportFormat;
    /// Create the output file and write container headers.
    fn open(&mut self, cfg: EncoderConfig) -> KinetypeResult<()>;
    /// Append one frame shown for `frame_duration_secs`.
    fn append(&mut self, frame: &RenderedFrame, frame_duration_secs: f64) -> KinetypeResult<()>;
    /// Flush and close the container, returning the written path.
    fn finalize(&mut self) -> KinetypeResult<PathBuf>;
    /// Release every handle and delete the partial output. Safe to call in any state.
    fn abort(&mut self);
    /// Return `true` between a successful `open` and `finalize`/`abort`.
    fn is_open(&self) -> bool;
}

/// Strictly-increasing sequence number check shared by the adapters.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SequenceGuard {
    last: Option<FrameIndex>,
}

impl SequenceGuard {
    pub(crate) fn check(&self, idx: FrameIndex) -> KinetypeResult<()> {
        if let Some(last) = self.last
            && idx.0 <= last.0
        {
            return Err(KinetypeError::encode_failed(format!(
                "out-of-order frame {} after {}",
                idx.0, last.0
            )));
        }
        Ok(())
    }

    pub(crate) fn accept(&mut self, idx: FrameIndex) {
        self.last = Some(idx);
    }

    pub(crate) fn accepted(&self) -> u64 {
        self.last.map_or(0, |l| l.0 + 1)
    }
}

pub(crate) fn check_frame_size(cfg: &EncoderConfig, frame: &FrameRGBA) -> KinetypeResult<()> {
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(KinetypeError::encode_failed(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    if frame.data.len() != (cfg.width as usize) * (cfg.height as usize) * 4 {
        return Err(KinetypeError::encode_failed(
            "frame.data size mismatch with width*height*4",
        ));
    }
    Ok(())
}

pub(crate) fn check_frame_duration(secs: f64) -> KinetypeResult<()> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(KinetypeError::encode_failed(format!(
            "frame duration must be finite and > 0, got {secs}"
        )));
    }
    Ok(())
}

/// Dimensions as `u16`, as GIF and the raster backend require.
pub(crate) fn dims_u16(cfg: &EncoderConfig) -> KinetypeResult<(u16, u16)> {
    if cfg.width == 0 || cfg.height == 0 {
        return Err(KinetypeError::encoder_init(
            "encoder width/height must be non-zero",
        ));
    }
    let w = u16::try_from(cfg.width)
        .map_err(|_| KinetypeError::encoder_init("encoder width exceeds 65535"))?;
    let h = u16::try_from(cfg.height)
        .map_err(|_| KinetypeError::encoder_init("encoder height exceeds 65535"))?;
    Ok((w, h))
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> KinetypeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Best-effort removal of a partial output file.
pub(crate) fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove partial output"),
    }
}

/// In-memory encoder for tests and debugging. Writes no file.
#[derive(Debug)]
pub struct InMemoryEncoder {
    format: ExportFormat,
    cfg: Option<EncoderConfig>,
    guard: SequenceGuard,
    open: bool,
    /// Appended frames with their display durations, in sequence order.
    pub(crate) frames: Vec<(FrameIndex, f64, FrameRGBA)>,
}

impl InMemoryEncoder {
    /// Create an encoder that reports itself as `format`.
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            cfg: None,
            guard: SequenceGuard::default(),
            open: false,
            frames: Vec::new(),
        }
    }

    /// Configuration captured by `open`, if any.
    pub fn config(&self) -> Option<&EncoderConfig> {
        self.cfg.as_ref()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, f64, FrameRGBA)] {
        &self.frames
    }
}

impl FrameEncoder for InMemoryEncoder {
    fn format(&self) -> ExportFormat {
        self.format
    }

    fn open(&mut self, cfg: EncoderConfig) -> KinetypeResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(KinetypeError::encoder_init(
                "encoder width/height must be non-zero",
            ));
        }
        self.cfg = Some(cfg);
        self.guard = SequenceGuard::default();
        self.frames.clear();
        self.open = true;
        Ok(())
    }

    fn append(&mut self, frame: &RenderedFrame, frame_duration_secs: f64) -> KinetypeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .filter(|_| self.open)
            .ok_or_else(|| KinetypeError::encode_failed("in-memory encoder not open"))?;
        self.guard.check(frame.sequence)?;
        check_frame_size(cfg, &frame.bitmap)?;
        check_frame_duration(frame_duration_secs)?;
        self.guard.accept(frame.sequence);
        self.frames
            .push((frame.sequence, frame_duration_secs, frame.bitmap.clone()));
        Ok(())
    }

    fn finalize(&mut self) -> KinetypeResult<PathBuf> {
        if !self.open {
            return Err(KinetypeError::encode_failed("in-memory encoder not open"));
        }
        self.open = false;
        self.cfg
            .as_ref()
            .map(|c| c.path.clone())
            .ok_or_else(|| KinetypeError::encode_failed("in-memory encoder not open"))
    }

    fn abort(&mut self) {
        self.open = false;
        self.frames.clear();
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
