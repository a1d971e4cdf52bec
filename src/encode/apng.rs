use crate::encode::ExportFormat;
use crate::encode::sink::{
    EncoderConfig, FrameEncoder, SequenceGuard, check_frame_duration, check_frame_size,
    ensure_parent_dir, remove_partial,
};
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::render::frame::RenderedFrame;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

type PngWriter = ::png::Writer<BufWriter<File>>;

/// `fcTL` delay as `(numerator, denominator)` seconds.
///
/// Durations of `1/n` seconds are stored exactly as `1/n`; anything else is stored in
/// milliseconds.
pub fn delay_fraction(frame_duration_secs: f64) -> (u16, u16) {
    let per_sec = 1.0 / frame_duration_secs;
    let n = per_sec.round();
    if (per_sec - n).abs() < 1e-6 && (1.0..=f64::from(u16::MAX)).contains(&n) {
        return (1, n as u16);
    }
    let ms = (frame_duration_secs * 1000.0)
        .round()
        .clamp(1.0, f64::from(u16::MAX));
    (ms as u16, 1000)
}

/// Animated PNG adapter.
///
/// Declares `frame_count` frames up front with `num_plays = 0`, and uses background disposal with
/// source blending so each frame fully replaces the previous one.
pub struct ApngEncoder {
    cfg: Option<EncoderConfig>,
    writer: Option<PngWriter>,
    guard: SequenceGuard,
}

impl Default for ApngEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApngEncoder {
    /// Create an unopened encoder.
    pub fn new() -> Self {
        Self {
            cfg: None,
            writer: None,
            guard: SequenceGuard::default(),
        }
    }
}

fn start_apng(file: File, cfg: &EncoderConfig, frames: u32) -> Result<PngWriter, ::png::EncodingError> {
    let mut enc = ::png::Encoder::new(BufWriter::new(file), cfg.width, cfg.height);
    enc.set_color(::png::ColorType::Rgba);
    enc.set_depth(::png::BitDepth::Eight);
    enc.set_animated(frames, 0)?;
    enc.set_dispose_op(::png::DisposeOp::Background)?;
    enc.set_blend_op(::png::BlendOp::Source)?;
    enc.write_header()
}

impl FrameEncoder for ApngEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Apng
    }

    #[tracing::instrument(skip(self, cfg), fields(path = %cfg.path.display()))]
    fn open(&mut self, cfg: EncoderConfig) -> KinetypeResult<()> {
        if self.is_open() {
            return Err(KinetypeError::encoder_init("apng encoder is already open"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(KinetypeError::encoder_init(
                "apng width/height must be non-zero",
            ));
        }
        let frames = u32::try_from(cfg.frame_count)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                KinetypeError::encoder_init(format!(
                    "apng frame count must be in 1..=u32::MAX, got {}",
                    cfg.frame_count
                ))
            })?;
        ensure_parent_dir(&cfg.path)
            .map_err(|e| KinetypeError::encoder_init(format!("apng output directory: {e}")))?;
        let file = File::create(&cfg.path).map_err(|e| {
            KinetypeError::encoder_init(format!("create '{}': {e}", cfg.path.display()))
        })?;

        let writer = match start_apng(file, &cfg, frames) {
            Ok(w) => w,
            Err(e) => {
                remove_partial(&cfg.path);
                return Err(KinetypeError::encoder_init(format!("apng header: {e}")));
            }
        };

        self.writer = Some(writer);
        self.guard = SequenceGuard::default();
        self.cfg = Some(cfg);
        Ok(())
    }

    fn append(&mut self, frame: &RenderedFrame, frame_duration_secs: f64) -> KinetypeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| KinetypeError::encode_failed("apng encoder not open"))?;
        self.guard.check(frame.sequence)?;
        check_frame_size(cfg, &frame.bitmap)?;
        check_frame_duration(frame_duration_secs)?;
        if self.guard.accepted() >= cfg.frame_count {
            return Err(KinetypeError::encode_failed(format!(
                "apng declared {} frames, got more",
                cfg.frame_count
            )));
        }

        let rgba = frame.bitmap.to_straight_rgba();
        let (num, den) = delay_fraction(frame_duration_secs);
        let Some(writer) = self.writer.as_mut() else {
            return Err(KinetypeError::encode_failed("apng encoder not open"));
        };
        let res = writer
            .set_frame_delay(num, den)
            .and_then(|()| writer.write_image_data(&rgba));
        if let Err(e) = res {
            self.abort();
            return Err(KinetypeError::encode_failed(format!(
                "write apng frame {}: {e}",
                frame.sequence.0
            )));
        }
        self.guard.accept(frame.sequence);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn finalize(&mut self) -> KinetypeResult<PathBuf> {
        let (Some(writer), Some(cfg)) = (self.writer.take(), self.cfg.take()) else {
            return Err(KinetypeError::encode_failed("apng encoder not open"));
        };
        let written = self.guard.accepted();
        if written != cfg.frame_count {
            drop(writer);
            remove_partial(&cfg.path);
            return Err(KinetypeError::encode_failed(format!(
                "apng declared {} frames, got {written}",
                cfg.frame_count
            )));
        }
        match writer.finish() {
            Ok(()) => {
                tracing::debug!(frames = written, "apng finalized");
                Ok(cfg.path)
            }
            Err(e) => {
                remove_partial(&cfg.path);
                Err(KinetypeError::encode_failed(format!("finish apng: {e}")))
            }
        }
    }

    fn abort(&mut self) {
        drop(self.writer.take());
        if let Some(cfg) = self.cfg.take() {
            remove_partial(&cfg.path);
        }
    }

    fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

impl Drop for ApngEncoder {
    fn drop(&mut self) {
        if self.is_open() {
            self.abort();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/apng.rs"]
mod tests;
