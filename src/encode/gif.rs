use crate::encode::ExportFormat;
use crate::encode::sink::{
    EncoderConfig, FrameEncoder, SequenceGuard, check_frame_duration, check_frame_size,
    dims_u16, ensure_parent_dir, remove_partial,
};
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::render::frame::RenderedFrame;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::PathBuf;

type GifWriter = ::gif::Encoder<BufWriter<File>>;

/// GIF delay for a frame duration, in centiseconds (at least 1).
pub fn delay_centis(frame_duration_secs: f64) -> u16 {
    (frame_duration_secs * 100.0).round().clamp(1.0, f64::from(u16::MAX)) as u16
}

/// Animated GIF adapter.
///
/// Loops forever, keys fully transparent pixels to the transparent palette index and clears
/// each frame to the background before the next one is drawn.
pub struct GifEncoder {
    speed: i32,
    cfg: Option<EncoderConfig>,
    writer: Option<GifWriter>,
    guard: SequenceGuard,
    dims: (u16, u16),
}

impl GifEncoder {
    /// Create an unopened encoder. `speed` is clamped to the quantizer's `1..=30`.
    pub fn new(speed: i32) -> Self {
        Self {
            speed: speed.clamp(1, 30),
            cfg: None,
            writer: None,
            guard: SequenceGuard::default(),
            dims: (0, 0),
        }
    }

    fn fail(&mut self, e: KinetypeError) -> KinetypeError {
        self.abort();
        e
    }
}

impl FrameEncoder for GifEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Gif
    }

    #[tracing::instrument(skip(self, cfg), fields(path = %cfg.path.display()))]
    fn open(&mut self, cfg: EncoderConfig) -> KinetypeResult<()> {
        if self.is_open() {
            return Err(KinetypeError::encoder_init("gif encoder is already open"));
        }
        let dims = dims_u16(&cfg)?;
        ensure_parent_dir(&cfg.path)
            .map_err(|e| KinetypeError::encoder_init(format!("gif output directory: {e}")))?;
        let file = File::create(&cfg.path).map_err(|e| {
            KinetypeError::encoder_init(format!("create '{}': {e}", cfg.path.display()))
        })?;

        let writer = ::gif::Encoder::new(BufWriter::new(file), dims.0, dims.1, &[])
            .and_then(|mut enc| {
                enc.set_repeat(::gif::Repeat::Infinite)?;
                Ok(enc)
            });
        let writer = match writer {
            Ok(w) => w,
            Err(e) => {
                remove_partial(&cfg.path);
                return Err(KinetypeError::encoder_init(format!("gif header: {e}")));
            }
        };

        self.writer = Some(writer);
        self.dims = dims;
        self.guard = SequenceGuard::default();
        self.cfg = Some(cfg);
        Ok(())
    }

    fn append(&mut self, frame: &RenderedFrame, frame_duration_secs: f64) -> KinetypeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| KinetypeError::encode_failed("gif encoder not open"))?;
        self.guard.check(frame.sequence)?;
        check_frame_size(cfg, &frame.bitmap)?;
        check_frame_duration(frame_duration_secs)?;

        let mut rgba = frame.bitmap.to_straight_rgba();
        let mut out = ::gif::Frame::from_rgba_speed(self.dims.0, self.dims.1, &mut rgba, self.speed);
        out.delay = delay_centis(frame_duration_secs);
        out.dispose = ::gif::DisposalMethod::Background;

        let Some(writer) = self.writer.as_mut() else {
            return Err(KinetypeError::encode_failed("gif encoder not open"));
        };
        if let Err(e) = writer.write_frame(&out) {
            return Err(self.fail(KinetypeError::encode_failed(format!(
                "write gif frame {}: {e}",
                frame.sequence.0
            ))));
        }
        self.guard.accept(frame.sequence);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn finalize(&mut self) -> KinetypeResult<PathBuf> {
        let (Some(writer), Some(cfg)) = (self.writer.take(), self.cfg.take()) else {
            return Err(KinetypeError::encode_failed("gif encoder not open"));
        };
        if self.guard.accepted() == 0 {
            drop(writer);
            remove_partial(&cfg.path);
            return Err(KinetypeError::encode_failed("gif has no frames"));
        }
        let flushed = writer
            .into_inner()
            .and_then(|mut w| w.flush().map(|()| w));
        match flushed {
            Ok(_) => {
                tracing::debug!(frames = self.guard.accepted(), "gif finalized");
                Ok(cfg.path)
            }
            Err(e) => {
                remove_partial(&cfg.path);
                Err(KinetypeError::encode_failed(format!("finish gif: {e}")))
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

impl Drop for GifEncoder {
    fn drop(&mut self) {
        if self.is_open() {
            self.abort();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
