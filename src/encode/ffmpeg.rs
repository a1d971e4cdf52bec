use crate::encode::ExportFormat;
use crate::encode::sink::{
    EncoderConfig, FrameEncoder, SequenceGuard, check_frame_duration, check_frame_size,
    ensure_parent_dir, remove_partial,
};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::frame::RenderedFrame;
use std::io::{Read, Write as _};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{SyncSender, TrySendError, sync_channel};
use std::thread::JoinHandle;

/// MP4 adapter that spawns the system `ffmpeg` and streams raw frames to its stdin.
///
/// Frames are flattened over the background and handed to a writer thread through a bounded
/// channel. When the channel is full `append` returns [`KinetypeError::EncoderBusy`] and keeps the
/// frame, so the caller can retry the same frame later.
pub struct FfmpegEncoder {
    capacity: usize,
    cfg: Option<EncoderConfig>,
    child: Option<Child>,
    tx: Option<SyncSender<Vec<u8>>>,
    writer: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    pending: Option<(FrameIndex, Vec<u8>)>,
    guard: SequenceGuard,
}

impl FfmpegEncoder {
    /// Create an unopened encoder buffering up to `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            cfg: None,
            child: None,
            tx: None,
            writer: None,
            stderr_drain: None,
            pending: None,
            guard: SequenceGuard::default(),
        }
    }

    fn spawn(&mut self, cfg: &EncoderConfig) -> KinetypeResult<()> {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: raw RGBA8 frames, already flattened to opaque.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);
        // Output: h264 + yuv420p for broad compatibility. The container is explicit because the
        // job writes to a temporary name.
        cmd.args([
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ]);
        cmd.arg(&cfg.path);

        let mut child = cmd.spawn().map_err(|e| {
            KinetypeError::encoder_init(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let (Some(mut stdin), Some(mut stderr)) = (child.stdin.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(KinetypeError::encoder_init(
                "failed to open ffmpeg stdio (unexpected)",
            ));
        };
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        let (tx, rx) = sync_channel::<Vec<u8>>(self.capacity);
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            for buf in rx {
                stdin.write_all(&buf)?;
            }
            stdin.flush()
        });

        self.child = Some(child);
        self.tx = Some(tx);
        self.writer = Some(writer);
        self.stderr_drain = Some(stderr_drain);
        Ok(())
    }

    /// Stop the writer thread and collect its result. Closing the channel closes ffmpeg's stdin.
    fn join_writer(&mut self) -> KinetypeResult<()> {
        drop(self.tx.take());
        match self.writer.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| KinetypeError::encode_failed("ffmpeg writer thread panicked"))?
                .map_err(|e| {
                    KinetypeError::encode_failed(format!("failed to write frames to ffmpeg: {e}"))
                }),
            None => Ok(()),
        }
    }

    fn join_stderr(&mut self) -> String {
        self.stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(Result::ok)
            .map(|b| String::from_utf8_lossy(&b).trim().to_string())
            .unwrap_or_default()
    }

    fn release(&mut self) {
        drop(self.tx.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
        let _ = self.join_stderr();
        self.pending = None;
    }

    fn fail(&mut self, e: KinetypeError) -> KinetypeError {
        self.abort();
        e
    }
}

impl FrameEncoder for FfmpegEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Video
    }

    #[tracing::instrument(skip(self, cfg), fields(path = %cfg.path.display()))]
    fn open(&mut self, cfg: EncoderConfig) -> KinetypeResult<()> {
        if self.is_open() {
            return Err(KinetypeError::encoder_init("ffmpeg encoder is already open"));
        }
        cfg.fps
            .validate()
            .map_err(|e| KinetypeError::encoder_init(e.to_string()))?;
        if cfg.width == 0 || cfg.height == 0 {
            return Err(KinetypeError::encoder_init(
                "ffmpeg encoder width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(KinetypeError::encoder_init(
                "ffmpeg encoder width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(KinetypeError::encoder_init(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }
        ensure_parent_dir(&cfg.path)
            .map_err(|e| KinetypeError::encoder_init(format!("mp4 output directory: {e}")))?;
        // ffmpeg only reports an unwritable output once frames arrive.
        std::fs::File::create(&cfg.path).map_err(|e| {
            KinetypeError::encoder_init(format!("create '{}': {e}", cfg.path.display()))
        })?;

        if let Err(e) = self.spawn(&cfg) {
            remove_partial(&cfg.path);
            return Err(e);
        }
        self.guard = SequenceGuard::default();
        self.pending = None;
        self.cfg = Some(cfg);
        Ok(())
    }

    fn append(&mut self, frame: &RenderedFrame, frame_duration_secs: f64) -> KinetypeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| KinetypeError::encode_failed("ffmpeg encoder not open"))?;
        self.guard.check(frame.sequence)?;
        check_frame_size(cfg, &frame.bitmap)?;
        check_frame_duration(frame_duration_secs)?;

        let buf = match self.pending.take() {
            Some((idx, buf)) if idx == frame.sequence => buf,
            _ => {
                let bg = cfg.background;
                let mut buf = vec![0u8; frame.bitmap.data.len()];
                flatten_premul_over_bg_to_opaque_rgba8(
                    &mut buf,
                    &frame.bitmap.data,
                    [bg.r, bg.g, bg.b, 255],
                )?;
                buf
            }
        };

        let Some(tx) = self.tx.as_ref() else {
            return Err(KinetypeError::encode_failed("ffmpeg encoder not open"));
        };
        match tx.try_send(buf) {
            Ok(()) => {
                self.guard.accept(frame.sequence);
                Ok(())
            }
            Err(TrySendError::Full(buf)) => {
                self.pending = Some((frame.sequence, buf));
                Err(KinetypeError::encoder_busy(format!(
                    "ffmpeg queue full at frame {}",
                    frame.sequence.0
                )))
            }
            Err(TrySendError::Disconnected(_)) => {
                let detail = self.join_writer().err();
                let msg = match detail {
                    Some(e) => e.to_string(),
                    None => "ffmpeg writer stopped".to_string(),
                };
                Err(self.fail(KinetypeError::encode_failed(msg)))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    fn finalize(&mut self) -> KinetypeResult<PathBuf> {
        let Some(cfg) = self.cfg.clone() else {
            return Err(KinetypeError::encode_failed("ffmpeg encoder not open"));
        };
        if self.guard.accepted() == 0 {
            return Err(self.fail(KinetypeError::encode_failed("mp4 has no frames")));
        }
        if let Err(e) = self.join_writer() {
            return Err(self.fail(e));
        }
        let Some(mut child) = self.child.take() else {
            return Err(self.fail(KinetypeError::encode_failed("ffmpeg process missing")));
        };
        let status = match child.wait() {
            Ok(s) => s,
            Err(e) => {
                return Err(self.fail(KinetypeError::encode_failed(format!(
                    "failed to wait for ffmpeg to finish: {e}"
                ))));
            }
        };
        let stderr = self.join_stderr();
        if !status.success() {
            return Err(self.fail(KinetypeError::encode_failed(format!(
                "ffmpeg exited with status {status}: {stderr}"
            ))));
        }
        self.cfg = None;
        tracing::debug!(frames = self.guard.accepted(), "mp4 finalized");
        Ok(cfg.path)
    }

    fn abort(&mut self) {
        self.release();
        if let Some(cfg) = self.cfg.take() {
            remove_partial(&cfg.path);
        }
    }

    fn is_open(&self) -> bool {
        self.cfg.is_some()
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.is_open() {
            self.abort();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> KinetypeResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(KinetypeError::encode_failed(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - a;
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
