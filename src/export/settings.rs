use crate::encode::EncoderOpts;
use crate::encode::backoff::BackoffPolicy;
use crate::foundation::core::Fps;
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::session::scheduler::{Pacing, total_frames};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Timing and tuning for one export.
///
/// Defaults match animated sticker output: 2 seconds at 20 fps. JSON files may set any subset
/// of the fields.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Length of the exported animation in seconds.
    pub duration_secs: f64,
    /// Sampling rate.
    pub fps: Fps,
    /// Wall-clock spacing of rendered frames.
    pub pacing: Pacing,
    /// Retry schedule for a busy encoder.
    pub backoff: BackoffPolicy,
    /// Encoder tuning.
    #[serde(flatten)]
    pub encoder: EncoderOpts,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            duration_secs: 2.0,
            fps: Fps { num: 20, den: 1 },
            pacing: Pacing::Virtual,
            backoff: BackoffPolicy::default(),
            encoder: EncoderOpts::default(),
        }
    }
}

impl ExportSettings {
    /// Defaults for MP4 output: 3 seconds at 30 fps.
    pub fn video() -> Self {
        Self {
            duration_secs: 3.0,
            fps: Fps { num: 30, den: 1 },
            ..Self::default()
        }
    }

    /// Same settings with a different duration and rate.
    pub fn with_timing(self, duration_secs: f64, fps: Fps) -> Self {
        Self {
            duration_secs,
            fps,
            ..self
        }
    }

    /// Parse settings from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> KinetypeResult<Self> {
        let s: Self = serde_json::from_reader(r)
            .map_err(|e| KinetypeError::validation(format!("parse settings JSON: {e}")))?;
        s.validate()?;
        Ok(s)
    }

    /// Parse settings from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> KinetypeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            KinetypeError::validation(format!("open settings JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check every field and return the frame count these settings produce.
    pub fn validate(&self) -> KinetypeResult<u64> {
        let frames = total_frames(self.duration_secs, self.fps)?;
        self.backoff.validate()?;
        if self.encoder.channel_capacity == 0 {
            return Err(KinetypeError::validation("channel_capacity must be > 0"));
        }
        if !(1..=30).contains(&self.encoder.gif_speed) {
            return Err(KinetypeError::validation(format!(
                "gif_speed must be in 1..=30, got {}",
                self.encoder.gif_speed
            )));
        }
        Ok(frames)
    }
}
