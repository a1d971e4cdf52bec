use crate::encode::sink::FrameEncoder;
use crate::export::cancel::CancelToken;
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::render::frame::RenderedFrame;
use std::time::{Duration, Instant};

/// Retry schedule for appends that report [`KinetypeError::EncoderBusy`].
///
/// Delays start at `initial_ms`, double after each busy result up to `max_delay_ms`, and the
/// whole wait for one frame is capped at `timeout_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// First retry delay in milliseconds.
    pub initial_ms: u64,
    /// Upper bound on a single retry delay in milliseconds.
    pub max_delay_ms: u64,
    /// Total time one frame may wait before the append fails, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_ms: 2,
            max_delay_ms: 50,
            timeout_ms: 5_000,
        }
    }
}

impl BackoffPolicy {
    /// Reject policies that could never retry or never give up.
    pub fn validate(self) -> KinetypeResult<Self> {
        if self.initial_ms == 0 {
            return Err(KinetypeError::validation("backoff initial_ms must be > 0"));
        }
        if self.max_delay_ms < self.initial_ms {
            return Err(KinetypeError::validation(
                "backoff max_delay_ms must be >= initial_ms",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(KinetypeError::validation("backoff timeout_ms must be > 0"));
        }
        Ok(self)
    }

    fn next_delay(self, current: Duration) -> Duration {
        current
            .saturating_mul(2)
            .min(Duration::from_millis(self.max_delay_ms))
    }
}

/// Append `frame`, sleeping and retrying while the encoder is busy.
///
/// Non-transient errors are returned as-is. A busy encoder that does not recover within
/// `policy.timeout_ms` becomes [`KinetypeError::EncodeFailed`]. Cancellation is checked before
/// every retry.
pub fn append_with_backoff(
    encoder: &mut dyn FrameEncoder,
    frame: &RenderedFrame,
    frame_duration_secs: f64,
    policy: BackoffPolicy,
    cancel: &CancelToken,
) -> KinetypeResult<()> {
    let start = Instant::now();
    let timeout = Duration::from_millis(policy.timeout_ms);
    let mut delay = Duration::from_millis(policy.initial_ms);
    let mut retries = 0u32;
    loop {
        match encoder.append(frame, frame_duration_secs) {
            Err(e) if e.is_transient() => {
                if cancel.is_cancelled() {
                    return Err(KinetypeError::Cancelled);
                }
                let waited = start.elapsed();
                if waited >= timeout {
                    return Err(KinetypeError::encode_failed(format!(
                        "encoder stayed busy for {} ms after {retries} retries: {e}",
                        waited.as_millis()
                    )));
                }
                std::thread::sleep(delay.min(timeout - waited));
                delay = policy.next_delay(delay);
                retries += 1;
            }
            other => {
                if retries > 0 {
                    tracing::trace!(retries, seq = frame.sequence.0, "append recovered");
                }
                return other;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/backoff.rs"]
mod tests;
