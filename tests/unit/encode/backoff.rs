use super::*;
use crate::encode::ExportFormat;
use crate::encode::sink::{EncoderConfig, InMemoryEncoder};
use crate::foundation::core::Fps;
use crate::scene::color::Color;
use crate::test_support::solid_frame;
use std::path::PathBuf;

/// Reports busy for the first `busy_for` appends of every frame, or forever.
struct BusyEncoder {
    inner: InMemoryEncoder,
    busy_for: Option<u32>,
    attempts: u32,
}

impl FrameEncoder for BusyEncoder {
    fn format(&self) -> ExportFormat {
        self.inner.format()
    }
    fn open(&mut self, cfg: EncoderConfig) -> KinetypeResult<()> {
        self.inner.open(cfg)
    }
    fn append(&mut self, frame: &RenderedFrame, secs: f64) -> KinetypeResult<()> {
        self.attempts += 1;
        match self.busy_for {
            Some(n) if self.attempts > n => self.inner.append(frame, secs),
            _ => Err(KinetypeError::encoder_busy("full")),
        }
    }
    fn finalize(&mut self) -> KinetypeResult<PathBuf> {
        self.inner.finalize()
    }
    fn abort(&mut self) {
        self.inner.abort()
    }
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

fn busy(busy_for: Option<u32>) -> BusyEncoder {
    let mut inner = InMemoryEncoder::new(ExportFormat::Gif);
    inner
        .open(EncoderConfig {
            path: PathBuf::from("mem"),
            width: 2,
            height: 2,
            fps: Fps::per_second(10).unwrap(),
            frame_count: 1,
            transparent: true,
            background: Color::BLACK,
        })
        .unwrap();
    BusyEncoder {
        inner,
        busy_for,
        attempts: 0,
    }
}

fn fast_policy(timeout_ms: u64) -> BackoffPolicy {
    BackoffPolicy {
        initial_ms: 1,
        max_delay_ms: 4,
        timeout_ms,
    }
}

#[test]
fn retries_until_the_encoder_accepts() {
    let mut enc = busy(Some(3));
    let frame = solid_frame(0, 2, 2, [0, 0, 0, 255]);
    append_with_backoff(&mut enc, &frame, 0.1, fast_policy(1_000), &CancelToken::new()).unwrap();
    assert_eq!(enc.attempts, 4);
    assert_eq!(enc.inner.frames().len(), 1);
}

#[test]
fn persistent_busy_escalates_to_encode_failed() {
    let mut enc = busy(None);
    let frame = solid_frame(0, 2, 2, [0, 0, 0, 255]);
    let start = Instant::now();
    let err =
        append_with_backoff(&mut enc, &frame, 0.1, fast_policy(30), &CancelToken::new()).unwrap_err();
    assert!(matches!(err, KinetypeError::EncodeFailed(_)));
    assert!(start.elapsed() >= Duration::from_millis(30));
    assert!(enc.attempts > 2);
}

#[test]
fn cancellation_stops_retrying() {
    let mut enc = busy(None);
    let frame = solid_frame(0, 2, 2, [0, 0, 0, 255]);
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = append_with_backoff(&mut enc, &frame, 0.1, fast_policy(10_000), &cancel).unwrap_err();
    assert!(matches!(err, KinetypeError::Cancelled));
    assert_eq!(enc.attempts, 1);
}

#[test]
fn non_transient_errors_pass_through() {
    let mut enc = InMemoryEncoder::new(ExportFormat::Gif);
    let frame = solid_frame(0, 2, 2, [0, 0, 0, 255]);
    let err =
        append_with_backoff(&mut enc, &frame, 0.1, fast_policy(100), &CancelToken::new()).unwrap_err();
    assert!(matches!(err, KinetypeError::EncodeFailed(_)));
}

#[test]
fn policy_validation_and_doubling() {
    let p = BackoffPolicy::default().validate().unwrap();
    assert_eq!(p.next_delay(Duration::from_millis(2)), Duration::from_millis(4));
    assert_eq!(p.next_delay(Duration::from_millis(40)), Duration::from_millis(50));
    assert!(BackoffPolicy { initial_ms: 0, ..p }.validate().is_err());
    assert!(BackoffPolicy { max_delay_ms: 1, ..p }.validate().is_err());
    assert!(BackoffPolicy { timeout_ms: 0, ..p }.validate().is_err());
    let parsed: BackoffPolicy = serde_json::from_str(r#"{"timeout_ms": 10}"#).unwrap();
    assert_eq!(parsed.initial_ms, 2);
    assert_eq!(parsed.timeout_ms, 10);
}
