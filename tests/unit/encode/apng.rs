use super::*;
use crate::encode::probe::{ArtifactKind, probe_artifact};
use crate::foundation::core::Fps;
use crate::scene::color::Color;
use crate::test_support::{solid_frame, temp_dir};

fn cfg(path: PathBuf, frames: u64) -> EncoderConfig {
    EncoderConfig {
        path,
        width: 5,
        height: 4,
        fps: Fps::per_second(20).unwrap(),
        frame_count: frames,
        transparent: true,
        background: Color::BLACK,
    }
}

#[test]
fn delay_prefers_exact_fractions() {
    assert_eq!(delay_fraction(0.05), (1, 20));
    assert_eq!(delay_fraction(1.0 / 30.0), (1, 30));
    assert_eq!(delay_fraction(1001.0 / 30000.0), (33, 1000));
    assert_eq!(delay_fraction(2.0), (2000, 1000));
}

#[test]
fn writes_infinite_apng_with_declared_frames() {
    let dir = temp_dir("apng_writes");
    let path = dir.join("out.png");
    let mut enc = ApngEncoder::new();
    enc.open(cfg(path.clone(), 3)).unwrap();
    for i in 0..3u8 {
        enc.append(&solid_frame(u64::from(i), 5, 4, [0, i * 40, 0, 255]), 0.05)
            .unwrap();
    }
    assert_eq!(enc.finalize().unwrap(), path);

    let info = probe_artifact(&path).unwrap();
    assert_eq!(info.kind, ArtifactKind::Apng);
    assert_eq!((info.width, info.height), (5, 4));
    assert_eq!(info.frame_count, 3);
    assert_eq!(info.loop_count, Some(0));
}

#[test]
fn short_sequence_fails_finalize_and_cleans_up() {
    let dir = temp_dir("apng_short");
    let path = dir.join("short.png");
    let mut enc = ApngEncoder::new();
    enc.open(cfg(path.clone(), 3)).unwrap();
    enc.append(&solid_frame(0, 5, 4, [1, 2, 3, 255]), 0.05).unwrap();
    assert!(matches!(enc.finalize(), Err(KinetypeError::EncodeFailed(_))));
    assert!(!path.exists());
    assert!(!enc.is_open());
}

#[test]
fn extra_frames_are_rejected() {
    let dir = temp_dir("apng_extra");
    let path = dir.join("extra.png");
    let mut enc = ApngEncoder::new();
    enc.open(cfg(path.clone(), 1)).unwrap();
    enc.append(&solid_frame(0, 5, 4, [0, 0, 0, 0]), 0.05).unwrap();
    assert!(enc.append(&solid_frame(1, 5, 4, [0, 0, 0, 0]), 0.05).is_err());
    enc.finalize().unwrap();
    assert_eq!(probe_artifact(&path).unwrap().frame_count, 1);
}

#[test]
fn zero_frames_is_init_error() {
    let dir = temp_dir("apng_zero");
    let mut enc = ApngEncoder::new();
    let err = enc.open(cfg(dir.join("z.png"), 0)).unwrap_err();
    assert!(matches!(err, KinetypeError::EncoderInit(_)));
    assert!(!dir.join("z.png").exists());
}
