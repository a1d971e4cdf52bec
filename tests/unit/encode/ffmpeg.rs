use super::*;
use crate::scene::color::Color;
use crate::test_support::{solid_frame, temp_dir};

fn cfg(path: PathBuf, w: u32, h: u32) -> EncoderConfig {
    EncoderConfig {
        path,
        width: w,
        height: h,
        fps: Fps::per_second(10).unwrap(),
        frame_count: 3,
        transparent: false,
        background: Color::rgb(10, 20, 30),
    }
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn odd_dimensions_fail_to_open_without_leaving_a_file() {
    let dir = temp_dir("ffmpeg_odd");
    let path = dir.join("odd.mp4");
    let mut enc = FfmpegEncoder::new(2);
    let err = enc.open(cfg(path.clone(), 5, 4)).unwrap_err();
    assert!(matches!(err, KinetypeError::EncoderInit(_)));
    assert!(!path.exists());
    assert!(!enc.is_open());
}

#[test]
fn encodes_mp4_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let dir = temp_dir("ffmpeg_encode");
    let path = dir.join("out.mp4");
    let mut enc = FfmpegEncoder::new(1);
    enc.open(cfg(path.clone(), 16, 8)).unwrap();
    for i in 0..3 {
        let frame = solid_frame(i, 16, 8, [128, 0, 0, 128]);
        // Queue of one: retry while the writer drains.
        loop {
            match enc.append(&frame, 0.1) {
                Ok(()) => break,
                Err(e) if e.is_transient() => {
                    std::thread::sleep(std::time::Duration::from_millis(2))
                }
                Err(e) => panic!("append failed: {e}"),
            }
        }
    }
    assert_eq!(enc.finalize().unwrap(), path);
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn abort_kills_ffmpeg_and_removes_output() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let dir = temp_dir("ffmpeg_abort");
    let path = dir.join("aborted.mp4");
    let mut enc = FfmpegEncoder::new(4);
    enc.open(cfg(path.clone(), 16, 8)).unwrap();
    enc.append(&solid_frame(0, 16, 8, [0, 0, 0, 255]), 0.1)
        .unwrap();
    enc.abort();
    assert!(!enc.is_open());
    assert!(!path.exists());
}
