use super::*;

fn cfg(w: u32, h: u32) -> EncoderConfig {
    EncoderConfig {
        path: PathBuf::from("mem"),
        width: w,
        height: h,
        fps: Fps::per_second(10).unwrap(),
        frame_count: 3,
        transparent: true,
        background: Color::BLACK,
    }
}

fn frame(seq: u64, w: u32, h: u32) -> RenderedFrame {
    RenderedFrame {
        sequence: FrameIndex(seq),
        presentation_time: seq as f64 / 10.0,
        bitmap: FrameRGBA::from_premul(w, h, vec![0; (w * h * 4) as usize]).unwrap(),
    }
}

#[test]
fn in_memory_encoder_captures_frames_in_order() {
    let mut enc = InMemoryEncoder::new(ExportFormat::Gif);
    assert!(!enc.is_open());
    enc.open(cfg(2, 2)).unwrap();
    assert!(enc.is_open());
    enc.append(&frame(0, 2, 2), 0.1).unwrap();
    enc.append(&frame(1, 2, 2), 0.1).unwrap();
    assert_eq!(enc.finalize().unwrap(), PathBuf::from("mem"));
    assert!(!enc.is_open());
    assert_eq!(enc.frames().len(), 2);
    assert_eq!(enc.frames()[1].0, FrameIndex(1));
}

#[test]
fn rejects_out_of_order_and_mismatched_frames() {
    let mut enc = InMemoryEncoder::new(ExportFormat::Apng);
    enc.open(cfg(2, 2)).unwrap();
    enc.append(&frame(1, 2, 2), 0.1).unwrap();
    assert!(matches!(
        enc.append(&frame(1, 2, 2), 0.1),
        Err(KinetypeError::EncodeFailed(_))
    ));
    assert!(enc.append(&frame(0, 2, 2), 0.1).is_err());
    assert!(enc.append(&frame(2, 4, 2), 0.1).is_err());
    assert!(enc.append(&frame(3, 2, 2), 0.0).is_err());
    enc.append(&frame(4, 2, 2), 0.1).unwrap();
}

#[test]
fn append_before_open_fails() {
    let mut enc = InMemoryEncoder::new(ExportFormat::Gif);
    assert!(enc.append(&frame(0, 1, 1), 0.1).is_err());
    assert!(enc.finalize().is_err());
    assert!(matches!(
        enc.open(cfg(0, 1)),
        Err(KinetypeError::EncoderInit(_))
    ));
}

#[test]
fn sequence_guard_counts_accepted() {
    let mut g = SequenceGuard::default();
    assert_eq!(g.accepted(), 0);
    g.check(FrameIndex(0)).unwrap();
    g.accept(FrameIndex(0));
    g.accept(FrameIndex(1));
    assert_eq!(g.accepted(), 2);
    assert!(g.check(FrameIndex(1)).is_err());
}

#[test]
fn dims_must_fit_u16() {
    assert_eq!(dims_u16(&cfg(3, 4)).unwrap(), (3, 4));
    assert!(dims_u16(&cfg(70_000, 4)).is_err());
    assert!(dims_u16(&cfg(0, 4)).is_err());
}
