use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert!(Fps { num: 0, den: 1 }.validate().is_err());
    assert_eq!(Fps::per_second(20).unwrap(), Fps { num: 20, den: 1 });
}

#[test]
fn fps_frame_timestamps_are_exact_decimals() {
    let fps = Fps::per_second(10).unwrap();
    let ts: Vec<f64> = (0..10).map(|i| fps.frames_to_secs(i)).collect();
    assert_eq!(ts, vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9]);
    assert_eq!(fps.frame_duration_secs(), 0.1);
}

#[test]
fn fps_rational_rate() {
    let fps = Fps::new(30000, 1001).unwrap();
    assert!((fps.as_f64() - 29.97).abs() < 0.001);
    assert_eq!(fps.secs_to_frames_round(10.0), 300);
}

#[test]
fn secs_to_frames_rounds_to_nearest() {
    let fps = Fps::per_second(20).unwrap();
    assert_eq!(fps.secs_to_frames_round(2.0), 40);
    assert_eq!(fps.secs_to_frames_round(0.024), 0);
    assert_eq!(fps.secs_to_frames_round(0.026), 1);
    assert_eq!(fps.secs_to_frames_round(-1.0), 0);
}

#[test]
fn canvas_helpers() {
    assert!(Canvas::new(0, 10).is_empty());
    assert!(!Canvas::new(1, 1).is_empty());
    assert_eq!(Canvas::new(3, 2).rgba_len(), 24);
    assert_eq!(Canvas::new(512, 256).to_string(), "512x256");
}

#[test]
fn premul_conversion_rounds() {
    let p = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(p.to_array(), [128, 64, 0, 128]);
    assert_eq!(Rgba8Premul::transparent().to_array(), [0, 0, 0, 0]);
    assert_eq!(FrameIndex(4).next(), FrameIndex(5));
}
