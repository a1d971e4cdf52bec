use super::*;
use crate::animation::effect::EffectKind;
use crate::encode::EncoderOpts;
use crate::encode::gif::GifEncoder;
use crate::encode::probe::{ArtifactKind, probe_artifact};
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::ErrorKind;
use crate::render::frame::RenderedFrame;
use crate::scene::model::FontSpec;
use crate::test_support::temp_dir;
use std::sync::atomic::AtomicBool;

fn scene() -> SceneDescription {
    SceneDescription::builder("Hi")
        .effect(EffectKind::Bounce)
        .size(32, 32)
        .font_size(12.0)
        .font(FontSpec::Builtin)
        .build()
}

fn half_second() -> ExportSettings {
    ExportSettings::default().with_timing(0.5, Fps::per_second(10).unwrap())
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// GIF encoder that reports busy on every other append and records whether it was closed.
struct FlakyGif {
    inner: GifEncoder,
    calls: u32,
    closed: Arc<AtomicBool>,
}

impl FrameEncoder for FlakyGif {
    fn format(&self) -> ExportFormat {
        ExportFormat::Gif
    }
    fn open(&mut self, cfg: EncoderConfig) -> KinetypeResult<()> {
        self.inner.open(cfg)
    }
    fn append(&mut self, frame: &RenderedFrame, secs: f64) -> KinetypeResult<()> {
        self.calls += 1;
        if self.calls.is_multiple_of(2) {
            return Err(KinetypeError::encoder_busy("try again"));
        }
        self.inner.append(frame, secs)
    }
    fn finalize(&mut self) -> KinetypeResult<PathBuf> {
        self.closed.store(true, Ordering::SeqCst);
        self.inner.finalize()
    }
    fn abort(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.inner.abort()
    }
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

fn flaky_exporter(closed: Arc<AtomicBool>) -> Exporter {
    Exporter::with_factory(
        move |_: ExportFormat, _: &EncoderOpts| -> KinetypeResult<Box<dyn FrameEncoder>> {
            Ok(Box::new(FlakyGif {
                inner: GifEncoder::new(10),
                calls: 0,
                closed: Arc::clone(&closed),
            }))
        },
    )
}

#[test]
fn temp_paths_are_hidden_siblings_and_unique() {
    let out = Path::new("/tmp/out/sticker.gif");
    let a = temp_path_for(out, ExportFormat::Gif);
    let b = temp_path_for(out, ExportFormat::Gif);
    assert_ne!(a, b);
    assert_eq!(a.parent(), out.parent());
    let name = a.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(".sticker.gif."));
    assert!(name.ends_with(".part.gif"));
}

#[test]
fn platform_plan_picks_format_and_resizes() {
    let req = ExportRequest::new(scene(), Platform::IMessage, "x.png").with_settings(half_second());
    let p = plan(&req).unwrap();
    assert_eq!(p.format, ExportFormat::Apng);
    assert_eq!(p.scene.size(), Canvas::new(618, 618));
    assert!(p.scene.is_transparent());
    assert_eq!(p.total_frames, 5);
    assert!(p.size_limit.is_some());

    let req = ExportRequest::new(scene(), ExportFormat::Gif, "x.gif").with_settings(half_second());
    let p = plan(&req).unwrap();
    assert_eq!(p.scene.size(), Canvas::new(32, 32));
    assert!(p.size_limit.is_none());
}

#[test]
fn gif_export_writes_only_the_artifact() {
    let dir = temp_dir("exporter_gif");
    let out = dir.join("hi.gif");
    let req = ExportRequest::new(scene(), ExportFormat::Gif, &out).with_settings(half_second());

    let mut seen = Vec::new();
    let job = Exporter::new().export_with(&req, &CancelToken::new(), &mut |j| {
        seen.push(j.progress())
    });

    assert!(job.is_succeeded(), "{:?}", job.status());
    assert_eq!(job.total_frames(), 5);
    assert_eq!(job.progress(), 1.0);
    assert_eq!(job.byte_len(), Some(std::fs::metadata(&out).unwrap().len()));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(entries(&dir), vec!["hi.gif".to_string()]);

    let info = probe_artifact(&out).unwrap();
    assert_eq!(info.kind, ArtifactKind::Gif);
    assert_eq!(info.frame_count, 5);
}

#[test]
fn busy_encoder_is_retried() {
    let dir = temp_dir("exporter_busy");
    let out = dir.join("busy.gif");
    let closed = Arc::new(AtomicBool::new(false));
    let req = ExportRequest::new(scene(), ExportFormat::Gif, &out).with_settings(half_second());
    let job = flaky_exporter(Arc::clone(&closed)).export(&req);
    assert!(job.is_succeeded(), "{:?}", job.status());
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(probe_artifact(&out).unwrap().frame_count, 5);
}

#[test]
fn cancellation_between_frames_removes_everything() {
    let dir = temp_dir("exporter_cancel");
    let out = dir.join("c.gif");
    let closed = Arc::new(AtomicBool::new(false));
    let req = ExportRequest::new(scene(), ExportFormat::Gif, &out).with_settings(half_second());
    let cancel = CancelToken::new();
    let job = flaky_exporter(Arc::clone(&closed)).export_with(&req, &cancel, &mut |j| {
        if j.frames_encoded() == 2 {
            cancel.cancel();
        }
    });
    assert_eq!(job.error_kind(), Some(ErrorKind::Cancelled));
    assert_eq!(job.frames_encoded(), 2);
    assert!(closed.load(Ordering::SeqCst));
    assert!(entries(&dir).is_empty());
}

#[test]
fn render_error_fails_before_any_file() {
    let dir = temp_dir("exporter_render");
    let out = dir.join("r.gif");
    let bad = SceneDescription::builder("x").size(0, 10).build();
    let job = Exporter::new().export(&ExportRequest::new(bad, ExportFormat::Gif, &out));
    assert_eq!(job.error_kind(), Some(ErrorKind::Render));
    assert!(entries(&dir).is_empty());
}

#[test]
fn oversized_artifact_is_rejected_and_deleted() {
    let dir = temp_dir("exporter_limit");
    let out = dir.join("big.gif");
    let profile = PlatformProfile {
        name: "Tiny".into(),
        max_width: 32,
        max_height: 32,
        max_file_bytes: 16,
        formats: vec![ExportFormat::Gif],
        requires_transparency: false,
        aspect_ratio: Default::default(),
    };
    let req = ExportRequest::new(scene(), profile, &out).with_settings(half_second());
    let job = Exporter::new().export(&req);
    assert_eq!(job.error_kind(), Some(ErrorKind::FileTooLarge));
    assert!(entries(&dir).is_empty());
}

#[test]
fn unsupported_targets_are_rejected_without_state() {
    let dir = temp_dir("exporter_webp");
    let out = dir.join("w.webp");
    let job = Exporter::new().export(&ExportRequest::new(scene(), ExportFormat::WebP, &out));
    assert_eq!(job.error_kind(), Some(ErrorKind::UnsupportedFormat));
    assert_eq!(job.total_frames(), 0);

    let job = Exporter::new().export(&ExportRequest::new(scene(), Platform::WhatsApp, &out));
    assert_eq!(job.error_kind(), Some(ErrorKind::UnsupportedFormat));
    assert_eq!(job.format(), None);
    assert!(entries(&dir).is_empty());
}

#[test]
fn spawned_job_reports_and_joins() {
    let dir = temp_dir("exporter_spawn");
    let out = dir.join("s.png");
    let req = ExportRequest::new(scene(), ExportFormat::Apng, &out).with_settings(half_second());
    let handle = Exporter::new().spawn(req).unwrap();
    let early = handle.progress();
    assert!((0.0..=1.0).contains(&early));
    let job = handle.join().unwrap();
    assert!(job.is_succeeded(), "{:?}", job.status());
    assert_eq!(probe_artifact(&out).unwrap().kind, ArtifactKind::Apng);
}

#[test]
fn still_is_a_png_of_the_scene_size() {
    let dir = temp_dir("exporter_still");
    let out = dir.join("nested").join("still.png");
    let path = Exporter::new().export_still(&scene(), 0.25, &out).unwrap();
    assert_eq!(path, out);
    let info = probe_artifact(&out).unwrap();
    assert_eq!(info.kind, ArtifactKind::Png);
    assert_eq!((info.width, info.height), (32, 32));
    assert_eq!(info.frame_count, 1);
}
