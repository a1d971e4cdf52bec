use super::*;
use crate::encode::probe::probe_artifact;
use crate::foundation::core::{Canvas, Fps};
use crate::test_support::temp_dir;

fn quick() -> ExportSettings {
    ExportSettings::default().with_timing(0.3, Fps::per_second(10).unwrap())
}

fn item(text: &str, format: ExportFormat) -> StickerItem {
    StickerItem {
        font_size: 8.0,
        format,
        font: FontSpec::Builtin,
        aspect_ratio: AspectRatio::Chat,
        ..StickerItem::new(text, EffectKind::Wave)
    }
}

#[test]
fn slugs_are_file_safe() {
    assert_eq!(item("Hello, World!", ExportFormat::Gif).slug(), "hello-world");
    assert_eq!(item("🎉🎉", ExportFormat::Gif).slug(), "sticker");
}

#[test]
fn sticker_json_defaults() {
    let json = r##"{
        "name": "Party",
        "stickers": [{"text": "yay", "effect": "bounce", "text_color": "#FF0000"}]
    }"##;
    let pack = StickerPack::from_reader(json.as_bytes()).unwrap();
    let s = &pack.stickers[0];
    assert_eq!(s.font_size, 48.0);
    assert!(s.transparent);
    assert_eq!(s.format, ExportFormat::Gif);
    assert_eq!(pack.platform, None);

    let scene = s.to_scene();
    assert_eq!(scene.effect(), EffectKind::Bounce);
    assert_eq!(scene.foreground(), Color::rgb(255, 0, 0));
    assert_eq!(scene.size(), Canvas::new(512, 512));
    assert!(scene.is_transparent());

    assert!(StickerPack::from_reader(r#"{"name": "Empty", "stickers": []}"#.as_bytes()).is_err());
}

#[test]
fn exports_each_sticker_and_keeps_going_after_failures() {
    let dir = temp_dir("pack_mixed").join("out");
    let pack = StickerPack {
        name: "Mixed".into(),
        stickers: vec![
            item("Hi", ExportFormat::Gif),
            item("No", ExportFormat::WebP),
            item("Yo", ExportFormat::Apng),
        ],
        platform: None,
    };
    let report = Exporter::new()
        .export_pack(&pack, &dir, quick(), &CancelToken::new())
        .unwrap();
    assert_eq!(report.jobs.len(), 3);
    assert_eq!(report.failures(), 1);
    assert_eq!(
        report.jobs[1].error_kind(),
        Some(ErrorKind::UnsupportedFormat)
    );
    let outputs = report.outputs();
    assert_eq!(outputs, vec![dir.join("01-hi.gif"), dir.join("03-yo.png")]);
    for out in outputs {
        assert_eq!(probe_artifact(&out).unwrap().frame_count, 3);
    }
}

#[test]
fn platform_pack_uses_the_profile_format() {
    let dir = temp_dir("pack_platform");
    let pack = StickerPack {
        name: "Chat".into(),
        stickers: vec![item("ok", ExportFormat::Video)],
        platform: Some(Platform::Telegram),
    };
    let settings = ExportSettings::default().with_timing(0.1, Fps::per_second(10).unwrap());
    let report = Exporter::new()
        .export_pack(&pack, &dir, settings, &CancelToken::new())
        .unwrap();
    let job = &report.jobs[0];
    assert!(job.is_succeeded(), "{:?}", job.status());
    assert_eq!(job.format(), Some(ExportFormat::Gif));
    assert_eq!(job.output(), dir.join("01-ok.gif"));
    assert_eq!(job.size(), Canvas::new(512, 512));
}

#[test]
fn cancelled_pack_stops_early() {
    let dir = temp_dir("pack_cancel");
    let pack = StickerPack {
        name: "Stop".into(),
        stickers: vec![item("a", ExportFormat::Gif), item("b", ExportFormat::Gif)],
        platform: None,
    };
    let cancel = CancelToken::new();
    cancel.cancel();
    let report = Exporter::new().export_pack(&pack, &dir, quick(), &cancel).unwrap();
    assert_eq!(report.jobs.len(), 1);
    assert_eq!(report.jobs[0].error_kind(), Some(ErrorKind::Cancelled));
    assert!(report.outputs().is_empty());
}
