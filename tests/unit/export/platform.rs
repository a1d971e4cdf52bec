use super::*;
use crate::scene::color::Color;

#[test]
fn reference_profiles() {
    let tg = Platform::Telegram.profile();
    assert_eq!(tg.max_size(), Canvas::new(512, 512));
    assert_eq!(tg.max_file_bytes, 500_000);
    assert!(tg.requires_transparency);

    let ig = Platform::Instagram.profile();
    assert_eq!(ig.formats, vec![ExportFormat::Gif, ExportFormat::Video]);
    assert_eq!(ig.aspect_ratio, AspectRatio::Story);
    assert!(!ig.requires_transparency);

    assert_eq!(Platform::IMessage.profile().max_size(), Canvas::new(618, 618));
    for p in Platform::ALL {
        p.profile().validate().unwrap();
    }
}

#[test]
fn selects_first_format_with_an_adapter() {
    assert_eq!(
        Platform::Instagram.profile().select_format().unwrap(),
        ExportFormat::Gif
    );
    assert_eq!(
        Platform::Telegram.profile().select_format().unwrap(),
        ExportFormat::Gif
    );
    assert_eq!(
        Platform::IMessage.profile().select_format().unwrap(),
        ExportFormat::Apng
    );
    assert!(matches!(
        Platform::WhatsApp.profile().select_format(),
        Err(KinetypeError::UnsupportedFormat(_))
    ));
}

#[test]
fn apply_resizes_and_forces_transparency() {
    let scene = SceneDescription::builder("Hi")
        .background(Color::BLUE)
        .size(200, 200)
        .build();
    let tg = Platform::Telegram.profile().apply_to_scene(&scene);
    assert_eq!(tg.size(), Canvas::new(512, 512));
    assert!(tg.is_transparent());
    assert_eq!(tg.font_size(), scene.font_size());

    let ig = Platform::Instagram.profile().apply_to_scene(&scene);
    assert_eq!(ig.size(), Canvas::new(1080, 1920));
    assert!(!ig.is_transparent());
}

#[test]
fn file_size_limit() {
    let p = Platform::WhatsApp.profile();
    assert!(p.check_file_size(100_000).is_ok());
    assert!(matches!(
        p.check_file_size(100_001),
        Err(KinetypeError::FileTooLarge {
            size: 100_001,
            limit: 100_000
        })
    ));
}

#[test]
fn custom_profile_from_json() {
    let json = r#"{
        "name": "Tiny",
        "max_width": 64,
        "max_height": 64,
        "max_file_bytes": 2048,
        "formats": ["webp", "apng"]
    }"#;
    let p = PlatformProfile::from_reader(json.as_bytes()).unwrap();
    assert_eq!(p.select_format().unwrap(), ExportFormat::Apng);
    assert!(!p.requires_transparency);

    let empty = r#"{"name":"x","max_width":1,"max_height":1,"max_file_bytes":1,"formats":[]}"#;
    assert!(matches!(
        PlatformProfile::from_reader(empty.as_bytes()),
        Err(KinetypeError::Validation(_))
    ));
}

#[test]
fn platform_names_parse() {
    assert_eq!("imessage".parse::<Platform>().unwrap(), Platform::IMessage);
    assert_eq!("WhatsApp".parse::<Platform>().unwrap(), Platform::WhatsApp);
    assert!("myspace".parse::<Platform>().is_err());
}
