use super::*;

#[test]
fn builder_defaults_match_sticker_editor() {
    let s = SceneDescription::builder("Hello!").build();
    assert_eq!(s.text(), "Hello!");
    assert_eq!(s.effect(), EffectKind::None);
    assert_eq!(s.foreground(), Color::WHITE);
    assert!(s.is_transparent());
    assert_eq!(s.font_size(), 72.0);
    assert_eq!(s.size(), Canvas::new(512, 512));
    assert_eq!(s.font(), &FontSpec::System);
    assert_eq!(s.char_count(), 6);
}

#[test]
fn background_clears_transparency() {
    let s = SceneDescription::builder("x")
        .background(Color::BLACK)
        .build();
    assert!(!s.is_transparent());
    assert_eq!(s.background(), Color::BLACK);
}

#[test]
fn validate_rejects_zero_and_oversized_canvas() {
    let zero = SceneDescription::builder("x").size(0, 10).build();
    assert!(matches!(zero.validate(), Err(KinetypeError::Render(_))));
    let huge = SceneDescription::builder("x").size(70_000, 10).build();
    assert!(matches!(huge.validate(), Err(KinetypeError::Render(_))));
    let bad_font = SceneDescription::builder("x").font_size(0.0).build();
    assert!(matches!(bad_font.validate(), Err(KinetypeError::Render(_))));
    assert!(SceneDescription::builder("x").size(1, 1).build().validate().is_ok());
}

#[test]
fn resized_and_transparency_produce_new_scenes() {
    let s = SceneDescription::builder("x").background(Color::BLUE).build();
    let r = s.resized(Canvas::new(64, 32));
    assert_eq!(r.size(), Canvas::new(64, 32));
    assert_eq!(s.size(), Canvas::new(512, 512));
    assert!(r.with_transparency(true).is_transparent());
    assert!(!s.is_transparent());
}

#[test]
fn parses_json_with_defaults() {
    let json = r##"{
        "text": "Hi",
        "effect": "bounce",
        "foreground": "#ff0000",
        "transparent": false,
        "size": { "width": 200, "height": 100 },
        "font": "builtin"
    }"##;
    let s = SceneDescription::from_reader(json.as_bytes()).unwrap();
    assert_eq!(s.effect(), EffectKind::Bounce);
    assert_eq!(s.foreground(), Color::rgb(255, 0, 0));
    assert_eq!(s.background(), Color::BLUE);
    assert!(!s.is_transparent());
    assert_eq!(s.size(), Canvas::new(200, 100));
    assert_eq!(s.font(), &FontSpec::Builtin);

    let file: SceneDescription =
        serde_json::from_str(r#"{"text":"a","font":{"file":"fonts/a.ttf"}}"#).unwrap();
    assert_eq!(file.font(), &FontSpec::File(PathBuf::from("fonts/a.ttf")));
}

#[test]
fn json_background_implies_opaque_like_the_builder() {
    let s = SceneDescription::from_reader(r##"{"text":"a","background":"#ff0000"}"##.as_bytes())
        .unwrap();
    assert!(!s.is_transparent());
    assert_eq!(s.background(), Color::rgb(255, 0, 0));
    let built = SceneDescription::builder("a")
        .background(Color::rgb(255, 0, 0))
        .build();
    assert_eq!(s.is_transparent(), built.is_transparent());

    let plain = SceneDescription::from_reader(r#"{"text":"a"}"#.as_bytes()).unwrap();
    assert!(plain.is_transparent());
    let explicit = SceneDescription::from_reader(
        r##"{"text":"a","background":"#ff0000","transparent":true}"##.as_bytes(),
    )
    .unwrap();
    assert!(explicit.is_transparent());
}

#[test]
fn json_rejects_unknown_fields() {
    let err = SceneDescription::from_reader(r##"{"text":"a","colour":"#fff"}"##.as_bytes());
    assert!(matches!(err, Err(KinetypeError::Validation(_))));
}

#[test]
fn aspect_ratio_sizes() {
    assert_eq!(AspectRatio::Story.canvas(), Canvas::new(1080, 1920));
    assert_eq!(AspectRatio::Landscape.canvas(), Canvas::new(1920, 1080));
    for a in AspectRatio::ALL {
        let c = a.canvas();
        let r = f64::from(c.width) / f64::from(c.height);
        assert!((r - a.ratio()).abs() < 1e-9);
    }
}
