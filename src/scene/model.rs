use crate::animation::effect::EffectKind;
use crate::foundation::core::Canvas;
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::scene::color::Color;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

const DEFAULT_FONT_SIZE_PX: f32 = 72.0;
const MAX_CANVAS_SIDE: u32 = u16::MAX as u32;

/// Where glyph outlines come from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSpec {
    /// First sans-serif face found in the system font database, falling back to
    /// [`FontSpec::Builtin`] when none is installed.
    #[default]
    System,
    /// Built-in block glyphs. Independent of installed fonts.
    Builtin,
    /// A TrueType/OpenType file on disk.
    File(PathBuf),
}

/// Sticker aspect ratio presets with their canonical pixel sizes.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// 1:1, 512x512.
    #[default]
    Square,
    /// 9:16, 1080x1920.
    Portrait,
    /// 16:9, 1920x1080.
    Landscape,
    /// 9:16 story format, 1080x1920.
    Story,
    /// 1:1 chat sticker, 512x512.
    Chat,
}

impl AspectRatio {
    /// Every preset.
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Landscape,
        AspectRatio::Story,
        AspectRatio::Chat,
    ];

    /// Width divided by height.
    pub fn ratio(self) -> f64 {
        match self {
            Self::Square | Self::Chat => 1.0,
            Self::Portrait | Self::Story => 9.0 / 16.0,
            Self::Landscape => 16.0 / 9.0,
        }
    }

    /// Canonical canvas size for this preset.
    pub fn canvas(self) -> Canvas {
        match self {
            Self::Square | Self::Chat => Canvas::new(512, 512),
            Self::Portrait | Self::Story => Canvas::new(1080, 1920),
            Self::Landscape => Canvas::new(1920, 1080),
        }
    }
}

/// Immutable description of what one export renders.
///
/// Build with [`SceneDescription::builder`] or parse from JSON. Changing any parameter means
/// building a new description; the type has no mutating methods.
///
/// In JSON, `transparent` defaults to `true` unless a `background` is given, matching
/// [`SceneBuilder::background`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "SceneJson")]
pub struct SceneDescription {
    text: String,
    effect: EffectKind,
    foreground: Color,
    background: Color,
    transparent: bool,
    font_size: f32,
    size: Canvas,
    font: FontSpec,
}

/// Wire form of [`SceneDescription`]; tracks whether `background` and `transparent` were given.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneJson {
    text: String,
    #[serde(default)]
    effect: EffectKind,
    #[serde(default = "default_foreground")]
    foreground: Color,
    #[serde(default)]
    background: Option<Color>,
    #[serde(default)]
    transparent: Option<bool>,
    #[serde(default = "default_font_size")]
    font_size: f32,
    #[serde(default = "default_size")]
    size: Canvas,
    #[serde(default)]
    font: FontSpec,
}

impl From<SceneJson> for SceneDescription {
    fn from(j: SceneJson) -> Self {
        Self {
            transparent: j.transparent.unwrap_or(j.background.is_none()),
            background: j.background.unwrap_or_else(default_background),
            text: j.text,
            effect: j.effect,
            foreground: j.foreground,
            font_size: j.font_size,
            size: j.size,
            font: j.font,
        }
    }
}

fn default_foreground() -> Color {
    Color::WHITE
}

fn default_background() -> Color {
    Color::BLUE
}

fn default_transparent() -> bool {
    true
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE_PX
}

fn default_size() -> Canvas {
    AspectRatio::Square.canvas()
}

impl SceneDescription {
    /// Start building a scene for `text` with sticker defaults (white text, transparent
    /// background, 72px, 512x512, system font).
    pub fn builder(text: impl Into<String>) -> SceneBuilder {
        SceneBuilder {
            scene: Self {
                text: text.into(),
                effect: EffectKind::None,
                foreground: default_foreground(),
                background: default_background(),
                transparent: default_transparent(),
                font_size: default_font_size(),
                size: default_size(),
                font: FontSpec::System,
            },
        }
    }

    /// Parse a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> KinetypeResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| KinetypeError::validation(format!("parse scene JSON: {e}")))
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> KinetypeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            KinetypeError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check that the scene can be rasterized.
    pub fn validate(&self) -> KinetypeResult<()> {
        if self.size.is_empty() {
            return Err(KinetypeError::render(format!(
                "canvas must have positive dimensions, got {}",
                self.size
            )));
        }
        if self.size.width > MAX_CANVAS_SIDE || self.size.height > MAX_CANVAS_SIDE {
            return Err(KinetypeError::render(format!(
                "canvas {} exceeds the {MAX_CANVAS_SIDE}px limit",
                self.size
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(KinetypeError::render("font size must be finite and > 0"));
        }
        Ok(())
    }

    /// Display text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of code points in the text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Animated effect.
    pub fn effect(&self) -> EffectKind {
        self.effect
    }

    /// Text color.
    pub fn foreground(&self) -> Color {
        self.foreground
    }

    /// Background color, used only when the scene is not transparent.
    pub fn background(&self) -> Color {
        self.background
    }

    /// Whether the background is fully transparent.
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Font size in pixels.
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Output size in pixels.
    pub fn size(&self) -> Canvas {
        self.size
    }

    /// Glyph source.
    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    /// Copy of this scene rendered at a different size.
    pub fn resized(&self, size: Canvas) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    /// Copy of this scene with the transparency flag replaced.
    pub fn with_transparency(&self, transparent: bool) -> Self {
        Self {
            transparent,
            ..self.clone()
        }
    }
}

/// Builder for [`SceneDescription`].
#[derive(Clone, Debug)]
pub struct SceneBuilder {
    scene: SceneDescription,
}

impl SceneBuilder {
    /// Set the effect.
    pub fn effect(mut self, effect: EffectKind) -> Self {
        self.scene.effect = effect;
        self
    }

    /// Set the text color.
    pub fn foreground(mut self, color: Color) -> Self {
        self.scene.foreground = color;
        self
    }

    /// Set an opaque background color (clears the transparency flag).
    pub fn background(mut self, color: Color) -> Self {
        self.scene.background = color;
        self.scene.transparent = false;
        self
    }

    /// Set the transparency flag.
    pub fn transparent(mut self, transparent: bool) -> Self {
        self.scene.transparent = transparent;
        self
    }

    /// Set the font size in pixels.
    pub fn font_size(mut self, px: f32) -> Self {
        self.scene.font_size = px;
        self
    }

    /// Set the output size in pixels.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.scene.size = Canvas::new(width, height);
        self
    }

    /// Use the canonical size of an aspect ratio preset.
    pub fn aspect_ratio(mut self, aspect: AspectRatio) -> Self {
        self.scene.size = aspect.canvas();
        self
    }

    /// Set the glyph source.
    pub fn font(mut self, font: FontSpec) -> Self {
        self.scene.font = font;
        self
    }

    /// Finish building. Validation happens when the scene is rendered.
    pub fn build(self) -> SceneDescription {
        self.scene
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
