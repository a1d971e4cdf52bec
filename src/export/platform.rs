use crate::encode::ExportFormat;
use crate::foundation::core::Canvas;
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::scene::model::{AspectRatio, SceneDescription};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Built-in messaging platforms with known sticker constraints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// WhatsApp stickers.
    WhatsApp,
    /// Telegram stickers.
    Telegram,
    /// Instagram stories.
    Instagram,
    /// iMessage stickers.
    IMessage,
    /// No particular platform.
    Generic,
}

impl Platform {
    /// Every built-in platform.
    pub const ALL: [Platform; 5] = [
        Platform::WhatsApp,
        Platform::Telegram,
        Platform::Instagram,
        Platform::IMessage,
        Platform::Generic,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::WhatsApp => "WhatsApp",
            Self::Telegram => "Telegram",
            Self::Instagram => "Instagram",
            Self::IMessage => "iMessage",
            Self::Generic => "Generic",
        }
    }

    /// The platform's reference constraints.
    pub fn profile(self) -> PlatformProfile {
        use ExportFormat::{Apng, Gif, Video, WebP};
        let (side_w, side_h, max_file_bytes, formats, requires_transparency, aspect_ratio) =
            match self {
                Self::WhatsApp => (512, 512, 100_000, vec![WebP], true, AspectRatio::Square),
                Self::Telegram => (512, 512, 500_000, vec![WebP, Gif], true, AspectRatio::Square),
                Self::Instagram => (
                    1080,
                    1920,
                    5_000_000,
                    vec![Gif, Video],
                    false,
                    AspectRatio::Story,
                ),
                Self::IMessage => (618, 618, 500_000, vec![Apng, Gif], true, AspectRatio::Square),
                Self::Generic => (
                    1024,
                    1024,
                    1_000_000,
                    vec![Gif, Video, Apng],
                    false,
                    AspectRatio::Square,
                ),
            };
        PlatformProfile {
            name: self.name().to_string(),
            max_width: side_w,
            max_height: side_h,
            max_file_bytes,
            formats,
            requires_transparency,
            aspect_ratio,
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown platform '{s}'"))
    }
}

/// A named bundle of export constraints.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformProfile {
    /// Display name.
    pub name: String,
    /// Output width in pixels.
    pub max_width: u32,
    /// Output height in pixels.
    pub max_height: u32,
    /// Largest accepted artifact in bytes.
    pub max_file_bytes: u64,
    /// Acceptable formats in order of preference.
    pub formats: Vec<ExportFormat>,
    /// Whether the background must be transparent.
    #[serde(default)]
    pub requires_transparency: bool,
    /// Aspect ratio the platform expects.
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

impl PlatformProfile {
    /// Parse a custom profile from JSON.
    pub fn from_reader<R: std::io::Read>(r: R) -> KinetypeResult<Self> {
        let p: Self = serde_json::from_reader(r)
            .map_err(|e| KinetypeError::validation(format!("parse profile JSON: {e}")))?;
        p.validate()?;
        Ok(p)
    }

    /// Parse a custom profile from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> KinetypeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            KinetypeError::validation(format!("open profile JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check that the profile can constrain an export.
    pub fn validate(&self) -> KinetypeResult<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(KinetypeError::validation(format!(
                "profile '{}' max size must be non-zero",
                self.name
            )));
        }
        if self.max_file_bytes == 0 {
            return Err(KinetypeError::validation(format!(
                "profile '{}' max_file_bytes must be > 0",
                self.name
            )));
        }
        if self.formats.is_empty() {
            return Err(KinetypeError::validation(format!(
                "profile '{}' lists no formats",
                self.name
            )));
        }
        Ok(())
    }

    /// Output size the profile forces.
    pub fn max_size(&self) -> Canvas {
        Canvas::new(self.max_width, self.max_height)
    }

    /// First listed format that has an encoder.
    pub fn select_format(&self) -> KinetypeResult<ExportFormat> {
        self.formats
            .iter()
            .copied()
            .find(|f| f.has_adapter())
            .ok_or_else(|| {
                KinetypeError::unsupported_format(format!(
                    "profile '{}' accepts only formats without an encoder ({})",
                    self.name,
                    self.formats
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }

    /// Scene resized to the profile's size, made transparent when the profile requires it.
    pub fn apply_to_scene(&self, scene: &SceneDescription) -> SceneDescription {
        let resized = scene.resized(self.max_size());
        if self.requires_transparency && !resized.is_transparent() {
            resized.with_transparency(true)
        } else {
            resized
        }
    }

    /// Reject artifacts above the size limit.
    pub fn check_file_size(&self, size: u64) -> KinetypeResult<()> {
        if size > self.max_file_bytes {
            return Err(KinetypeError::FileTooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }
}

impl From<Platform> for PlatformProfile {
    fn from(p: Platform) -> Self {
        p.profile()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/platform.rs"]
mod tests;
