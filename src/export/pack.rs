use crate::animation::effect::EffectKind;
use crate::encode::ExportFormat;
use crate::export::cancel::CancelToken;
use crate::export::exporter::{ExportRequest, ExportTarget, Exporter};
use crate::export::job::ExportJob;
use crate::export::platform::Platform;
use crate::export::settings::ExportSettings;
use crate::foundation::error::{ErrorKind, KinetypeError, KinetypeResult};
use crate::scene::color::Color;
use crate::scene::model::{AspectRatio, FontSpec, SceneDescription};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

fn default_font_size() -> f32 {
    48.0
}

fn default_true() -> bool {
    true
}

fn default_text_color() -> Color {
    Color::WHITE
}

fn default_background() -> Color {
    Color::BLUE
}

fn default_format() -> ExportFormat {
    ExportFormat::Gif
}

/// One sticker definition in a pack.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StickerItem {
    /// Sticker text.
    pub text: String,
    /// Animation.
    #[serde(default)]
    pub effect: EffectKind,
    /// Text color.
    #[serde(default = "default_text_color")]
    pub text_color: Color,
    /// Background color, used when the sticker is not transparent.
    #[serde(default = "default_background")]
    pub background_color: Color,
    /// Font size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Keep the background transparent.
    #[serde(default = "default_true")]
    pub transparent: bool,
    /// Output size preset.
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Output format when the pack has no platform.
    #[serde(default = "default_format")]
    pub format: ExportFormat,
    /// Glyph source.
    #[serde(default)]
    pub font: FontSpec,
}

impl StickerItem {
    /// Transparent GIF sticker with default styling.
    pub fn new(text: impl Into<String>, effect: EffectKind) -> Self {
        Self {
            text: text.into(),
            effect,
            text_color: default_text_color(),
            background_color: default_background(),
            font_size: default_font_size(),
            transparent: true,
            aspect_ratio: AspectRatio::Square,
            format: default_format(),
            font: FontSpec::System,
        }
    }

    /// Scene this sticker renders.
    pub fn to_scene(&self) -> SceneDescription {
        SceneDescription::builder(self.text.clone())
            .effect(self.effect)
            .foreground(self.text_color)
            .background(self.background_color)
            .transparent(self.transparent)
            .font_size(self.font_size)
            .aspect_ratio(self.aspect_ratio)
            .font(self.font.clone())
            .build()
    }

    /// File stem derived from the text: lowercase ASCII alphanumerics joined by `-`.
    fn slug(&self) -> String {
        let mut out = String::new();
        for word in self
            .text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            if !out.is_empty() {
                out.push('-');
            }
            out.push_str(&word.to_ascii_lowercase());
        }
        if out.is_empty() {
            out.push_str("sticker");
        }
        out.truncate(32);
        out
    }
}

/// A named set of stickers exported together.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StickerPack {
    /// Pack name.
    pub name: String,
    /// Stickers in export order.
    pub stickers: Vec<StickerItem>,
    /// Platform every sticker targets. `None` exports each sticker in its own format.
    #[serde(default)]
    pub platform: Option<Platform>,
}

impl StickerPack {
    /// Parse a pack from JSON.
    pub fn from_reader<R: std::io::Read>(r: R) -> KinetypeResult<Self> {
        let pack: Self = serde_json::from_reader(r)
            .map_err(|e| KinetypeError::validation(format!("parse pack JSON: {e}")))?;
        if pack.stickers.is_empty() {
            return Err(KinetypeError::validation(format!(
                "pack '{}' has no stickers",
                pack.name
            )));
        }
        Ok(pack)
    }

    /// Parse a pack from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> KinetypeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            KinetypeError::validation(format!("open pack JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    fn request_for(
        &self,
        idx: usize,
        item: &StickerItem,
        dir: &Path,
        settings: ExportSettings,
    ) -> ExportRequest {
        let target = match self.platform {
            Some(p) => ExportTarget::from(p),
            None => ExportTarget::Format(item.format),
        };
        let ext = match &target {
            ExportTarget::Format(f) => f.extension(),
            ExportTarget::Platform(profile) => profile
                .select_format()
                .unwrap_or(item.format)
                .extension(),
        };
        let output = dir.join(format!("{:02}-{}.{ext}", idx + 1, item.slug()));
        ExportRequest::new(item.to_scene(), target, output).with_settings(settings)
    }
}

/// Outcome of [`Exporter::export_pack`].
#[derive(Clone, Debug)]
pub struct PackReport {
    /// Pack name.
    pub name: String,
    /// One terminal job per attempted sticker, in pack order.
    pub jobs: Vec<ExportJob>,
}

impl PackReport {
    /// Paths of the stickers that were written.
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.jobs
            .iter()
            .filter(|j| j.is_succeeded())
            .map(|j| j.output().to_path_buf())
            .collect()
    }

    /// Number of stickers that failed.
    pub fn failures(&self) -> usize {
        self.jobs.iter().filter(|j| !j.is_succeeded()).count()
    }
}

impl Exporter {
    /// Export every sticker of `pack` into `dir`, named `NN-slug.ext`.
    ///
    /// A failing sticker does not stop the pack. Cancellation stops after the current sticker.
    #[tracing::instrument(skip_all, fields(pack = %pack.name))]
    pub fn export_pack(
        &self,
        pack: &StickerPack,
        dir: impl AsRef<Path>,
        settings: ExportSettings,
        cancel: &CancelToken,
    ) -> KinetypeResult<PackReport> {
        use anyhow::Context as _;

        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create pack directory '{}'", dir.display()))?;
        let mut jobs = Vec::with_capacity(pack.stickers.len());
        for (idx, item) in pack.stickers.iter().enumerate() {
            let req = pack.request_for(idx, item, dir, settings);
            let job = self.export_with(&req, cancel, &mut |_| {});
            let cancelled = job.error_kind() == Some(ErrorKind::Cancelled);
            jobs.push(job);
            if cancelled {
                tracing::debug!(done = jobs.len(), "pack export cancelled");
                break;
            }
        }
        Ok(PackReport {
            name: pack.name.clone(),
            jobs,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pack.rs"]
mod tests;
