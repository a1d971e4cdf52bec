use crate::foundation::core::Rect;
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::scene::model::FontSpec;
use std::path::Path;
use std::sync::{Arc, OnceLock};

const BLOCK_ADVANCE_EM: f32 = 0.6;
const BLOCK_WIDTH_EM: f32 = 0.5;
const BLOCK_HEIGHT_EM: f32 = 0.7;
const BLOCK_BASELINE_EM: f32 = 0.85;
const BLOCK_LINE_EM: f32 = 1.2;

/// Raw font file bytes plus the face index inside the file.
#[derive(Clone, Debug)]
pub(crate) struct LoadedFont {
    pub(crate) bytes: Arc<Vec<u8>>,
    pub(crate) index: u32,
}

/// Resolve a [`FontSpec`] to font bytes. `None` means block glyphs.
pub(crate) fn load_font(spec: &FontSpec) -> KinetypeResult<Option<LoadedFont>> {
    match spec {
        FontSpec::Builtin => Ok(None),
        FontSpec::System => Ok(system_font().cloned()),
        FontSpec::File(path) => read_font_file(path).map(Some),
    }
}

fn read_font_file(path: &Path) -> KinetypeResult<LoadedFont> {
    let bytes = std::fs::read(path)
        .map_err(|e| KinetypeError::render(format!("read font '{}': {e}", path.display())))?;
    Ok(LoadedFont {
        bytes: Arc::new(bytes),
        index: 0,
    })
}

/// First sans-serif face from the system font database, looked up once per process.
fn system_font() -> Option<&'static LoadedFont> {
    static SYSTEM_FONT: OnceLock<Option<LoadedFont>> = OnceLock::new();
    SYSTEM_FONT
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            let query = usvg::fontdb::Query {
                families: &[usvg::fontdb::Family::SansSerif],
                ..Default::default()
            };
            let found = db.query(&query).and_then(|id| {
                db.with_face_data(id, |data, index| LoadedFont {
                    bytes: Arc::new(data.to_vec()),
                    index,
                })
            });
            if found.is_none() {
                tracing::debug!(
                    faces = db.len(),
                    "no system sans-serif font, using block glyphs"
                );
            }
            found
        })
        .as_ref()
}

/// How one laid-out glyph is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum GlyphShape {
    /// Glyph `id` of `GlyphLayout::fonts[font]`.
    Outline { id: u32, font: usize },
    /// Filled rectangle of the block fallback.
    Block,
    /// Whitespace in the block fallback.
    Blank,
}

/// A glyph positioned relative to the layout origin. `y` is the baseline.
///
/// `char_index` is the code point index of the first character of the glyph's cluster, so every
/// glyph of a ligature shares the index of the ligature's first character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlacedGlyph {
    pub(crate) shape: GlyphShape,
    pub(crate) char_index: usize,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

/// Time-independent text layout reused for every frame of a scene.
#[derive(Clone, Debug)]
pub(crate) struct GlyphLayout {
    pub(crate) glyphs: Vec<PlacedGlyph>,
    /// Code points in the laid-out text, which can exceed `glyphs.len()`.
    pub(crate) char_count: usize,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) font_size: f32,
    /// Faces referenced by outline glyphs, including fallback faces picked during shaping.
    pub(crate) fonts: Vec<vello_cpu::peniko::FontData>,
}

impl GlyphLayout {
    /// Block rectangle of a glyph standing on its baseline.
    pub(crate) fn block_rect(&self, g: &PlacedGlyph) -> Rect {
        let s = f64::from(self.font_size);
        let x0 = f64::from(g.x);
        let y1 = f64::from(g.y);
        Rect::new(
            x0,
            y1 - s * f64::from(BLOCK_HEIGHT_EM),
            x0 + s * f64::from(BLOCK_WIDTH_EM),
            y1,
        )
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Lay out one line of text, with a font or with block glyphs when `font` is `None`.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        font: Option<&LoadedFont>,
        size_px: f32,
    ) -> KinetypeResult<GlyphLayout> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(KinetypeError::render("font size must be finite and > 0"));
        }
        match font {
            Some(font) => self.layout_outline(text, font, size_px),
            None => Ok(layout_blocks(text, size_px)),
        }
    }

    fn layout_outline(
        &mut self,
        text: &str,
        font: &LoadedFont,
        size_px: f32,
    ) -> KinetypeResult<GlyphLayout> {
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        // Collections register every face; prefer the family holding the requested one.
        let family_id = families
            .iter()
            .find(|(_, faces)| faces.iter().any(|f| f.index() == font.index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| KinetypeError::render("no font families registered from font bytes"))?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| KinetypeError::render("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        // Byte offset of every code point, for mapping cluster ranges to character indices.
        let char_starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        let mut glyphs = Vec::new();
        let mut fonts: Vec<vello_cpu::peniko::FontData> = Vec::new();
        for line in layout.lines() {
            let line_range = line.text_range();
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let run_font = run.run().font();
                let font = match fonts.iter().position(|f| f == run_font) {
                    Some(i) => i,
                    None => {
                        fonts.push(run_font.clone());
                        fonts.len() - 1
                    }
                };
                let baseline = run.baseline();
                let mut x = run.offset();
                let clusters = run
                    .run()
                    .visual_clusters()
                    .filter(|c| line_range.contains(&c.text_range().start));
                for cluster in clusters {
                    let start = cluster.text_range().start;
                    let char_index = char_starts.partition_point(|&b| b < start);
                    for g in cluster.glyphs() {
                        glyphs.push(PlacedGlyph {
                            shape: GlyphShape::Outline { id: g.id, font },
                            char_index,
                            x: x + g.x,
                            y: baseline + g.y,
                        });
                        x += g.advance;
                    }
                }
            }
        }

        Ok(GlyphLayout {
            glyphs,
            char_count: char_starts.len(),
            width: layout.width(),
            height: layout.height(),
            font_size: size_px,
            fonts,
        })
    }
}

fn layout_blocks(text: &str, size_px: f32) -> GlyphLayout {
    let advance = size_px * BLOCK_ADVANCE_EM;
    let baseline = size_px * BLOCK_BASELINE_EM;
    let glyphs: Vec<PlacedGlyph> = text
        .chars()
        .enumerate()
        .map(|(i, ch)| PlacedGlyph {
            shape: if ch.is_whitespace() {
                GlyphShape::Blank
            } else {
                GlyphShape::Block
            },
            char_index: i,
            x: i as f32 * advance,
            y: baseline,
        })
        .collect();
    GlyphLayout {
        width: glyphs.len() as f32 * advance,
        char_count: glyphs.len(),
        glyphs,
        height: size_px * BLOCK_LINE_EM,
        font_size: size_px,
        fonts: Vec::new(),
    }
}
