use crate::animation::effect::EffectKind;
use crate::foundation::core::{Affine, Rect};
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::render::frame::{FrameRGBA, FrameRequest, RenderedFrame};
use crate::render::raster::{
    blur_rgba8_premul_q16, colorize_rainbow, fill_rgba8, gaussian_kernel_q16,
    premul_over_in_place_opacity,
};
use crate::render::text::{GlyphLayout, GlyphShape, TextLayoutEngine, load_font};
use crate::scene::color::Color;
use crate::scene::model::SceneDescription;

/// CPU rasterizer for one [`SceneDescription`].
///
/// Text layout happens once in [`FrameRenderer::new`]; each [`FrameRenderer::render`] call only
/// applies the effect for the requested time and rasterizes. Output depends only on the scene and
/// the timestamp, so two renderers built from equal scenes produce identical frames.
pub struct FrameRenderer {
    scene: SceneDescription,
    layout: GlyphLayout,
    ctx: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("scene", &self.scene)
            .field("glyphs", &self.layout.glyphs.len())
            .finish_non_exhaustive()
    }
}

impl FrameRenderer {
    /// Validate `scene`, resolve its font and lay out its text.
    pub fn new(scene: &SceneDescription) -> KinetypeResult<Self> {
        scene.validate()?;
        let font = load_font(scene.font())?;
        let layout =
            TextLayoutEngine::new().layout(scene.text(), font.as_ref(), scene.font_size())?;
        Ok(Self {
            scene: scene.clone(),
            layout,
            ctx: None,
        })
    }

    /// The scene this renderer draws.
    pub fn scene(&self) -> &SceneDescription {
        &self.scene
    }

    /// Render the scene at `t` seconds.
    pub fn render(&mut self, t: f64) -> KinetypeResult<FrameRGBA> {
        if !t.is_finite() {
            return Err(KinetypeError::render("frame time must be finite"));
        }
        let size = self.scene.size();
        let (w, h) = (size.width, size.height);
        let w16 = u16::try_from(w).map_err(|_| KinetypeError::render("width exceeds u16"))?;
        let h16 = u16::try_from(h).map_err(|_| KinetypeError::render("height exceeds u16"))?;

        let effect = self.scene.effect();
        let frame_fx = effect.transform(0, t, self.layout.char_count);

        let mut layer = self.draw_text_layer(w16, h16, effect, t)?;

        let (origin_x, _) = self.origin();
        if effect == EffectKind::Rainbow {
            colorize_rainbow(
                &mut layer,
                w,
                origin_x,
                origin_x + f64::from(self.layout.width),
                frame_fx.hue_shift_deg,
            );
        }

        let mut out = vec![0u8; size.rgba_len()];
        if !self.scene.is_transparent() {
            fill_rgba8(&mut out, self.scene.background().with_alpha(255).to_premul().to_array());
        }

        if frame_fx.glow_radius > 0.0 && frame_fx.glow_opacity > 0.0 {
            let radius = frame_fx.glow_radius.ceil() as u32;
            let sigma = (frame_fx.glow_radius / 2.0).max(0.5) as f32;
            let kernel = gaussian_kernel_q16(radius, sigma)?;
            let mut glow = vec![0u8; layer.len()];
            let mut tmp = vec![0u8; layer.len()];
            blur_rgba8_premul_q16(&layer, &mut glow, &mut tmp, w, h, &kernel);
            premul_over_in_place_opacity(&mut out, &glow, frame_fx.glow_opacity as f32)?;
        }
        premul_over_in_place_opacity(&mut out, &layer, 1.0)?;

        FrameRGBA::from_premul(w, h, out)
    }

    /// Render a scheduled frame and tag it with its sequence and time.
    pub fn render_request(&mut self, req: FrameRequest) -> KinetypeResult<RenderedFrame> {
        Ok(RenderedFrame {
            sequence: req.sequence,
            presentation_time: req.timestamp,
            bitmap: self.render(req.timestamp)?,
        })
    }

    fn origin(&self) -> (f64, f64) {
        let size = self.scene.size();
        (
            (f64::from(size.width) - f64::from(self.layout.width)) / 2.0,
            (f64::from(size.height) - f64::from(self.layout.height)) / 2.0,
        )
    }

    /// Rasterize the visible glyphs, each displaced by its effect offset, into a premultiplied
    /// buffer on transparent black.
    fn draw_text_layer(
        &mut self,
        w16: u16,
        h16: u16,
        effect: EffectKind,
        t: f64,
    ) -> KinetypeResult<Vec<u8>> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w16 && ctx.height() == h16 => ctx,
            _ => vello_cpu::RenderContext::new(w16, h16),
        };
        ctx.reset();

        // Rainbow recolors coverage afterwards.
        let paint = if effect == EffectKind::Rainbow {
            Color::WHITE
        } else {
            self.scene.foreground()
        };
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            paint.r, paint.g, paint.b, paint.a,
        ));

        let (ox, oy) = self.origin();
        let text_len = self.layout.char_count;
        for g in &self.layout.glyphs {
            let fx = effect.transform(g.char_index, t, text_len);
            if g.char_index >= fx.visible_chars {
                continue;
            }
            ctx.set_transform(affine_to_cpu(Affine::translate((ox, oy + fx.offset_y))));
            match g.shape {
                GlyphShape::Outline { id, font } => {
                    if let Some(font) = self.layout.fonts.get(font) {
                        ctx.glyph_run(font)
                            .font_size(self.layout.font_size)
                            .fill_glyphs(std::iter::once(vello_cpu::Glyph {
                                id,
                                x: g.x,
                                y: g.y,
                            }));
                    }
                }
                GlyphShape::Block => {
                    ctx.fill_rect(&rect_to_cpu(self.layout.block_rect(g)));
                }
                GlyphShape::Blank => {}
            }
        }

        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);
        Ok(pixmap.data_as_u8_slice().to_vec())
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

/// Render `scene` at `t` seconds with a fresh renderer.
///
/// Prefer [`FrameRenderer`] when rendering more than one frame of the same scene.
pub fn render_frame(scene: &SceneDescription, t: f64) -> KinetypeResult<FrameRGBA> {
    FrameRenderer::new(scene)?.render(t)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
