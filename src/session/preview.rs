use crate::animation::clock::{Clock, WallClock};
use crate::foundation::error::KinetypeResult;
use crate::render::cpu::FrameRenderer;
use crate::render::frame::FrameRGBA;
use crate::scene::model::SceneDescription;

/// Live on-screen animation of a scene, driven by its own clock.
///
/// A preview owns its renderer and clock, so it can run on another thread while an export of
/// the same scene is in progress without affecting the exported frames.
pub struct LivePreview<C: Clock = WallClock> {
    renderer: FrameRenderer,
    clock: C,
}

impl LivePreview<WallClock> {
    /// Preview `scene` on a wall clock starting now.
    pub fn new(scene: &SceneDescription) -> KinetypeResult<Self> {
        Self::with_clock(scene, WallClock::start())
    }
}

impl<C: Clock> LivePreview<C> {
    /// Preview `scene` on a caller-supplied clock.
    pub fn with_clock(scene: &SceneDescription, clock: C) -> KinetypeResult<Self> {
        Ok(Self {
            renderer: FrameRenderer::new(scene)?,
            clock,
        })
    }

    /// Seconds elapsed on the preview clock.
    pub fn elapsed(&self) -> f64 {
        self.clock.now()
    }

    /// Render the frame for the current clock time. Returns the time used and the pixels.
    pub fn frame(&mut self) -> KinetypeResult<(f64, FrameRGBA)> {
        let t = self.clock.now();
        Ok((t, self.renderer.render(t)?))
    }

    /// The clock driving this preview.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}
