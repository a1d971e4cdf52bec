use crate::animation::clock::{Clock, VirtualClock, WallClock};
use crate::foundation::core::{FrameIndex, Fps};
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::render::cpu::FrameRenderer;
use crate::render::frame::{FrameRequest, RenderedFrame};
use crate::scene::model::SceneDescription;
use std::time::Duration;

/// How the scheduler spaces frames in wall-clock time.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Yield frames as fast as they render. Frames only depend on their timestamp.
    #[default]
    Virtual,
    /// Hold each frame until its presentation time has elapsed on the wall clock.
    RealTime,
}

/// `round(duration_secs * fps)`, validated.
pub fn total_frames(duration_secs: f64, fps: Fps) -> KinetypeResult<u64> {
    let fps = fps.validate()?;
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(KinetypeError::validation(format!(
            "duration must be finite and > 0, got {duration_secs}"
        )));
    }
    let frames = fps.secs_to_frames_round(duration_secs);
    if frames == 0 {
        return Err(KinetypeError::validation(format!(
            "duration {duration_secs}s is shorter than one frame at {} fps",
            fps.as_f64()
        )));
    }
    Ok(frames)
}

/// Lazy, finite, fixed-rate sequence of [`RenderedFrame`]s for one scene.
///
/// Frame `n` is rendered at `n / fps` seconds of virtual time. The iterator is not restartable
/// and stops for good after the first render error. Dropping it early is the way to cancel.
pub struct FrameScheduler {
    renderer: FrameRenderer,
    fps: Fps,
    total: u64,
    next: FrameIndex,
    clock: VirtualClock,
    pacing: Pacing,
    wall: Option<WallClock>,
    failed: bool,
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("fps", &self.fps)
            .field("total", &self.total)
            .field("next", &self.next)
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}

impl FrameScheduler {
    /// Prepare a schedule of `round(duration_secs * fps)` frames of `scene`.
    ///
    /// Fails with a render error if the scene cannot be rendered, so no frame is ever produced
    /// for an invalid scene.
    pub fn new(
        scene: &SceneDescription,
        duration_secs: f64,
        fps: Fps,
        pacing: Pacing,
    ) -> KinetypeResult<Self> {
        let total = total_frames(duration_secs, fps)?;
        let renderer = FrameRenderer::new(scene)?;
        tracing::debug!(total, fps = fps.as_f64(), ?pacing, "frame schedule ready");
        Ok(Self {
            renderer,
            fps,
            total,
            next: FrameIndex(0),
            clock: VirtualClock::new(),
            pacing,
            wall: None,
            failed: false,
        })
    }

    /// Number of frames the schedule yields in total.
    pub fn total_frames(&self) -> u64 {
        self.total
    }

    /// Frame rate of the schedule.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    fn wait_for_presentation(&mut self, ts: f64) {
        if self.pacing != Pacing::RealTime {
            return;
        }
        let wall = *self.wall.get_or_insert_with(WallClock::start);
        let ahead = ts - wall.now();
        if ahead > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(ahead));
        }
    }
}

impl Iterator for FrameScheduler {
    type Item = KinetypeResult<RenderedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next.0 >= self.total {
            return None;
        }
        let seq = self.next;
        let ts = self.clock.advance_to_frame(seq, self.fps);
        self.wait_for_presentation(ts);

        let req = FrameRequest {
            timestamp: ts,
            sequence: seq,
        };
        match self.renderer.render_request(req) {
            Ok(frame) => {
                self.next = seq.next();
                Some(Ok(frame))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let left = usize::try_from(self.total - self.next.0).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

impl std::iter::FusedIterator for FrameScheduler {}

/// Start a virtual-time schedule of `scene` over `duration_secs` at `fps`.
pub fn run(scene: &SceneDescription, duration_secs: f64, fps: Fps) -> KinetypeResult<FrameScheduler> {
    FrameScheduler::new(scene, duration_secs, fps, Pacing::Virtual)
}

#[cfg(test)]
#[path = "../../tests/unit/session/scheduler.rs"]
mod tests;
