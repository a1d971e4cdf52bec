use crate::foundation::core::{FrameIndex, Fps};
use std::time::Instant;

/// Monotonic time source in seconds since the clock started.
pub trait Clock {
    /// Elapsed seconds, never decreasing between calls.
    fn now(&self) -> f64;
}

/// Wall-clock time, used for live preview.
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    /// Start a clock at zero now.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for WallClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Explicitly stepped clock, used for export sampling.
///
/// Time only moves when the owner advances it, so rendered frames do not depend on how long
/// rendering took.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VirtualClock {
    now: f64,
}

impl VirtualClock {
    /// A clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock to `t`. Earlier or non-finite values are ignored.
    pub fn advance_to(&mut self, t: f64) {
        if t.is_finite() && t > self.now {
            self.now = t;
        }
    }

    /// Move the clock to the presentation time of `frame` at `fps`.
    pub fn advance_to_frame(&mut self, frame: FrameIndex, fps: Fps) -> f64 {
        self.advance_to(fps.frames_to_secs(frame.0));
        self.now
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> f64 {
        self.now
    }
}
