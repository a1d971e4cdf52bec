//! Per-character effect transforms.
//!
//! Every effect is a pure function of `(character index, time, text length)`. Export sampling and
//! live preview share these functions; the only difference is where `time` comes from.

use std::f64::consts::TAU;

const BOUNCE_AMPLITUDE_PX: f64 = 10.0;
const BOUNCE_SPEED: f64 = 2.0;
const BOUNCE_PHASE_PER_CHAR: f64 = 0.3;

const WAVE_AMPLITUDE_PX: f64 = 8.0;
const WAVE_SPEED: f64 = 2.0;
const WAVE_PHASE_PER_CHAR: f64 = 0.5;

const GLOW_BASE_RADIUS_PX: f64 = 5.0;
const GLOW_RADIUS_SWING_PX: f64 = 8.0;
const GLOW_SPEED: f64 = 3.0;
const GLOW_OPACITY_MIN: f64 = 0.3;
const GLOW_OPACITY_MAX: f64 = 0.8;
const GLOW_OPACITY_PERIOD_SECS: f64 = 1.5;

/// Seconds between two typewriter reveals.
pub const TYPEWRITER_REVEAL_SECS: f64 = 0.1;
/// Seconds the fully revealed text is held before the cycle restarts.
pub const TYPEWRITER_HOLD_SECS: f64 = 1.0;

/// Seconds for one full rainbow hue revolution.
pub const RAINBOW_PERIOD_SECS: f64 = 3.0;

/// Animated text effect.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Static text.
    #[default]
    None,
    /// Characters bob vertically with a per-character phase delay.
    Bounce,
    /// Gentler, longer-phase vertical wave.
    Wave,
    /// Pulsing blurred shadow in the text color.
    Glow,
    /// Characters are revealed one by one, held, then the cycle repeats.
    Typewriter,
    /// Six-stop horizontal gradient with a rotating hue.
    Rainbow,
}

/// Result of sampling an effect for one character at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphTransform {
    /// Vertical offset in pixels (positive is down).
    pub offset_y: f64,
    /// Hue rotation in degrees applied to the character color.
    pub hue_shift_deg: f64,
    /// Glow shadow radius in pixels (0 disables the glow).
    pub glow_radius: f64,
    /// Glow shadow opacity in `[0, 1]`.
    pub glow_opacity: f64,
    /// Number of leading characters that are visible.
    pub visible_chars: usize,
}

impl EffectKind {
    /// Every effect, in display order.
    pub const ALL: [EffectKind; 6] = [
        EffectKind::None,
        EffectKind::Bounce,
        EffectKind::Wave,
        EffectKind::Glow,
        EffectKind::Typewriter,
        EffectKind::Rainbow,
    ];

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bounce => "Bounce",
            Self::Wave => "Wave",
            Self::Glow => "Glow",
            Self::Typewriter => "Typewriter",
            Self::Rainbow => "Rainbow",
        }
    }

    /// Return `true` when frames of this effect change over time.
    pub fn is_animated(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Sample the effect for character `index` of a `text_len`-character string at `time`
    /// seconds.
    pub fn transform(self, index: usize, time: f64, text_len: usize) -> GlyphTransform {
        let t = if time.is_finite() { time } else { 0.0 };
        let i = index as f64;
        let mut out = GlyphTransform {
            offset_y: 0.0,
            hue_shift_deg: 0.0,
            glow_radius: 0.0,
            glow_opacity: 0.0,
            visible_chars: text_len,
        };
        match self {
            Self::None => {}
            Self::Bounce => {
                out.offset_y =
                    (t * BOUNCE_SPEED + i * BOUNCE_PHASE_PER_CHAR).sin() * BOUNCE_AMPLITUDE_PX;
            }
            Self::Wave => {
                out.offset_y = (t * WAVE_SPEED + i * WAVE_PHASE_PER_CHAR).sin() * WAVE_AMPLITUDE_PX;
            }
            Self::Glow => {
                out.glow_radius = glow_radius(t);
                out.glow_opacity = glow_opacity(t);
            }
            Self::Typewriter => {
                out.visible_chars = typewriter_visible_chars(t, text_len);
            }
            Self::Rainbow => {
                out.hue_shift_deg = rainbow_hue_shift_deg(t);
            }
        }
        out
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for EffectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown effect '{s}'"))
    }
}

/// Glow shadow radius at `t`, never negative.
pub fn glow_radius(t: f64) -> f64 {
    (GLOW_BASE_RADIUS_PX + (t * GLOW_SPEED).sin() * GLOW_RADIUS_SWING_PX).max(0.0)
}

/// Glow opacity at `t`: starts at the minimum and peaks half a period later.
pub fn glow_opacity(t: f64) -> f64 {
    let mid = (GLOW_OPACITY_MIN + GLOW_OPACITY_MAX) / 2.0;
    let amp = (GLOW_OPACITY_MAX - GLOW_OPACITY_MIN) / 2.0;
    mid - amp * (TAU * t / GLOW_OPACITY_PERIOD_SECS).cos()
}

/// Length in seconds of one typewriter cycle (reveal plus hold).
pub fn typewriter_cycle_secs(text_len: usize) -> f64 {
    text_len as f64 * TYPEWRITER_REVEAL_SECS + TYPEWRITER_HOLD_SECS
}

/// Number of characters revealed at `t`.
///
/// One character appears every [`TYPEWRITER_REVEAL_SECS`] until the text is complete, the full
/// text holds for [`TYPEWRITER_HOLD_SECS`], then the count drops back to zero.
pub fn typewriter_visible_chars(t: f64, text_len: usize) -> usize {
    if text_len == 0 || t < 0.0 {
        return 0;
    }
    let local = t.rem_euclid(typewriter_cycle_secs(text_len));
    // Frame timestamps like 0.3 are not exact multiples of 0.1 in binary.
    let steps = (local / TYPEWRITER_REVEAL_SECS + 1e-9).floor();
    (steps as usize).min(text_len)
}

/// Uniform rainbow hue rotation in degrees at `t`, in `[0, 360)`.
pub fn rainbow_hue_shift_deg(t: f64) -> f64 {
    t.rem_euclid(RAINBOW_PERIOD_SECS) / RAINBOW_PERIOD_SECS * 360.0
}

#[cfg(test)]
#[path = "../../tests/unit/animation/effect.rs"]
mod tests;
