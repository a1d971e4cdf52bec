//! Scene descriptions: the immutable input to every render.

/// Straight-alpha colors with flexible JSON forms.
pub mod color;
/// Scene description, builder and presets.
pub mod model;
