//! Time sources and effect transforms.

/// Monotonic clocks for preview and export.
pub mod clock;
/// Effect sum type and its pure per-character transforms.
pub mod effect;
