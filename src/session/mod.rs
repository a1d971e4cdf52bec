//! Frame sequencing for export and live preview.

/// Wall-clock live preview.
pub mod preview;
/// Fixed-rate frame sequences for export.
pub mod scheduler;
