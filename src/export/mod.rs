//! Export orchestration: format and platform selection, job state, cancellation and the
//! one-export-at-a-time [`exporter::Exporter`].

/// Cooperative cancellation flag.
pub mod cancel;
/// The orchestrator and its request types.
pub mod exporter;
/// Job state, status and the threaded job handle.
pub mod job;
/// Sticker packs exported as a batch.
pub mod pack;
/// Platform sticker constraints.
pub mod platform;
/// Timing and tuning of one export.
pub mod settings;
