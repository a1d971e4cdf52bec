//! kinetype renders animated text effects frame by frame and exports them as GIF, APNG or MP4
//! stickers.
//!
//! The pipeline is pull-based and deterministic:
//!
//! - Describe a [`SceneDescription`] (text, effect, colors, size)
//! - Pull frames from a [`FrameScheduler`] running on a virtual clock
//! - Push them into a [`FrameEncoder`] through an [`Exporter`], which owns job state,
//!   cancellation, temp-file cleanup and platform constraints
//!
//! A [`LivePreview`] renders the same scene on the wall clock and can run while an export of
//! that scene is in progress.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

/// Clocks and effect transforms.
pub mod animation;
/// Encoder adapters.
pub mod encode;
/// Export orchestration.
pub mod export;
/// Frame rendering.
pub mod render;
/// Scene model.
pub mod scene;
/// Frame scheduling and live preview.
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Rgba8Premul};
pub use crate::foundation::error::{ErrorKind, KinetypeError, KinetypeResult};

pub use crate::animation::clock::{Clock, VirtualClock, WallClock};
pub use crate::animation::effect::{EffectKind, GlyphTransform};
pub use crate::encode::probe::{ArtifactInfo, ArtifactKind, probe_artifact};
pub use crate::encode::sink::{EncoderConfig, FrameEncoder, InMemoryEncoder};
pub use crate::encode::{EncoderFactory, EncoderOpts, ExportFormat, create_encoder};
pub use crate::export::cancel::CancelToken;
pub use crate::export::exporter::{ExportRequest, ExportTarget, Exporter};
pub use crate::export::job::{ExportJob, JobHandle, JobStatus};
pub use crate::export::pack::{PackReport, StickerItem, StickerPack};
pub use crate::export::platform::{Platform, PlatformProfile};
pub use crate::export::settings::ExportSettings;
pub use crate::render::cpu::{FrameRenderer, render_frame};
pub use crate::render::frame::{FrameRGBA, FrameRequest, RenderedFrame};
pub use crate::scene::color::Color;
pub use crate::scene::model::{AspectRatio, FontSpec, SceneBuilder, SceneDescription};
pub use crate::session::preview::LivePreview;
pub use crate::session::scheduler::{FrameScheduler, Pacing};
