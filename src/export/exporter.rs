use crate::encode::backoff::append_with_backoff;
use crate::encode::sink::{EncoderConfig, FrameEncoder, ensure_parent_dir};
use crate::encode::{EncoderFactory, ExportFormat, create_encoder};
use crate::export::cancel::CancelToken;
use crate::export::job::{ExportJob, JobHandle};
use crate::export::platform::{Platform, PlatformProfile};
use crate::export::settings::ExportSettings;
use crate::foundation::error::{KinetypeError, KinetypeResult};
use crate::render::cpu::render_frame;
use crate::scene::model::SceneDescription;
use crate::session::scheduler::FrameScheduler;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// What an export should produce.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportTarget {
    /// A specific container.
    Format(ExportFormat),
    /// Whatever the profile accepts, at its size, within its file limit.
    Platform(PlatformProfile),
}

impl From<ExportFormat> for ExportTarget {
    fn from(f: ExportFormat) -> Self {
        Self::Format(f)
    }
}

impl From<PlatformProfile> for ExportTarget {
    fn from(p: PlatformProfile) -> Self {
        Self::Platform(p)
    }
}

impl From<Platform> for ExportTarget {
    fn from(p: Platform) -> Self {
        Self::Platform(p.profile())
    }
}

/// One export: a scene, a target, an output path and timing.
#[derive(Clone, Debug)]
pub struct ExportRequest {
    /// Scene to animate.
    pub scene: SceneDescription,
    /// Format or platform.
    pub target: ExportTarget,
    /// Final artifact path. Only written on success.
    pub output: PathBuf,
    /// Duration, rate and encoder tuning.
    pub settings: ExportSettings,
}

impl ExportRequest {
    /// Request with default settings.
    pub fn new(
        scene: SceneDescription,
        target: impl Into<ExportTarget>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            scene,
            target: target.into(),
            output: output.into(),
            settings: ExportSettings::default(),
        }
    }

    /// Same request with different settings.
    pub fn with_settings(mut self, settings: ExportSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Resolved request: concrete format, adjusted scene, frame count, size limit.
#[derive(Debug)]
struct ExportPlan {
    format: ExportFormat,
    scene: SceneDescription,
    total_frames: u64,
    size_limit: Option<PlatformProfile>,
}

fn plan(req: &ExportRequest) -> KinetypeResult<ExportPlan> {
    let total_frames = req.settings.validate()?;
    let (format, scene, size_limit) = match &req.target {
        ExportTarget::Format(f) => (*f, req.scene.clone(), None),
        ExportTarget::Platform(profile) => {
            profile.validate()?;
            let format = profile.select_format()?;
            (format, profile.apply_to_scene(&req.scene), Some(profile.clone()))
        }
    };
    if !format.has_adapter() {
        return Err(KinetypeError::unsupported_format(format!(
            "{format} export has no encoder"
        )));
    }
    Ok(ExportPlan {
        format,
        scene,
        total_frames,
        size_limit,
    })
}

/// Deletes the held path on drop unless disarmed.
struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            crate::encode::sink::remove_partial(&path);
        }
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fresh sibling of `output`: `.{name}.{pid}-{n}.part.{ext}`.
fn temp_path_for(output: &Path, format: ExportFormat) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    output.with_file_name(format!(
        ".{name}.{}-{n}.part.{}",
        std::process::id(),
        format.extension()
    ))
}

/// Runs exports one at a time.
///
/// Clones share the same lock, so at most one pipeline per exporter family is active. A live
/// preview never takes the lock.
#[derive(Clone)]
pub struct Exporter {
    lock: Arc<Mutex<()>>,
    factory: Arc<dyn EncoderFactory>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter").finish_non_exhaustive()
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter {
    /// Exporter using the built-in encoders.
    pub fn new() -> Self {
        Self::with_factory(create_encoder)
    }

    /// Exporter creating encoders through `factory`.
    pub fn with_factory(factory: impl EncoderFactory + 'static) -> Self {
        Self {
            lock: Arc::new(Mutex::new(())),
            factory: Arc::new(factory),
        }
    }

    /// Run `req` to completion on the calling thread.
    pub fn export(&self, req: &ExportRequest) -> ExportJob {
        self.export_with(req, &CancelToken::new(), &mut |_| {})
    }

    /// Run `req`, observing `cancel` between frames and reporting every job update to `observe`.
    ///
    /// The returned job is always terminal. On any failure no file exists at the output path
    /// that was not there before, and the temporary file is gone.
    #[tracing::instrument(skip_all, fields(output = %req.output.display()))]
    pub fn export_with(
        &self,
        req: &ExportRequest,
        cancel: &CancelToken,
        observe: &mut dyn FnMut(&ExportJob),
    ) -> ExportJob {
        let settings = &req.settings;
        let plan = match plan(req) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "export rejected");
                let format = match &req.target {
                    ExportTarget::Format(f) => Some(*f),
                    ExportTarget::Platform(_) => None,
                };
                let job = ExportJob::rejected(
                    format,
                    settings.duration_secs,
                    settings.fps,
                    req.scene.size(),
                    req.scene.is_transparent(),
                    req.output.clone(),
                    &e,
                );
                observe(&job);
                return job;
            }
        };

        let mut job = ExportJob::new(
            Some(plan.format),
            settings.duration_secs,
            settings.fps,
            plan.scene.size(),
            plan.scene.is_transparent(),
            plan.total_frames,
            req.output.clone(),
        );
        observe(&job);

        let _running = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        job.start();
        observe(&job);
        match self.run(&plan, req, cancel, &mut job, observe) {
            Ok(byte_len) => {
                tracing::debug!(format = %plan.format, byte_len, "export finished");
                job.succeed(byte_len);
            }
            Err(e) => {
                tracing::warn!(format = %plan.format, error = %e, "export failed");
                job.fail(&e);
            }
        }
        observe(&job);
        job
    }

    fn run(
        &self,
        plan: &ExportPlan,
        req: &ExportRequest,
        cancel: &CancelToken,
        job: &mut ExportJob,
        observe: &mut dyn FnMut(&ExportJob),
    ) -> KinetypeResult<u64> {
        let settings = &req.settings;
        let frames = FrameScheduler::new(
            &plan.scene,
            settings.duration_secs,
            settings.fps,
            settings.pacing,
        )?;

        ensure_parent_dir(&req.output)?;
        let tmp = temp_path_for(&req.output, plan.format);
        let mut tmp_guard = TempFileGuard(Some(tmp.clone()));

        let mut encoder = self.factory.create(plan.format, &settings.encoder)?;
        let size = plan.scene.size();
        let cfg = EncoderConfig {
            path: tmp.clone(),
            width: size.width,
            height: size.height,
            fps: settings.fps,
            frame_count: plan.total_frames,
            transparent: plan.scene.is_transparent(),
            background: plan.scene.background(),
        };
        let written = drive(encoder.as_mut(), cfg, frames, settings, cancel, job, observe);
        let written = match written {
            Ok(p) => p,
            Err(e) => {
                encoder.abort();
                return Err(e);
            }
        };

        let byte_len = std::fs::metadata(&written)
            .map_err(|e| KinetypeError::encode_failed(format!("stat finished artifact: {e}")))?
            .len();
        if let Some(profile) = &plan.size_limit {
            profile.check_file_size(byte_len)?;
        }
        std::fs::rename(&written, &req.output).map_err(|e| {
            KinetypeError::encode_failed(format!(
                "move artifact to '{}': {e}",
                req.output.display()
            ))
        })?;
        tmp_guard.0 = None;
        Ok(byte_len)
    }

    /// Run `req` on a new thread.
    pub fn spawn(&self, req: ExportRequest) -> KinetypeResult<JobHandle> {
        let cancel = CancelToken::new();
        let settings = &req.settings;
        let shared = Arc::new(Mutex::new(ExportJob::new(
            match &req.target {
                ExportTarget::Format(f) => Some(*f),
                ExportTarget::Platform(_) => None,
            },
            settings.duration_secs,
            settings.fps,
            req.scene.size(),
            req.scene.is_transparent(),
            settings.validate().unwrap_or(0),
            req.output.clone(),
        )));

        let exporter = self.clone();
        let worker_cancel = cancel.clone();
        let worker_shared = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("kinetype-export".to_string())
            .spawn(move || {
                exporter.export_with(&req, &worker_cancel, &mut |job| {
                    *worker_shared.lock().unwrap_or_else(PoisonError::into_inner) = job.clone();
                })
            })
            .map_err(|e| KinetypeError::Other(anyhow::anyhow!("spawn export thread: {e}")))?;
        Ok(JobHandle::new(shared, cancel, thread))
    }

    /// Render `scene` at `t` seconds and write it as a PNG.
    ///
    /// Stills do not take the export lock.
    pub fn export_still(
        &self,
        scene: &SceneDescription,
        t: f64,
        path: impl AsRef<Path>,
    ) -> KinetypeResult<PathBuf> {
        use anyhow::Context as _;

        let path = path.as_ref();
        let frame = render_frame(scene, t)?;
        let img = frame.to_rgba_image()?;
        ensure_parent_dir(path)?;
        img.save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write still '{}'", path.display()))?;
        Ok(path.to_path_buf())
    }
}

fn drive(
    encoder: &mut dyn FrameEncoder,
    cfg: EncoderConfig,
    mut frames: FrameScheduler,
    settings: &ExportSettings,
    cancel: &CancelToken,
    job: &mut ExportJob,
    observe: &mut dyn FnMut(&ExportJob),
) -> KinetypeResult<PathBuf> {
    let frame_secs = settings.fps.frame_duration_secs();
    encoder.open(cfg)?;
    loop {
        if cancel.is_cancelled() {
            return Err(KinetypeError::Cancelled);
        }
        let Some(frame) = frames.next() else {
            break;
        };
        let frame = frame?;
        append_with_backoff(encoder, &frame, frame_secs, settings.backoff, cancel)?;
        job.record_frame(frame.sequence.0);
        observe(job);
    }
    if cancel.is_cancelled() {
        return Err(KinetypeError::Cancelled);
    }
    encoder.finalize()
}

#[cfg(test)]
#[path = "../../tests/unit/export/exporter.rs"]
mod tests;
