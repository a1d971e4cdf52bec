use crate::encode::ExportFormat;
use crate::export::cancel::CancelToken;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ErrorKind, KinetypeError, KinetypeResult};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Lifecycle state of an [`ExportJob`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not started.
    Pending,
    /// Rendering and encoding.
    Running,
    /// The artifact is at the job's output path.
    Succeeded,
    /// Stopped without an artifact. Cancellation is `Failed` with [`ErrorKind::Cancelled`].
    Failed {
        /// Error classification.
        kind: ErrorKind,
        /// Human-readable reason.
        message: String,
    },
}

impl JobStatus {
    /// Return `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }
}

/// State of one export, mutated only by the exporter.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ExportJob {
    format: Option<ExportFormat>,
    duration_secs: f64,
    fps: Fps,
    size: Canvas,
    transparent: bool,
    total_frames: u64,
    frames_encoded: u64,
    status: JobStatus,
    output: PathBuf,
    byte_len: Option<u64>,
}

impl ExportJob {
    pub(crate) fn new(
        format: Option<ExportFormat>,
        duration_secs: f64,
        fps: Fps,
        size: Canvas,
        transparent: bool,
        total_frames: u64,
        output: PathBuf,
    ) -> Self {
        Self {
            format,
            duration_secs,
            fps,
            size,
            transparent,
            total_frames,
            frames_encoded: 0,
            status: JobStatus::Pending,
            output,
            byte_len: None,
        }
    }

    /// A job whose request was refused before a pipeline was built.
    pub(crate) fn rejected(
        format: Option<ExportFormat>,
        duration_secs: f64,
        fps: Fps,
        size: Canvas,
        transparent: bool,
        output: PathBuf,
        err: &KinetypeError,
    ) -> Self {
        let mut job = Self::new(format, duration_secs, fps, size, transparent, 0, output);
        job.fail(err);
        job
    }

    pub(crate) fn start(&mut self) {
        self.status = JobStatus::Running;
    }

    /// Record that frame `seq` (0-based) reached the encoder.
    pub(crate) fn record_frame(&mut self, seq: u64) {
        self.frames_encoded = self.frames_encoded.max(seq.saturating_add(1)).min(self.total_frames);
    }

    pub(crate) fn succeed(&mut self, byte_len: u64) {
        self.byte_len = Some(byte_len);
        self.status = JobStatus::Succeeded;
    }

    pub(crate) fn fail(&mut self, err: &KinetypeError) {
        self.status = JobStatus::Failed {
            kind: err.kind(),
            message: err.to_string(),
        };
    }

    /// Chosen output format. `None` when the request was rejected before a format was picked.
    pub fn format(&self) -> Option<ExportFormat> {
        self.format
    }

    /// Exported duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Sampling rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Output size in pixels.
    pub fn size(&self) -> Canvas {
        self.size
    }

    /// Whether the exported frames keep a transparent background.
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// `round(duration * fps)`, fixed when the job is created.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Frames appended to the encoder so far.
    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }

    /// `frames_encoded / total_frames` in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.frames_encoded as f64 / self.total_frames as f64
    }

    /// Current status.
    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    /// Return `true` once the artifact exists at [`ExportJob::output`].
    pub fn is_succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }

    /// Target path of the artifact. Only holds a file after success.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Artifact size in bytes after success.
    pub fn byte_len(&self) -> Option<u64> {
        self.byte_len
    }

    /// Failure kind, if the job failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.status {
            JobStatus::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Handle to an export running on its own thread.
#[derive(Debug)]
pub struct JobHandle {
    shared: Arc<Mutex<ExportJob>>,
    cancel: CancelToken,
    thread: Option<JoinHandle<ExportJob>>,
}

impl JobHandle {
    pub(crate) fn new(
        shared: Arc<Mutex<ExportJob>>,
        cancel: CancelToken,
        thread: JoinHandle<ExportJob>,
    ) -> Self {
        Self {
            shared,
            cancel,
            thread: Some(thread),
        }
    }

    /// Copy of the latest job state.
    pub fn snapshot(&self) -> ExportJob {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Latest progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.snapshot().progress()
    }

    /// Latest status.
    pub fn status(&self) -> JobStatus {
        self.snapshot().status
    }

    /// Ask the export to stop. The job ends as `Failed(Cancelled)` unless it already finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Return `true` once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the export to end and return its final state.
    pub fn join(mut self) -> KinetypeResult<ExportJob> {
        let Some(thread) = self.thread.take() else {
            return Ok(self.snapshot());
        };
        thread
            .join()
            .map_err(|_| KinetypeError::Other(anyhow::anyhow!("export thread panicked")))
    }
}
