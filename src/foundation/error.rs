/// Convenience result type used across kinetype.
pub type KinetypeResult<T> = Result<T, KinetypeError>;

/// Top-level error taxonomy used by the render and export pipeline.
#[derive(thiserror::Error, Debug)]
pub enum KinetypeError {
    /// Invalid user-provided data (scene JSON, export settings, profiles).
    #[error("validation error: {0}")]
    Validation(String),

    /// The scene cannot be rendered (for example a zero-sized canvas).
    #[error("render error: {0}")]
    Render(String),

    /// An encoder sink could not be opened or configured.
    #[error("encoder init error: {0}")]
    EncoderInit(String),

    /// The encoder sink cannot accept another frame yet. Transient.
    #[error("encoder busy: {0}")]
    EncoderBusy(String),

    /// Appending or finalizing failed after data was written.
    #[error("encode failed: {0}")]
    EncodeFailed(String),

    /// The requested output format has no encoder adapter.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The export was cancelled by the caller.
    #[error("export cancelled")]
    Cancelled,

    /// The finalized artifact is larger than the target platform allows.
    #[error("artifact is {size} bytes, over the {limit} byte limit")]
    FileTooLarge {
        /// Encoded artifact size in bytes.
        size: u64,
        /// Platform limit in bytes.
        limit: u64,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Payload-free classification of a [`KinetypeError`], suitable for job status reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`KinetypeError::Validation`].
    Validation,
    /// See [`KinetypeError::Render`].
    Render,
    /// See [`KinetypeError::EncoderInit`].
    EncoderInit,
    /// See [`KinetypeError::EncoderBusy`].
    EncoderBusy,
    /// See [`KinetypeError::EncodeFailed`].
    EncodeFailed,
    /// See [`KinetypeError::UnsupportedFormat`].
    UnsupportedFormat,
    /// See [`KinetypeError::Cancelled`].
    Cancelled,
    /// See [`KinetypeError::FileTooLarge`].
    FileTooLarge,
    /// See [`KinetypeError::Other`].
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::Render => "render",
            Self::EncoderInit => "encoder_init",
            Self::EncoderBusy => "encoder_busy",
            Self::EncodeFailed => "encode_failed",
            Self::UnsupportedFormat => "unsupported_format",
            Self::Cancelled => "cancelled",
            Self::FileTooLarge => "file_too_large",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

impl KinetypeError {
    /// Build a [`KinetypeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KinetypeError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`KinetypeError::EncoderInit`] value.
    pub fn encoder_init(msg: impl Into<String>) -> Self {
        Self::EncoderInit(msg.into())
    }

    /// Build a [`KinetypeError::EncoderBusy`] value.
    pub fn encoder_busy(msg: impl Into<String>) -> Self {
        Self::EncoderBusy(msg.into())
    }

    /// Build a [`KinetypeError::EncodeFailed`] value.
    pub fn encode_failed(msg: impl Into<String>) -> Self {
        Self::EncodeFailed(msg.into())
    }

    /// Build a [`KinetypeError::UnsupportedFormat`] value.
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Render(_) => ErrorKind::Render,
            Self::EncoderInit(_) => ErrorKind::EncoderInit,
            Self::EncoderBusy(_) => ErrorKind::EncoderBusy,
            Self::EncodeFailed(_) => ErrorKind::EncodeFailed,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Return `true` for errors that may succeed when the same call is retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::EncoderBusy(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
