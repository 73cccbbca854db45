use std::path::{Path, PathBuf};

/// Crate-wide result alias.
pub type StillreelResult<T> = Result<T, StillreelError>;

/// Errors produced by the image-to-video pipeline.
#[derive(thiserror::Error, Debug)]
pub enum StillreelError {
    /// Invalid job or configuration input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(String),

    /// An image could not be decoded.
    #[error("decode error: '{}': {message}", path.display())]
    Decode {
        /// Offending file.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// An image does not match the frame geometry of the job.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// The video sink or encoder failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// The audio source could not be decoded or trimmed.
    #[error("audio error: {0}")]
    Audio(String),

    /// The external muxer failed.
    #[error("mux error: {0}")]
    Mux(String),

    /// A job is already active for the requested folder.
    #[error("busy: {0}")]
    Busy(String),

    /// No completion arrived in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StillreelError {
    /// Build a [`StillreelError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StillreelError::Io`].
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`StillreelError::Io`] from a failed filesystem operation on `path`.
    pub fn io_at(action: &str, path: &Path, err: std::io::Error) -> Self {
        Self::Io(format!("failed to {action} '{}': {err}", path.display()))
    }

    /// Build a [`StillreelError::Decode`].
    pub fn decode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Build a [`StillreelError::Geometry`].
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`StillreelError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`StillreelError::Audio`].
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Build a [`StillreelError::Mux`].
    pub fn mux(msg: impl Into<String>) -> Self {
        Self::Mux(msg.into())
    }

    /// Build a [`StillreelError::Busy`].
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Build a [`StillreelError::Timeout`].
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
