use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::Fps;
use crate::foundation::error::{StillreelError, StillreelResult};

/// Status text reported after a video was written.
pub const STATUS_SUCCESS: &str = "Video created successfully!";
/// Status text reported when the folder holds no images.
pub const STATUS_NO_IMAGES: &str = "No images found in the selected folder.";

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique job identifier, assigned in increasing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

impl JobId {
    /// Allocate the next identifier.
    pub fn next() -> Self {
        Self(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One request to turn a folder of images into a video.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodingJob {
    /// Folder holding the images. The video is written here too.
    pub folder: PathBuf,
    /// Output base name, without the `.mp4` extension.
    pub output_name: String,
    /// Output frame rate.
    pub fps: Fps,
    /// Optional audio track muxed into the result.
    pub audio: Option<PathBuf>,
}

impl EncodingJob {
    /// Job with the default output name `output` and no audio.
    pub fn new(folder: impl Into<PathBuf>, fps: Fps) -> Self {
        Self {
            folder: folder.into(),
            output_name: "output".to_owned(),
            fps,
            audio: None,
        }
    }

    /// Replace the output base name.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    /// Attach an audio source.
    pub fn with_audio(mut self, audio: impl Into<PathBuf>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    /// Check the job before any work is done.
    pub fn validate(&self) -> StillreelResult<()> {
        if self.output_name.trim().is_empty() {
            return Err(StillreelError::validation("output name must be non-empty"));
        }
        if self
            .output_name
            .chars()
            .any(|c| c == '/' || c == '\\' || std::path::is_separator(c))
        {
            return Err(StillreelError::validation(format!(
                "output name '{}' must not contain path separators",
                self.output_name
            )));
        }
        if matches!(self.output_name.as_str(), "." | "..") {
            return Err(StillreelError::validation(format!(
                "output name '{}' is not a file name",
                self.output_name
            )));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(StillreelError::validation("frame rate must be non-zero"));
        }
        Ok(())
    }

    /// Final video path, `{folder}/{output_name}.mp4`.
    pub fn output_path(&self) -> PathBuf {
        self.folder.join(format!("{}.mp4", self.output_name))
    }

    /// Job-unique hidden sibling of the output path.
    pub(crate) fn temp_sibling(&self, id: JobId, stage: &str) -> PathBuf {
        self.folder.join(format!(
            ".{}.{}-{}.{stage}.mp4",
            self.output_name,
            std::process::id(),
            id
        ))
    }

    /// Job-unique raw PCM path in the system temp directory.
    pub(crate) fn temp_audio(id: JobId) -> PathBuf {
        std::env::temp_dir().join(format!("stillreel-{}-{id}.f32le", std::process::id()))
    }
}

/// Category of a failed job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The job description itself was invalid.
    Validation,
    /// An image could not be decoded.
    Decode,
    /// An image did not match the frame geometry.
    Geometry,
    /// The video sink or codec failed.
    Encode,
    /// The audio source could not be decoded or exported.
    Audio,
    /// The external transcoder failed to mux.
    Mux,
    /// A filesystem operation failed.
    Io,
    /// The worker faulted.
    Internal,
}

impl FailureKind {
    /// Classify a library error.
    pub fn of(err: &StillreelError) -> Self {
        match err {
            StillreelError::Validation(_) => Self::Validation,
            StillreelError::Io(_) => Self::Io,
            StillreelError::Decode { .. } => Self::Decode,
            StillreelError::Geometry(_) => Self::Geometry,
            StillreelError::Encode(_) => Self::Encode,
            StillreelError::Audio(_) => Self::Audio,
            StillreelError::Mux(_) => Self::Mux,
            StillreelError::Busy(_) | StillreelError::Timeout(_) | StillreelError::Other(_) => {
                Self::Internal
            }
        }
    }
}

/// Terminal result of one job. Exactly one is produced per job.
#[derive(Clone, Debug, PartialEq)]
pub enum JobOutcome {
    /// The video was written.
    Success {
        /// Final video path.
        output: PathBuf,
        /// Number of frames written.
        frames: u64,
    },
    /// The folder held no images; nothing was written.
    NoImages,
    /// The job failed.
    Failed {
        /// Failure category.
        kind: FailureKind,
        /// Human-readable cause.
        message: String,
    },
}

impl JobOutcome {
    /// Outcome describing `err`.
    pub fn failed(err: &StillreelError) -> Self {
        Self::Failed {
            kind: FailureKind::of(err),
            message: err.to_string(),
        }
    }

    /// Outcome for a worker that faulted.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Failed {
            kind: FailureKind::Internal,
            message: message.into(),
        }
    }

    /// Whether the job wrote its video.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Terminal status line shown to the user.
    pub fn message(&self) -> String {
        match self {
            Self::Success { .. } => STATUS_SUCCESS.to_owned(),
            Self::NoImages => STATUS_NO_IMAGES.to_owned(),
            Self::Failed { message, .. } => format!("Video creation failed: {message}"),
        }
    }
}

impl std::fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Notification sent from a worker to its coordinator.
#[derive(Clone, Debug, PartialEq)]
pub enum JobEvent {
    /// Percentage of frames written, non-decreasing within a job.
    Progress {
        /// Job the event belongs to.
        job: JobId,
        /// Integer percentage in `0..=100`.
        percent: u8,
    },
    /// The terminal event of a job. Always the last one.
    Finished {
        /// Job the event belongs to.
        job: JobId,
        /// Terminal result.
        outcome: JobOutcome,
    },
}

impl JobEvent {
    /// Job the event belongs to.
    pub fn job(&self) -> JobId {
        match self {
            Self::Progress { job, .. } | Self::Finished { job, .. } => *job,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/model.rs"]
mod tests;
