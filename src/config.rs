//! Runtime settings for the pipeline and its external tools.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a valid
//! configuration. Command-line flags are applied on top of a loaded [`Settings`].

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{StillreelError, StillreelResult};

/// Video codec used for the MP4 stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    /// MPEG-4 Part 2 (`mp4v`), playable nearly everywhere.
    #[default]
    Mpeg4,
    /// H.264 through `libx264`.
    H264,
}

impl VideoCodec {
    /// Encoder name passed to `-c:v`.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            VideoCodec::Mpeg4 => "mpeg4",
            VideoCodec::H264 => "libx264",
        }
    }

    /// Quality flag understood by the encoder.
    pub fn quality_flag(self) -> &'static str {
        match self {
            VideoCodec::Mpeg4 => "-q:v",
            VideoCodec::H264 => "-crf",
        }
    }

    /// Quality used when none is configured. The bare `mpeg4` default bitrate is far too low
    /// for still images.
    pub fn default_quality(self) -> u32 {
        match self {
            VideoCodec::Mpeg4 => 3,
            VideoCodec::H264 => 18,
        }
    }
}

/// What to do with images whose dimensions differ from the first image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryPolicy {
    /// Fail the job before anything is written.
    #[default]
    Reject,
    /// Resize the frame to the job geometry.
    Fit,
}

/// Pipeline configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `ffmpeg` executable used for encoding, audio decoding and muxing.
    pub ffmpeg_bin: String,
    /// Video codec.
    pub codec: VideoCodec,
    /// Optional encoder quality (`-q:v` for mpeg4, `-crf` for h264).
    pub quality: Option<u32>,
    /// Background RGB used to flatten transparent pixels.
    pub background: [u8; 3],
    /// Dimension mismatch handling.
    pub geometry_policy: GeometryPolicy,
    /// Replace an existing output file.
    pub overwrite: bool,
    /// Sample rate the audio source is decoded to.
    pub audio_sample_rate: u32,
    /// Channel count the audio source is decoded to.
    pub audio_channels: u16,
    /// How long a caller waits for a job's completion before giving up.
    pub completion_timeout_secs: u64,
    /// Allow at most one active job at a time.
    pub exclusive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            codec: VideoCodec::default(),
            quality: None,
            background: [0, 0, 0],
            geometry_policy: GeometryPolicy::default(),
            overwrite: true,
            audio_sample_rate: 48_000,
            audio_channels: 2,
            completion_timeout_secs: 3600,
            exclusive: true,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON string.
    pub fn from_json_str(json: &str) -> StillreelResult<Self> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| StillreelError::validation(format!("invalid settings JSON: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn from_path(path: &Path) -> StillreelResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read settings '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> StillreelResult<()> {
        if self.ffmpeg_bin.trim().is_empty() {
            return Err(StillreelError::validation("ffmpeg_bin must not be empty"));
        }
        if self.audio_sample_rate == 0 {
            return Err(StillreelError::validation(
                "audio_sample_rate must be non-zero",
            ));
        }
        if self.audio_channels == 0 {
            return Err(StillreelError::validation("audio_channels must be non-zero"));
        }
        if self.completion_timeout_secs == 0 {
            return Err(StillreelError::validation(
                "completion_timeout_secs must be non-zero",
            ));
        }
        Ok(())
    }

    /// Completion timeout as a [`Duration`].
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    /// Background as opaque RGBA8.
    pub fn background_rgba(&self) -> [u8; 4] {
        let [r, g, b] = self.background;
        [r, g, b, 255]
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
