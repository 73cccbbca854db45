use std::path::Path;
use std::process::Command;

use crate::audio::trim::AudioInputConfig;
use crate::foundation::error::{StillreelError, StillreelResult};

/// Combines a finished silent video with an audio track.
pub trait Muxer: Send + Sync {
    /// Write `output` holding the video stream of `video` and the audio of `audio`.
    fn mux(&self, video: &Path, audio: &AudioInputConfig, output: &Path) -> StillreelResult<()>;
}

/// [`Muxer`] that copies the video stream and encodes the audio to AAC with `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegMuxer {
    /// `ffmpeg` executable.
    pub ffmpeg_bin: String,
}

impl FfmpegMuxer {
    /// Muxer invoking `ffmpeg_bin`.
    pub fn new(ffmpeg_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
        }
    }

    /// Full argument list for one mux call.
    pub fn command_args(video: &Path, audio: &AudioInputConfig, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = ["-y", "-loglevel", "error", "-i"]
            .map(String::from)
            .to_vec();
        args.push(video.to_string_lossy().to_string());
        args.extend(
            [
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ]
            .map(String::from),
        );
        args.push(audio.path.to_string_lossy().to_string());
        args.extend(
            [
                "-map",
                "0:v:0",
                "-map",
                "1:a:0",
                "-c:v",
                "copy",
                "-c:a",
                "aac",
                "-movflags",
                "+faststart",
            ]
            .map(String::from),
        );
        args.push(output.to_string_lossy().to_string());
        args
    }
}

impl Muxer for FfmpegMuxer {
    #[tracing::instrument(skip(self, audio))]
    fn mux(&self, video: &Path, audio: &AudioInputConfig, output: &Path) -> StillreelResult<()> {
        let args = Self::command_args(video, audio, output);
        tracing::debug!(bin = %self.ffmpeg_bin, args = ?args, "spawning ffmpeg muxer");

        let out = Command::new(&self.ffmpeg_bin)
            .args(&args)
            .output()
            .map_err(|e| StillreelError::mux(format!("failed to run ffmpeg for muxing: {e}")))?;

        if !out.status.success() {
            return Err(StillreelError::mux(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mux.rs"]
mod tests;
