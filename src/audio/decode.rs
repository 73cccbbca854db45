use std::path::Path;
use std::process::Command;

use crate::foundation::error::{StillreelError, StillreelResult};

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (one sample per channel).
    pub fn sample_frames(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        (self.interleaved_f32.len() / usize::from(self.channels)) as u64
    }

    /// Playback duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Loads an audio source fully into memory.
pub trait AudioDecoder: Send + Sync {
    /// Decode `path` into interleaved PCM.
    fn decode(&self, path: &Path) -> StillreelResult<AudioPcm>;
}

/// [`AudioDecoder`] backed by the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegAudioDecoder {
    /// `ffmpeg` executable.
    pub ffmpeg_bin: String,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count.
    pub channels: u16,
}

impl FfmpegAudioDecoder {
    /// Decoder resampling to `sample_rate` Hz and `channels` channels.
    pub fn new(ffmpeg_bin: impl Into<String>, sample_rate: u32, channels: u16) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            sample_rate,
            channels,
        }
    }
}

impl AudioDecoder for FfmpegAudioDecoder {
    #[tracing::instrument(skip(self))]
    fn decode(&self, path: &Path) -> StillreelResult<AudioPcm> {
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(StillreelError::validation(
                "audio sample rate and channel count must be non-zero",
            ));
        }

        let out = Command::new(&self.ffmpeg_bin)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args([
                "-vn",
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "-ac",
                &self.channels.to_string(),
                "-ar",
                &self.sample_rate.to_string(),
                "pipe:1",
            ])
            .output()
            .map_err(|e| {
                StillreelError::audio(format!("failed to run ffmpeg for audio decode: {e}"))
            })?;

        if !out.status.success() {
            return Err(StillreelError::audio(format!(
                "ffmpeg audio decode failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let pcm = pcm_from_f32le(&out.stdout, self.sample_rate, self.channels)?;
        tracing::debug!(
            frames = pcm.sample_frames(),
            secs = pcm.duration_secs(),
            "decoded audio source"
        );
        Ok(pcm)
    }
}

/// Parse raw little-endian `f32` bytes into [`AudioPcm`].
pub fn pcm_from_f32le(bytes: &[u8], sample_rate: u32, channels: u16) -> StillreelResult<AudioPcm> {
    if !bytes.len().is_multiple_of(4) {
        return Err(StillreelError::audio(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let interleaved_f32 = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/decode.rs"]
mod tests;
