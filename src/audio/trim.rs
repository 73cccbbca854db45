use std::path::{Path, PathBuf};

use crate::audio::decode::AudioPcm;
use crate::foundation::core::Fps;
use crate::foundation::error::{StillreelError, StillreelResult};

/// Raw PCM file handed to the muxer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInputConfig {
    /// Path to interleaved `f32le` PCM data.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Cut `pcm` to the duration of `frames` video frames at `fps`.
///
/// Audio is only ever shortened. A source shorter than the video is returned untouched; it is
/// neither padded nor looped.
pub fn trim_to_video(mut pcm: AudioPcm, frames: u64, fps: Fps) -> AudioPcm {
    let max_frames = fps.frames_to_samples(frames, pcm.sample_rate);
    let max_len = usize::try_from(max_frames)
        .unwrap_or(usize::MAX)
        .saturating_mul(usize::from(pcm.channels));
    if pcm.interleaved_f32.len() > max_len {
        pcm.interleaved_f32.truncate(max_len);
    }
    pcm
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_f32le_file(pcm: &AudioPcm, out_path: &Path) -> StillreelResult<AudioInputConfig> {
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            StillreelError::audio(format!(
                "failed to create audio output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(pcm.interleaved_f32.len() * 4);
    for &sample in &pcm.interleaved_f32 {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        StillreelError::audio(format!(
            "failed to write trimmed audio file '{}': {e}",
            out_path.display()
        ))
    })?;

    Ok(AudioInputConfig {
        path: out_path.to_path_buf(),
        sample_rate: pcm.sample_rate,
        channels: pcm.channels,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/trim.rs"]
mod tests;
