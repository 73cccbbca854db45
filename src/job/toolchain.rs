use std::sync::Arc;

use crate::audio::decode::{AudioDecoder, FfmpegAudioDecoder};
use crate::audio::mux::{FfmpegMuxer, Muxer};
use crate::config::Settings;
use crate::encode::ffmpeg::{FfmpegSinkFactory, FfmpegSinkOpts};
use crate::encode::sink::SinkFactory;

/// External media collaborators used by a job.
#[derive(Clone)]
pub struct Toolchain {
    /// Creates one video sink per job.
    pub sinks: Arc<dyn SinkFactory>,
    /// Decodes the optional audio source.
    pub audio: Arc<dyn AudioDecoder>,
    /// Combines the silent video with the trimmed audio.
    pub muxer: Arc<dyn Muxer>,
}

impl Toolchain {
    /// Toolchain driving the system `ffmpeg` as configured in `settings`.
    pub fn ffmpeg(settings: &Settings) -> Self {
        Self {
            sinks: Arc::new(FfmpegSinkFactory::new(FfmpegSinkOpts::from_settings(
                settings,
            ))),
            audio: Arc::new(FfmpegAudioDecoder::new(
                settings.ffmpeg_bin.clone(),
                settings.audio_sample_rate,
                settings.audio_channels,
            )),
            muxer: Arc::new(FfmpegMuxer::new(settings.ffmpeg_bin.clone())),
        }
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}
