//! stillreel turns a folder of still images into an MP4 video.
//!
//! # Pipeline overview
//!
//! 1. **Enumerate**: list `.png`/`.jpg`/`.jpeg` files of one folder in byte-wise name order
//! 2. **Probe**: decode the first image; its size becomes the frame geometry
//! 3. **Encode**: stream every image as one frame into a [`FrameSink`] (the system `ffmpeg`)
//! 4. **Mux** (optional): cut an audio track to the video duration and mux it in as AAC
//!
//! Jobs run synchronously through [`run_job`] or on worker threads through a [`Coordinator`],
//! which reports progress percentages and exactly one [`JobOutcome`] per job.
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Atomic output**: the final file only appears by renaming a finished temporary file.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod audio;
mod config;
mod encode;
mod foundation;
mod images;
mod job;

pub use audio::decode::{AudioDecoder, AudioPcm, FfmpegAudioDecoder, pcm_from_f32le};
pub use audio::mux::{FfmpegMuxer, Muxer};
pub use audio::trim::{AudioInputConfig, trim_to_video, write_f32le_file};
pub use config::{GeometryPolicy, Settings, VideoCodec};
pub use encode::ffmpeg::{
    FfmpegSink, FfmpegSinkFactory, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path,
};
pub use encode::sink::{FrameSink, InMemorySink, SinkConfig, SinkFactory};
pub use foundation::core::{Fps, FrameGeometry, FrameIndex, FrameRGBA, progress_percent};
pub use foundation::error::{StillreelError, StillreelResult};
pub use images::decode::{check_geometry, conform_frame, decode_frame, probe_geometry};
pub use images::enumerate::{IMAGE_EXTENSIONS, has_image_extension, list_images};
pub use job::model::{
    EncodingJob, FailureKind, JobEvent, JobId, JobOutcome, STATUS_NO_IMAGES, STATUS_SUCCESS,
};
pub use job::pipeline::{run_job, run_job_as, run_pipeline};
pub use job::toolchain::Toolchain;
pub use job::worker::{Coordinator, JobHandle};
