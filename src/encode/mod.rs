//! Encoding sinks.
//!
//! Sinks consume decoded frames in output order and are driven by the job pipeline.

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
