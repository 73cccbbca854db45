//! Optional audio stage: decode the source, trim it to the video, mux it in.

/// Audio source decoding.
pub mod decode;
/// External muxer.
pub mod mux;
/// Truncation and intermediate export.
pub mod trim;
