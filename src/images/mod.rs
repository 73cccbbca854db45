//! Image discovery and decoding.

/// Frame decoding, geometry probing and mismatch handling.
pub mod decode;
/// Directory listing and ordering.
pub mod enumerate;
