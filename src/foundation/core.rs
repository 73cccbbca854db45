use std::str::FromStr;

use crate::foundation::error::{StillreelError, StillreelResult};

/// 0-based index of a frame in the output video.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> StillreelResult<Self> {
        if den == 0 {
            return Err(StillreelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(StillreelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate.
    pub fn integer(fps: u32) -> StillreelResult<Self> {
        Self::new(fps, 1)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Number of audio sample frames covering `frames` video frames, rounded to nearest.
    pub fn frames_to_samples(self, frames: u64, sample_rate: u32) -> u64 {
        let num = u128::from(frames) * u128::from(sample_rate) * u128::from(self.den);
        let den = u128::from(self.num);
        ((num + (den / 2)) / den) as u64
    }

    /// `ffmpeg` rate argument (`num/den`).
    pub fn to_ffmpeg_arg(self) -> String {
        format!("{}/{}", self.num, self.den)
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl FromStr for Fps {
    type Err = StillreelError;

    /// Accepts `30` or `30000/1001`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| StillreelError::validation(format!("invalid fps '{s}': {e}")))
        };
        match s.split_once('/') {
            Some((num, den)) => Self::new(parse(num)?, parse(den)?),
            None => Self::new(parse(s)?, 1),
        }
    }
}

/// Pixel dimensions shared by every frame of one video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameGeometry {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameGeometry {
    /// Create a validated geometry.
    pub fn new(width: u32, height: u32) -> StillreelResult<Self> {
        if width == 0 || height == 0 {
            return Err(StillreelError::geometry(format!(
                "frame geometry must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Byte length of one straight-alpha RGBA8 frame.
    pub fn rgba8_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Smallest even geometry that contains this one (4:2:0 chroma needs even sides).
    pub fn even_padded(self) -> Self {
        Self {
            width: self.width + (self.width % 2),
            height: self.height + (self.height % 2),
        }
    }
}

impl std::fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One decoded frame in straight-alpha RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixels, `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Dimensions of this frame.
    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry {
            width: self.width,
            height: self.height,
        }
    }
}

/// Integer progress after `done` of `total` frames: `floor(done * 100 / total)`.
///
/// Returns 100 for an empty job so a finished zero-length run never reads as incomplete.
pub fn progress_percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let done = done.min(total);
    ((u128::from(done) * 100) / u128::from(total)) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
