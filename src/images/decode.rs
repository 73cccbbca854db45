use std::path::{Path, PathBuf};

use image::ImageReader;
use image::imageops::{self, FilterType};
use rayon::prelude::*;

use crate::config::GeometryPolicy;
use crate::foundation::core::{FrameGeometry, FrameRGBA};
use crate::foundation::error::{StillreelError, StillreelResult};

/// Decode an image into straight-alpha RGBA8.
///
/// The format is sniffed from the content, so a file whose extension lies still decodes when
/// its bytes are a supported format.
pub fn decode_frame(path: &Path) -> StillreelResult<FrameRGBA> {
    let reader = ImageReader::open(path)
        .map_err(|e| StillreelError::decode(path, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| StillreelError::decode(path, e.to_string()))?;
    let img = reader
        .decode()
        .map_err(|e| StillreelError::decode(path, e.to_string()))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(FrameRGBA {
        width,
        height,
        data: rgba.into_raw(),
    })
}

/// Decode the first frame of a job and derive its geometry.
pub fn probe_geometry(path: &Path) -> StillreelResult<(FrameGeometry, FrameRGBA)> {
    let frame = decode_frame(path)?;
    let geometry = FrameGeometry::new(frame.width, frame.height)
        .map_err(|e| StillreelError::decode(path, e.to_string()))?;
    Ok((geometry, frame))
}

/// Read the header dimensions of every image and fail on the first one that differs.
///
/// Headers are read in parallel; the reported file is the earliest offender in `images`
/// order, independent of scheduling. Formats are sniffed from the content, as in
/// [`decode_frame`].
pub fn check_geometry(images: &[PathBuf], geometry: FrameGeometry) -> StillreelResult<()> {
    let dims: Vec<StillreelResult<(u32, u32)>> =
        images.par_iter().map(|path| header_dimensions(path)).collect();

    for (path, dim) in images.iter().zip(dims) {
        let (width, height) = dim?;
        if width != geometry.width || height != geometry.height {
            return Err(StillreelError::geometry(format!(
                "'{}' is {width}x{height}, expected {geometry}",
                path.display()
            )));
        }
    }
    Ok(())
}

fn header_dimensions(path: &Path) -> StillreelResult<(u32, u32)> {
    ImageReader::open(path)
        .map_err(|e| StillreelError::decode(path, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| StillreelError::decode(path, e.to_string()))?
        .into_dimensions()
        .map_err(|e| StillreelError::decode(path, e.to_string()))
}

/// Bring `frame` to `geometry` according to `policy`.
pub fn conform_frame(
    frame: FrameRGBA,
    geometry: FrameGeometry,
    policy: GeometryPolicy,
    path: &Path,
) -> StillreelResult<FrameRGBA> {
    if frame.geometry() == geometry {
        return Ok(frame);
    }

    match policy {
        GeometryPolicy::Reject => Err(StillreelError::geometry(format!(
            "'{}' is {}, expected {geometry}",
            path.display(),
            frame.geometry()
        ))),
        GeometryPolicy::Fit => {
            tracing::debug!(
                path = %path.display(),
                from = %frame.geometry(),
                to = %geometry,
                "resizing frame"
            );
            let src = image::RgbaImage::from_raw(frame.width, frame.height, frame.data)
                .ok_or_else(|| {
                    StillreelError::decode(path, "pixel buffer does not match its dimensions")
                })?;
            let resized =
                imageops::resize(&src, geometry.width, geometry.height, FilterType::Triangle);
            Ok(FrameRGBA {
                width: geometry.width,
                height: geometry.height,
                data: resized.into_raw(),
            })
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/images/decode.rs"]
mod tests;
