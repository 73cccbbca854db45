use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::config::{Settings, VideoCodec};
use crate::encode::sink::{FrameSink, SinkConfig, SinkFactory};
use crate::foundation::core::{FrameIndex, FrameRGBA};
use crate::foundation::error::{StillreelError, StillreelResult};

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// `ffmpeg` executable.
    pub ffmpeg_bin: String,
    /// Video codec.
    pub codec: VideoCodec,
    /// Encoder quality; the codec default applies when `None`.
    pub quality: Option<u32>,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Options derived from pipeline settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            ffmpeg_bin: settings.ffmpeg_bin.clone(),
            codec: settings.codec,
            quality: settings.quality,
            overwrite: settings.overwrite,
            bg_rgba: settings.background_rgba(),
        }
    }
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGBA frames to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    /// Build the full `ffmpeg` argument list for `cfg`.
    pub fn command_args(&self, cfg: &SinkConfig) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        args.push(if self.opts.overwrite { "-y" } else { "-n" }.to_string());

        // Input: straight RGBA8 frames, flattened in push_frame, so alpha never reaches the
        // encoder.
        let rate = cfg.fps.to_ffmpeg_arg();
        args.extend(
            [
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &cfg.geometry.to_string(),
                "-r",
                &rate,
                "-i",
                "pipe:0",
                "-an",
            ]
            .map(String::from),
        );

        let padded = cfg.geometry.even_padded();
        if padded != cfg.geometry {
            let [r, g, b, _] = self.opts.bg_rgba;
            args.push("-vf".to_string());
            args.push(format!(
                "pad={}:{}:0:0:color=0x{r:02x}{g:02x}{b:02x}",
                padded.width, padded.height
            ));
        }

        let quality = self
            .opts
            .quality
            .unwrap_or_else(|| self.opts.codec.default_quality());
        args.extend(
            [
                "-c:v",
                self.opts.codec.ffmpeg_encoder(),
                self.opts.codec.quality_flag(),
                &quality.to_string(),
                "-pix_fmt",
                "yuv420p",
                "-r",
                &rate,
                "-movflags",
                "+faststart",
            ]
            .map(String::from),
        );
        args.push(cfg.out_path.to_string_lossy().to_string());
        args
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> StillreelResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(StillreelError::validation("fps must be non-zero"));
        }
        if cfg.geometry.width == 0 || cfg.geometry.height == 0 {
            return Err(StillreelError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }

        ensure_parent_dir(&cfg.out_path)?;
        if !self.opts.overwrite && cfg.out_path.exists() {
            return Err(StillreelError::io(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path(&self.opts.ffmpeg_bin) {
            return Err(StillreelError::encode(format!(
                "'{}' is required for MP4 encoding, but was not found on PATH",
                self.opts.ffmpeg_bin
            )));
        }

        let args = self.command_args(&cfg);
        tracing::debug!(bin = %self.opts.ffmpeg_bin, args = ?args, "spawning ffmpeg encoder");

        let mut child = Command::new(&self.opts.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                StillreelError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| StillreelError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| StillreelError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; cfg.geometry.rgba8_len()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StillreelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StillreelError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(StillreelError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.geometry() != cfg.geometry {
            return Err(StillreelError::encode(format!(
                "frame size mismatch: got {}, expected {}",
                frame.geometry(),
                cfg.geometry
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(StillreelError::encode(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_to_opaque_rgba8(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(StillreelError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            StillreelError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> StillreelResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| StillreelError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            StillreelError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| StillreelError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| StillreelError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(StillreelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

/// [`SinkFactory`] producing [`FfmpegSink`]s with fixed options.
#[derive(Clone, Debug, Default)]
pub struct FfmpegSinkFactory {
    opts: FfmpegSinkOpts,
}

impl FfmpegSinkFactory {
    /// Factory for sinks using `opts`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self { opts }
    }
}

impl SinkFactory for FfmpegSinkFactory {
    fn create(&self) -> Box<dyn FrameSink> {
        Box::new(FfmpegSink::new(self.opts.clone()))
    }
}

/// Composite straight-alpha RGBA8 over an opaque background.
fn flatten_to_opaque_rgba8(dst: &mut [u8], src: &[u8], bg_rgba: [u8; 4]) -> StillreelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(StillreelError::encode(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = bg_rgba[0] as u16;
    let bg_g = bg_rgba[1] as u16;
    let bg_b = bg_rgba[2] as u16;

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        let r = mul_div255(s[0] as u16, a) + mul_div255(bg_r, inv);
        let g = mul_div255(s[1] as u16, a) + mul_div255(bg_g, inv);
        let b = mul_div255(s[2] as u16, a) + mul_div255(bg_b, inv);

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> StillreelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `bin` (usually `ffmpeg`) can be invoked.
pub fn is_ffmpeg_on_path(bin: &str) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
