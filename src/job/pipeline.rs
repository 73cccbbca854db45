//! Synchronous image-folder-to-video pipeline.
//!
//! [`run_job`] enumerates the folder, streams every image through a [`FrameSink`] and, when the
//! job names an audio source, trims that track to the video duration and muxes it in. All
//! intermediate files live at job-unique temporary paths and the final file only appears through
//! a rename, so a failed job never leaves a partial video behind.

use std::path::{Path, PathBuf};

use crate::audio::trim::{trim_to_video, write_f32le_file};
use crate::config::{GeometryPolicy, Settings};
use crate::encode::sink::{FrameSink, SinkConfig, SinkFactory};
use crate::foundation::core::{Fps, FrameGeometry, FrameIndex, FrameRGBA, progress_percent};
use crate::foundation::error::{StillreelError, StillreelResult};
use crate::images::decode::{check_geometry, conform_frame, decode_frame, probe_geometry};
use crate::images::enumerate::list_images;
use crate::job::model::{EncodingJob, JobId, JobOutcome};
use crate::job::toolchain::Toolchain;

/// Run one job to completion on the calling thread.
///
/// `on_progress` receives one percentage per written frame. Every failure is folded into the
/// returned [`JobOutcome`].
pub fn run_job(
    job: &EncodingJob,
    settings: &Settings,
    toolchain: &Toolchain,
    on_progress: impl FnMut(u8),
) -> JobOutcome {
    run_job_as(JobId::next(), job, settings, toolchain, on_progress)
}

/// [`run_job`] with a caller-assigned identifier.
#[tracing::instrument(
    name = "job",
    skip_all,
    fields(job = %id, folder = %job.folder.display())
)]
pub fn run_job_as(
    id: JobId,
    job: &EncodingJob,
    settings: &Settings,
    toolchain: &Toolchain,
    mut on_progress: impl FnMut(u8),
) -> JobOutcome {
    tracing::info!(output = %job.output_name, fps = %job.fps, "job started");

    let outcome = match execute(id, job, settings, toolchain, &mut on_progress) {
        Ok(Some(frames)) => JobOutcome::Success {
            output: job.output_path(),
            frames,
        },
        Ok(None) => JobOutcome::NoImages,
        Err(err) => JobOutcome::failed(&err),
    };

    match &outcome {
        JobOutcome::Success { output, frames } => {
            tracing::info!(output = %output.display(), frames, "video written");
        }
        JobOutcome::NoImages => tracing::info!("no images found"),
        JobOutcome::Failed { kind, message } => {
            tracing::warn!(?kind, %message, "job failed");
        }
    }
    outcome
}

/// Returns `None` when the folder holds no images.
fn execute(
    id: JobId,
    job: &EncodingJob,
    settings: &Settings,
    toolchain: &Toolchain,
    on_progress: &mut dyn FnMut(u8),
) -> StillreelResult<Option<u64>> {
    job.validate()?;
    settings.validate()?;

    let images = list_images(&job.folder)?;
    if images.is_empty() {
        return Ok(None);
    }

    let output = job.output_path();
    if !settings.overwrite && output.exists() {
        return Err(StillreelError::io(format!(
            "output file '{}' already exists",
            output.display()
        )));
    }

    let video = TempFileGuard::new(job.temp_sibling(id, "video"));
    let frames = run_pipeline(
        &images,
        job.fps,
        video.path(),
        settings.geometry_policy,
        toolchain.sinks.as_ref(),
        on_progress,
    )?;

    match &job.audio {
        None => video.persist(&output)?,
        Some(audio) => mux_audio(id, job, audio, frames, video, &output, toolchain)?,
    }
    Ok(Some(frames))
}

/// Encode `images` into a video at `out_path`, returning the number of frames written.
///
/// The first image fixes the frame geometry. Under [`GeometryPolicy::Reject`] every header is
/// checked before the sink is opened. The sink is ended exactly once after it began, whether
/// streaming succeeded or not.
#[tracing::instrument(skip(images, sinks, on_progress), fields(images = images.len()))]
pub fn run_pipeline(
    images: &[PathBuf],
    fps: Fps,
    out_path: &Path,
    policy: GeometryPolicy,
    sinks: &dyn SinkFactory,
    on_progress: &mut dyn FnMut(u8),
) -> StillreelResult<u64> {
    let Some(first) = images.first() else {
        return Err(StillreelError::validation("image set must be non-empty"));
    };

    let (geometry, first_frame) = probe_geometry(first)?;
    tracing::debug!(%geometry, first = %first.display(), "probed frame geometry");
    if policy == GeometryPolicy::Reject {
        check_geometry(images, geometry)?;
    }

    let mut sink = sinks.create();
    sink.begin(SinkConfig {
        out_path: out_path.to_path_buf(),
        geometry,
        fps,
    })?;

    let streamed = stream_frames(
        sink.as_mut(),
        images,
        first_frame,
        geometry,
        policy,
        on_progress,
    );
    let ended = sink.end();

    match (streamed, ended) {
        (Ok(frames), Ok(())) => Ok(frames),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        // A dead encoder surfaces as a broken pipe; its exit status and stderr come from `end`.
        (Err(StillreelError::Encode(write)), Err(StillreelError::Encode(end))) => {
            Err(StillreelError::encode(format!("{end} ({write})")))
        }
        (Err(err), Err(end_err)) => {
            tracing::warn!(error = %end_err, "sink end failed after an aborted stream");
            Err(err)
        }
    }
}

fn stream_frames(
    sink: &mut dyn FrameSink,
    images: &[PathBuf],
    first_frame: FrameRGBA,
    geometry: FrameGeometry,
    policy: GeometryPolicy,
    on_progress: &mut dyn FnMut(u8),
) -> StillreelResult<u64> {
    let total = images.len() as u64;
    let mut first_frame = Some(first_frame);

    for (i, path) in images.iter().enumerate() {
        let frame = match first_frame.take() {
            Some(frame) => frame,
            None => decode_frame(path)?,
        };
        let frame = conform_frame(frame, geometry, policy, path)?;

        let idx = i as u64;
        sink.push_frame(FrameIndex(idx), &frame)?;
        on_progress(progress_percent(idx + 1, total));
    }
    Ok(total)
}

fn mux_audio(
    id: JobId,
    job: &EncodingJob,
    audio: &Path,
    frames: u64,
    video: TempFileGuard,
    output: &Path,
    toolchain: &Toolchain,
) -> StillreelResult<()> {
    let pcm = toolchain.audio.decode(audio)?;
    let source_secs = pcm.duration_secs();
    let pcm = trim_to_video(pcm, frames, job.fps);
    tracing::debug!(
        source = %audio.display(),
        source_secs,
        trimmed_secs = pcm.duration_secs(),
        video_secs = job.fps.frames_to_secs(frames),
        "trimmed audio track"
    );

    if pcm.sample_frames() == 0 {
        tracing::warn!(source = %audio.display(), "audio source is empty; keeping silent video");
        return video.persist(output);
    }

    let pcm_file = TempFileGuard::new(EncodingJob::temp_audio(id));
    let audio_cfg = write_f32le_file(&pcm, pcm_file.path())?;

    let muxed = TempFileGuard::new(job.temp_sibling(id, "muxed"));
    toolchain.muxer.mux(video.path(), &audio_cfg, muxed.path())?;
    muxed.persist(output)
}

/// Removes its file on drop unless persisted.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the file onto `dest`.
    fn persist(mut self, dest: &Path) -> StillreelResult<()> {
        std::fs::rename(&self.path, dest)
            .map_err(|e| StillreelError::io_at("rename video onto", dest, e))?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed temporary file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove temporary file"
            ),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/pipeline.rs"]
mod tests;
