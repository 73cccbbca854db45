//! Background job execution.
//!
//! A [`Coordinator`] runs every job on its own named worker thread. The worker reports
//! [`JobEvent`]s over an `mpsc` channel: zero or more progress events followed by exactly one
//! `Finished` event, which is always the last.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::foundation::error::{StillreelError, StillreelResult};
use crate::job::model::{EncodingJob, JobEvent, JobId, JobOutcome};
use crate::job::pipeline::run_job_as;
use crate::job::toolchain::Toolchain;

type Registry = Arc<Mutex<HashMap<JobId, PathBuf>>>;

/// Starts jobs on worker threads and tracks which ones are active.
#[derive(Debug)]
pub struct Coordinator {
    settings: Arc<Settings>,
    toolchain: Toolchain,
    active: Registry,
}

impl Coordinator {
    /// Coordinator running jobs with `settings` through `toolchain`.
    pub fn new(settings: Settings, toolchain: Toolchain) -> StillreelResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(settings),
            toolchain,
            active: Arc::default(),
        })
    }

    /// Coordinator driving the system `ffmpeg`.
    pub fn with_ffmpeg(settings: Settings) -> StillreelResult<Self> {
        let toolchain = Toolchain::ffmpeg(&settings);
        Self::new(settings, toolchain)
    }

    /// Settings shared by every job.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start `job` on a new worker thread.
    ///
    /// Fails with [`StillreelError::Busy`] when a job on the same folder is active, or when any
    /// job is active and the coordinator is exclusive.
    pub fn start(&self, job: EncodingJob) -> StillreelResult<JobHandle> {
        job.validate()?;

        let id = JobId::next();
        let folder = folder_key(&job.folder);
        {
            let mut active = lock(&self.active);
            if let Some(other) = active
                .iter()
                .find_map(|(other, f)| (*f == folder).then_some(*other))
            {
                return Err(StillreelError::busy(format!(
                    "job {other} is already encoding '{}'",
                    job.folder.display()
                )));
            }
            if self.settings.exclusive
                && let Some(other) = active.keys().min()
            {
                return Err(StillreelError::busy(format!("job {other} is still running")));
            }
            active.insert(id, folder);
        }

        let registration = Registration {
            registry: Arc::clone(&self.active),
            id,
        };
        let settings = Arc::clone(&self.settings);
        let toolchain = self.toolchain.clone();
        let (tx, rx) = mpsc::channel();

        std::thread::Builder::new()
            .name(format!("stillreel-job-{id}"))
            .spawn(move || work(id, job, &settings, &toolchain, registration, tx))
            .map_err(|e| StillreelError::io(format!("failed to spawn worker thread: {e}")))?;

        tracing::debug!(job = %id, "worker started");
        Ok(JobHandle { id, rx })
    }

    /// Identifiers of the jobs currently running, in start order.
    pub fn active_jobs(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = lock(&self.active).keys().copied().collect();
        ids.sort();
        ids
    }
}

/// Receiving end of one job's events.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    rx: Receiver<JobEvent>,
}

impl JobHandle {
    /// Identifier of the job.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Next event, waiting at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<JobEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Events already delivered, without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = JobEvent> + '_ {
        self.rx.try_iter()
    }

    /// Block until the job finishes, forwarding each progress value to `on_progress`.
    ///
    /// Returns a [`StillreelError::Timeout`] when no outcome arrives within `timeout`. A worker
    /// that vanished without reporting yields an internal failure outcome.
    pub fn wait(
        &self,
        timeout: Duration,
        mut on_progress: impl FnMut(u8),
    ) -> StillreelResult<JobOutcome> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let event = match deadline {
                Some(deadline) => self
                    .rx
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match event {
                Ok(JobEvent::Progress { percent, .. }) => on_progress(percent),
                Ok(JobEvent::Finished { outcome, .. }) => return Ok(outcome),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(StillreelError::timeout(format!(
                        "job {} did not finish within {timeout:?}",
                        self.id
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Ok(JobOutcome::internal(format!(
                        "worker for job {} exited without reporting completion",
                        self.id
                    )));
                }
            }
        }
    }
}

fn work(
    id: JobId,
    job: EncodingJob,
    settings: &Settings,
    toolchain: &Toolchain,
    registration: Registration,
    tx: Sender<JobEvent>,
) {
    let progress = tx.clone();
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        run_job_as(id, &job, settings, toolchain, |percent| {
            let _ = progress.send(JobEvent::Progress { job: id, percent });
        })
    }));

    let outcome = result.unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::error!(job = %id, %message, "worker panicked");
        JobOutcome::internal(format!("worker panicked: {message}"))
    });

    // The folder is free again by the time the caller observes `Finished`.
    drop(registration);
    if tx.send(JobEvent::Finished { job: id, outcome }).is_err() {
        tracing::debug!(job = %id, "job handle dropped before completion");
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

/// Removes a job from the registry when dropped, unwinding included.
struct Registration {
    registry: Registry,
    id: JobId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        lock(&self.registry).remove(&self.id);
    }
}

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<JobId, PathBuf>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn folder_key(folder: &Path) -> PathBuf {
    std::fs::canonicalize(folder).unwrap_or_else(|_| folder.to_path_buf())
}

#[cfg(test)]
#[path = "../../tests/unit/job/worker.rs"]
mod tests;
