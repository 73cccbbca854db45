//! Encoding jobs: the job model, the synchronous pipeline and the worker coordinator.

/// Job description, events and outcomes.
pub mod model;
/// Image-to-video pipeline run on one thread.
pub mod pipeline;
/// External media collaborators.
pub mod toolchain;
/// Worker threads and the active-job registry.
pub mod worker;

#[cfg(test)]
#[path = "../../tests/unit/job/support.rs"]
pub(crate) mod test_support;
