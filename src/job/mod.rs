//! Render jobs: the per-request state machine and a parallel batch runner.

pub(crate) mod batch;
pub(crate) mod render_job;
pub(crate) mod state;
