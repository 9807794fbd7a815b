use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::assets::media::MediaAsset;
use crate::config::opts::RenderOpts;
use crate::config::style::StyleConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::state::{JobFailure, JobStage, JobState};
use crate::render::compositor::{RenderedVideo, composite};
use crate::timing::reconcile::reconcile;
use crate::timing::segment::segment_text;

/// Unique job identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub uuid::Uuid);

impl JobId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Everything one render needs from the caller.
#[derive(Clone, Debug)]
pub struct RenderInputs {
    /// Poem text, possibly multi-line.
    pub poem: String,
    /// Background clip; required.
    pub video: Option<MediaAsset>,
    /// Background track; optional.
    pub audio: Option<MediaAsset>,
    pub style: StyleConfig,
    /// Directory receiving `story_<id>.mp4`.
    pub output_dir: PathBuf,
}

/// One render request. Consumed by [`RenderJob::run`].
#[derive(Debug)]
pub struct RenderJob {
    id: JobId,
    inputs: RenderInputs,
    state: JobState,
}

/// A job that reached `Done` or `Failed`.
#[derive(Clone, Debug, Serialize)]
pub struct CompletedJob {
    pub id: JobId,
    /// `Done` payload or `Failed` record.
    pub outcome: Result<RenderedVideo, JobFailure>,
    /// Names of every state entered, in order, starting with `created`.
    pub trail: Vec<&'static str>,
}

impl CompletedJob {
    /// The rendered video, or the failure.
    pub fn result(&self) -> Result<&RenderedVideo, &JobFailure> {
        self.outcome.as_ref()
    }

    /// The failure, if the job failed.
    pub fn failure(&self) -> Option<&JobFailure> {
        self.outcome.as_ref().err()
    }

    /// Name of the terminal state.
    pub fn state_name(&self) -> &'static str {
        match self.outcome {
            Ok(_) => "done",
            Err(_) => "failed",
        }
    }
}

impl RenderJob {
    /// Create a job with a fresh id.
    pub fn new(inputs: RenderInputs) -> Self {
        Self::with_id(JobId::new(), inputs)
    }

    /// Create a job with a caller-chosen id.
    pub fn with_id(id: JobId, inputs: RenderInputs) -> Self {
        Self {
            id,
            inputs,
            state: JobState::Created,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Where the output file will be written.
    pub fn output_path(&self) -> PathBuf {
        self.inputs.output_dir.join(format!("story_{}.mp4", self.id))
    }

    /// Drive the job to a terminal state. Every stage runs at most once; the first error ends it.
    #[tracing::instrument(skip_all, fields(job = %self.id))]
    pub fn run(mut self, opts: &RenderOpts) -> CompletedJob {
        let mut trail = vec![self.state.name()];
        while !self.state.is_terminal() {
            let stage = self.state.stage();
            let current = std::mem::replace(&mut self.state, JobState::Created);
            let next = match self.step(current, opts) {
                Ok(next) => next,
                Err(err) => {
                    let stage = stage.unwrap_or(JobStage::Resolving);
                    tracing::warn!(%stage, error = %err, "job failed");
                    JobState::Failed {
                        failure: JobFailure::new(stage, &err),
                    }
                }
            };
            tracing::info!(from = trail.last().copied().unwrap_or("created"), to = next.name(), "job state");
            trail.push(next.name());
            self.state = next;
        }
        let outcome = match self.state {
            JobState::Done { video } => Ok(video),
            JobState::Failed { failure } => Err(failure),
            other => Err(JobFailure {
                kind: crate::foundation::error::ErrorKind::Render,
                message: format!("job stopped in non-terminal state '{}'", other.name()),
                stage: other.stage().unwrap_or(JobStage::Resolving),
            }),
        };
        CompletedJob {
            id: self.id,
            outcome,
            trail,
        }
    }

    fn step(&self, state: JobState, opts: &RenderOpts) -> ReelResult<JobState> {
        match state {
            JobState::Created => Ok(JobState::Resolving),
            JobState::Resolving => {
                let (video, audio) = self.resolve()?;
                Ok(JobState::Reconciling { video, audio })
            }
            JobState::Reconciling { video, audio } => {
                let plan = reconcile(Some(&video), audio.as_ref(), self.inputs.style.duration_secs)?;
                Ok(JobState::Segmenting { plan })
            }
            JobState::Segmenting { plan } => {
                let segments = segment_text(&self.inputs.poem, plan.target_secs)?;
                Ok(JobState::Compositing { plan, segments })
            }
            JobState::Compositing { plan, segments } => {
                let id = self.id.to_string();
                let tag = id.get(..8).unwrap_or(&id);
                let video = composite(
                    &plan,
                    &segments,
                    &self.inputs.style,
                    opts,
                    tag,
                    &self.output_path(),
                )?;
                tracing::info!(path = %video.path.display(), frames = video.frame_count, "render finished");
                Ok(JobState::Done { video })
            }
            terminal @ (JobState::Done { .. } | JobState::Failed { .. }) => Ok(terminal),
        }
    }

    /// Validate style (duration first) and check that the assets are present and supported.
    ///
    /// Media content is not opened here. A bad audio file is dropped so the reconciler can fall
    /// back to the video's own track or silence.
    fn resolve(&self) -> ReelResult<(MediaAsset, Option<MediaAsset>)> {
        self.inputs.style.validate()?;
        let video = self
            .inputs
            .video
            .clone()
            .ok_or_else(|| ReelError::missing_asset("no video asset supplied"))?;
        video.check_usable()?;

        let audio = match &self.inputs.audio {
            Some(a) => match a.check_usable() {
                Ok(()) => Some(a.clone()),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unusable audio asset");
                    None
                }
            },
            None => None,
        };
        Ok((video, audio))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/render_job.rs"]
mod tests;
