use serde::Serialize;

use crate::assets::media::MediaAsset;
use crate::foundation::error::{ErrorKind, ReelError};
use crate::render::compositor::RenderedVideo;
use crate::timing::reconcile::DurationPlan;
use crate::timing::segment::SegmentTimeline;

/// Stage in which a job was working.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Resolving,
    Reconciling,
    Segmenting,
    Compositing,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Resolving => "resolving",
            Self::Reconciling => "reconciling",
            Self::Segmenting => "segmenting",
            Self::Compositing => "compositing",
        })
    }
}

/// Terminal failure record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    /// Failure class.
    pub kind: ErrorKind,
    /// Human-readable message, including the error prefix.
    pub message: String,
    /// Stage that failed.
    pub stage: JobStage,
}

impl JobFailure {
    pub(crate) fn new(stage: JobStage, err: &ReelError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            stage,
        }
    }
}

impl std::fmt::Display for JobFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Job lifecycle. Each state carries what the next stage needs; `Done` and `Failed` are terminal.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Created,
    Resolving,
    Reconciling {
        video: MediaAsset,
        audio: Option<MediaAsset>,
    },
    Segmenting {
        plan: DurationPlan,
    },
    Compositing {
        plan: DurationPlan,
        segments: SegmentTimeline,
    },
    Done {
        video: RenderedVideo,
    },
    Failed {
        failure: JobFailure,
    },
}

impl JobState {
    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Resolving => "resolving",
            Self::Reconciling { .. } => "reconciling",
            Self::Segmenting { .. } => "segmenting",
            Self::Compositing { .. } => "compositing",
            Self::Done { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }

    /// `true` for `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Failed { .. })
    }

    /// The stage a non-terminal working state belongs to.
    pub fn stage(&self) -> Option<JobStage> {
        match self {
            Self::Resolving => Some(JobStage::Resolving),
            Self::Reconciling { .. } => Some(JobStage::Reconciling),
            Self::Segmenting { .. } => Some(JobStage::Segmenting),
            Self::Compositing { .. } => Some(JobStage::Compositing),
            Self::Created | Self::Done { .. } | Self::Failed { .. } => None,
        }
    }
}
