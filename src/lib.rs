//! versereel turns a short poem and a background clip into a vertical story video.
//!
//! A render runs as a [`RenderJob`]: inputs are validated, the background is trimmed or looped
//! to the target duration, the poem is split into timed line segments, and frames with the active
//! line drawn over the background are streamed into the system `ffmpeg` together with a
//! loudness-normalized audio track.
#![forbid(unsafe_code)]

mod assets;
mod audio;
mod config;
mod foundation;
mod job;
mod render;
mod resolve;
mod timing;

/// Encoding sinks.
pub mod encode;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, TimeRange};
pub use crate::foundation::error::{ErrorKind, ReelError, ReelResult};

pub use crate::assets::media::{
    MediaAsset, MediaKind, MediaProbe, SUPPORTED_AUDIO_EXTENSIONS, SUPPORTED_VIDEO_EXTENSIONS,
    is_tool_on_path, probe_media,
};
pub use crate::config::color::Rgb8;
pub use crate::config::opts::{LoudnessOpts, RenderOpts};
pub use crate::config::style::{HAlign, StyleConfig, VAlign};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::job::batch::{DEFAULT_STALE_AGE, run_batch, sweep_stale_temp_dirs};
pub use crate::job::render_job::{CompletedJob, JobId, RenderInputs, RenderJob};
pub use crate::job::state::{JobFailure, JobStage, JobState};
pub use crate::render::compositor::RenderedVideo;
pub use crate::render::frame::FrameRGBA;
pub use crate::render::preview::{render_text_preview, write_text_preview_png};
pub use crate::resolve::{AssetResolver, LocalAssetResolver, ResolveRequest, ResolvedAssets};
pub use crate::timing::reconcile::{
    AudioPlan, DurationPlan, SourceWindow, WindowPass, plan_window, reconcile,
};
pub use crate::timing::segment::{SegmentTimeline, TextSegment, normalize_lines, segment_text};
