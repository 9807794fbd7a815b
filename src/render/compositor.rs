use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::assets::media::MIX_SAMPLE_RATE;
use crate::audio::build_audio_track;
use crate::audio::manifest::frame_to_sample;
use crate::config::opts::RenderOpts;
use crate::config::style::StyleConfig;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::batch::TEMP_DIR_PREFIX;
use crate::render::composite::over_in_place;
use crate::render::decoder::VideoFrameStream;
use crate::render::frame::FrameRGBA;
use crate::render::overlay::{OverlayRenderer, TextOverlay};
use crate::timing::reconcile::{DurationPlan, SourceWindow, WindowPass};
use crate::timing::segment::{SegmentTimeline, TextSegment};

/// A finished output file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedVideo {
    /// Output file path.
    pub path: PathBuf,
    /// Encoded duration in seconds (`frame_count / fps`).
    pub duration_secs: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Number of encoded video frames.
    pub frame_count: u64,
    /// `true` when the audio track comes from a real source rather than generated silence.
    pub has_audio: bool,
}

/// Supplies background frames pass by pass.
pub(crate) trait BackgroundSource {
    /// Start delivering frames for `pass`.
    fn open_pass(&mut self, pass: &WindowPass) -> ReelResult<()>;
    /// Write the next frame of the open pass into `dst`.
    fn next_frame_into(&mut self, dst: &mut [u8]) -> ReelResult<()>;
    /// Release the current pass, if any.
    fn close(&mut self);
}

/// Background frames decoded from a file by `ffmpeg`.
pub(crate) struct FfmpegBackground {
    path: PathBuf,
    canvas: Canvas,
    fps: Fps,
    stream: Option<VideoFrameStream>,
}

impl FfmpegBackground {
    pub(crate) fn new(path: &Path, canvas: Canvas, fps: Fps) -> Self {
        Self {
            path: path.to_path_buf(),
            canvas,
            fps,
            stream: None,
        }
    }
}

impl BackgroundSource for FfmpegBackground {
    fn open_pass(&mut self, pass: &WindowPass) -> ReelResult<()> {
        self.close();
        self.stream = Some(VideoFrameStream::open(&self.path, pass.source, self.canvas, self.fps)?);
        Ok(())
    }

    fn next_frame_into(&mut self, dst: &mut [u8]) -> ReelResult<()> {
        self.stream
            .as_mut()
            .ok_or_else(|| ReelError::render("no video decode pass open"))?
            .next_frame_into(dst)
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            tracing::debug!(frames = stream.frames_read(), "video decode pass closed");
            stream.close();
        }
    }
}

/// Removes the output file on drop unless the render completed.
struct PartialOutputGuard(Option<PathBuf>);

impl PartialOutputGuard {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for PartialOutputGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take()
            && path.exists()
        {
            tracing::debug!(path = %path.display(), "removing partial output");
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Per-frame work of a render, independent of where frames come from and go to.
pub(crate) struct FrameLoop<'a> {
    pub(crate) window: &'a SourceWindow,
    pub(crate) segments: &'a SegmentTimeline,
    pub(crate) canvas: Canvas,
    pub(crate) fps: Fps,
    pub(crate) frame_count: u64,
}

impl FrameLoop<'_> {
    /// Decode, overlay and push every frame. Overlays are rasterized once per segment.
    pub(crate) fn run(
        &self,
        background: &mut dyn BackgroundSource,
        overlay_for: &mut dyn FnMut(&TextSegment) -> ReelResult<TextOverlay>,
        sink: &mut dyn FrameSink,
    ) -> ReelResult<()> {
        let passes = self.window.passes();
        let mut bg = FrameRGBA::solid(self.canvas.width, self.canvas.height, [0, 0, 0, 255]);
        let mut out = bg.clone();
        let mut open_pass: Option<u32> = None;
        let mut current: Option<(usize, TextOverlay)> = None;
        let end_secs = self.window.target_secs;

        for f in 0..self.frame_count {
            let idx = FrameIndex(f);
            let t = self.fps.frame_time_secs(idx).min(end_secs);

            let pass_i = self.window.pass_index_at(t);
            if open_pass != Some(pass_i) {
                let pass = passes
                    .get(pass_i as usize)
                    .ok_or_else(|| ReelError::render(format!("no decode pass {pass_i}")))?;
                background.open_pass(pass)?;
                open_pass = Some(pass_i);
            }
            background.next_frame_into(&mut bg.data)?;
            out.data.copy_from_slice(&bg.data);

            if let Some(seg) = self.segments.segment_at(t) {
                if current.as_ref().map(|(i, _)| *i) != Some(seg.index) {
                    tracing::debug!(segment = seg.index, frame = f, "text segment starts");
                    current = Some((seg.index, overlay_for(seg)?));
                }
                if let Some((_, overlay)) = current.as_ref() {
                    over_in_place(&mut out, overlay);
                }
            }

            sink.push_frame(idx, &out)?;
        }
        background.close();
        Ok(())
    }
}

/// Render `plan` with `segments` drawn over it into an MP4 at `out_path`.
///
/// Temporary files live in a directory under `opts.temp_root` named after `job_tag`; it and any
/// partial output are removed on every exit path.
#[tracing::instrument(skip_all, fields(job = job_tag, out = %out_path.display()))]
pub(crate) fn composite(
    plan: &DurationPlan,
    segments: &SegmentTimeline,
    style: &StyleConfig,
    opts: &RenderOpts,
    job_tag: &str,
    out_path: &Path,
) -> ReelResult<RenderedVideo> {
    let canvas = style.canvas;
    let fps = opts.fps;
    let frame_count = fps.frames_for_duration(plan.target_secs);

    std::fs::create_dir_all(&opts.temp_root).map_err(|e| {
        ReelError::render(format!(
            "failed to create temp root '{}': {e}",
            opts.temp_root.display()
        ))
    })?;
    let scratch = tempfile::Builder::new()
        .prefix(&format!("{TEMP_DIR_PREFIX}{job_tag}-"))
        .tempdir_in(&opts.temp_root)
        .map_err(|e| ReelError::render(format!("failed to create job temp dir: {e}")))?;

    let mut renderer = OverlayRenderer::new(style, opts.font_dir.as_deref())?;
    tracing::info!(
        font = %renderer.font_path().display(),
        fallbacks = renderer.font_count().saturating_sub(1),
        "font resolved"
    );

    let total_samples = frame_to_sample(frame_count, fps, MIX_SAMPLE_RATE);
    let audio = build_audio_track(plan, total_samples, opts, &scratch.path().join("audio.f32le"))?;

    let mut guard = PartialOutputGuard(Some(out_path.to_path_buf()));
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: out_path.to_path_buf(),
        overwrite: true,
        bg_rgba: opts.bg_rgba,
    });
    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps,
        audio: Some(audio.input.clone()),
    })?;

    let mut background = FfmpegBackground::new(&plan.video.path, canvas, fps);
    let frame_loop = FrameLoop {
        window: &plan.video_window,
        segments,
        canvas,
        fps,
        frame_count,
    };
    tracing::info!(
        frames = frame_count,
        passes = plan.video_window.pass_count(),
        looped = plan.video_window.is_looped(),
        segments = segments.len(),
        audio_gain_db = ?audio.loudness.as_ref().map(|l| l.gain_db),
        "compositing"
    );
    frame_loop.run(
        &mut background,
        &mut |seg: &TextSegment| renderer.render(&seg.text, style),
        &mut sink,
    )?;
    sink.end()?;
    guard.disarm();

    Ok(RenderedVideo {
        path: out_path.to_path_buf(),
        duration_secs: frame_count as f64 * fps.frame_duration_secs(),
        width: canvas.width,
        height: canvas.height,
        frame_count,
        has_audio: audio.has_source,
    })
}
