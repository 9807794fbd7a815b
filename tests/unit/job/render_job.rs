use super::*;
use crate::foundation::error::ErrorKind;

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tmp")).unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"").unwrap();
        Self { dir }
    }

    fn inputs(&self, poem: &str, duration: f64) -> RenderInputs {
        RenderInputs {
            poem: poem.to_owned(),
            video: Some(MediaAsset::video(self.dir.path().join("clip.mp4"), 30.0, false)),
            audio: None,
            style: StyleConfig::default().with_duration(duration),
            output_dir: self.dir.path().join("out"),
        }
    }

    fn opts(&self) -> RenderOpts {
        RenderOpts::default().with_temp_root(self.dir.path().join("tmp"))
    }

    fn entries(&self, sub: &str) -> usize {
        std::fs::read_dir(self.dir.path().join(sub)).unwrap().count()
    }
}

#[test]
fn empty_poem_fails_in_segmenting_without_artifacts() {
    let fx = Fixture::new();
    let job = RenderJob::new(fx.inputs("  \n\n \t ", 15.0));
    let out = job.output_path();
    let done = job.run(&fx.opts());

    let failure = done.failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::EmptyText);
    assert_eq!(failure.stage, JobStage::Segmenting);
    assert_eq!(
        done.trail,
        vec!["created", "resolving", "reconciling", "segmenting", "failed"]
    );
    assert!(!out.exists());
    assert_eq!(fx.entries("out"), 0);
    assert_eq!(fx.entries("tmp"), 0);
}

#[test]
fn zero_duration_fails_before_media_is_touched() {
    let fx = Fixture::new();
    let mut inputs = fx.inputs("a line", 0.0);
    inputs.video = Some(MediaAsset::video("/no/such/clip.mp4", 30.0, false));
    let done = RenderJob::new(inputs).run(&fx.opts());

    let failure = done.failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::InvalidDuration);
    assert_eq!(failure.stage, JobStage::Resolving);
    assert_eq!(done.trail, vec!["created", "resolving", "failed"]);
}

#[test]
fn missing_or_unsupported_video_is_missing_asset() {
    let fx = Fixture::new();

    let mut none = fx.inputs("a line", 15.0);
    none.video = None;
    let done = RenderJob::new(none).run(&fx.opts());
    assert_eq!(done.failure().unwrap().kind, ErrorKind::MissingAsset);

    std::fs::write(fx.dir.path().join("clip.gif"), b"GIF89a").unwrap();
    let mut gif = fx.inputs("a line", 15.0);
    gif.video = Some(MediaAsset::video(fx.dir.path().join("clip.gif"), 30.0, false));
    let done = RenderJob::new(gif).run(&fx.opts());
    assert_eq!(done.failure().unwrap().kind, ErrorKind::MissingAsset);
    assert_eq!(done.failure().unwrap().stage, JobStage::Resolving);
}

#[test]
fn zero_length_video_fails_in_reconciling() {
    let fx = Fixture::new();
    let mut inputs = fx.inputs("a line", 15.0);
    inputs.video = Some(MediaAsset::video(fx.dir.path().join("clip.mp4"), 0.0, false));
    let done = RenderJob::new(inputs).run(&fx.opts());
    let failure = done.failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::MissingAsset);
    assert_eq!(failure.stage, JobStage::Reconciling);
}

#[test]
fn bad_style_is_invalid_style() {
    let fx = Fixture::new();
    let mut inputs = fx.inputs("a line", 15.0);
    inputs.style = inputs.style.with_font_size(0);
    let done = RenderJob::new(inputs).run(&fx.opts());
    assert_eq!(done.failure().unwrap().kind, ErrorKind::InvalidStyle);
}

#[test]
fn unusable_audio_is_dropped_not_fatal() {
    let fx = Fixture::new();
    let mut inputs = fx.inputs("", 15.0);
    inputs.audio = Some(MediaAsset::audio("/no/such/track.mp3", 10.0));
    let done = RenderJob::new(inputs).run(&fx.opts());
    // Gets past resolving; stops on the empty poem.
    assert_eq!(done.failure().unwrap().stage, JobStage::Segmenting);
}

#[test]
fn identical_inputs_fail_identically() {
    let fx = Fixture::new();
    for (poem, duration) in [("", 15.0), ("x", -1.0), ("x", f64::NAN)] {
        let a = RenderJob::new(fx.inputs(poem, duration)).run(&fx.opts());
        let b = RenderJob::new(fx.inputs(poem, duration)).run(&fx.opts());
        assert_ne!(a.id, b.id);
        assert_eq!(a.failure().unwrap().kind, b.failure().unwrap().kind);
        assert_eq!(a.trail, b.trail);
    }
}

#[test]
fn output_is_named_after_the_job_id() {
    let fx = Fixture::new();
    let id = JobId(uuid::Uuid::nil());
    let job = RenderJob::with_id(id, fx.inputs("x", 15.0));
    assert_eq!(
        job.output_path(),
        fx.dir
            .path()
            .join("out")
            .join("story_00000000000000000000000000000000.mp4")
    );
    assert_eq!(job.state().name(), "created");
}

#[test]
fn failure_serializes_with_snake_case_kind() {
    let fx = Fixture::new();
    let done = RenderJob::new(fx.inputs("", 15.0)).run(&fx.opts());
    let json = serde_json::to_value(&done).unwrap();
    assert_eq!(json["outcome"]["Err"]["kind"], "empty_text");
    assert_eq!(json["outcome"]["Err"]["stage"], "segmenting");
    assert_eq!(done.state_name(), "failed");
}
