use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt};

use versereel::{
    AssetResolver, CompletedJob, DEFAULT_STALE_AGE, LocalAssetResolver, RenderInputs, RenderJob,
    RenderOpts, ResolveRequest, StyleConfig,
};

#[derive(Parser, Debug)]
#[command(name = "versereel", version, about = "Render poems over background clips as story videos")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one story video (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
    /// Write a PNG preview of the poem text.
    Preview(PreviewArgs),
    /// Render several job files in parallel.
    Batch(BatchArgs),
    /// Remove stale per-job temporary directories.
    Sweep(SweepArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Job file (JSON). Flags below override its fields.
    #[arg(long)]
    job: Option<PathBuf>,

    /// Poem text.
    #[arg(long, conflicts_with = "poem_file")]
    poem: Option<String>,
    /// File holding the poem text.
    #[arg(long)]
    poem_file: Option<PathBuf>,

    /// Background video.
    #[arg(long)]
    video: Option<PathBuf>,
    /// Background audio track.
    #[arg(long)]
    audio: Option<PathBuf>,
    /// Theme used to pick media from `--video-dir`/`--audio-dir`.
    #[arg(long)]
    theme: Option<String>,
    /// Directory of candidate background videos.
    #[arg(long)]
    video_dir: Option<PathBuf>,
    /// Directory of candidate background tracks.
    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// Style file (JSON).
    #[arg(long)]
    style: Option<PathBuf>,
    /// Output duration in seconds.
    #[arg(long)]
    duration: Option<f64>,
    /// Font size in pixels.
    #[arg(long)]
    font_size: Option<u32>,

    /// Output directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Poem text.
    #[arg(long, conflicts_with = "poem_file")]
    poem: Option<String>,
    /// File holding the poem text.
    #[arg(long)]
    poem_file: Option<PathBuf>,
    /// Style file (JSON).
    #[arg(long)]
    style: Option<PathBuf>,
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Job files (JSON).
    #[arg(required = true)]
    jobs: Vec<PathBuf>,
    /// Worker threads (defaults to the number of CPUs).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct SweepArgs {
    /// Temp root to sweep (defaults to the configured temp root).
    #[arg(long)]
    root: Option<PathBuf>,
    /// Minimum age in seconds.
    #[arg(long, default_value_t = DEFAULT_STALE_AGE.as_secs())]
    max_age_secs: u64,
}

/// On-disk description of one render. Relative paths are taken from the job file's directory.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct JobFile {
    poem: Option<String>,
    poem_file: Option<PathBuf>,
    video: Option<PathBuf>,
    audio: Option<PathBuf>,
    theme: Option<String>,
    video_dir: Option<PathBuf>,
    audio_dir: Option<PathBuf>,
    style: Option<StyleConfig>,
    output_dir: Option<PathBuf>,
}

impl JobFile {
    fn from_path(path: &Path) -> anyhow::Result<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open job file '{}'", path.display()))?;
        let mut job: Self = serde_json::from_reader(std::io::BufReader::new(f))
            .with_context(|| format!("parse job file '{}'", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for p in [
            &mut job.poem_file,
            &mut job.video,
            &mut job.audio,
            &mut job.video_dir,
            &mut job.audio_dir,
            &mut job.output_dir,
        ]
        .into_iter()
        .flatten()
        {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        if let Some(style) = job.style.as_mut()
            && let Some(font) = style.font_path.as_mut()
            && font.is_relative()
        {
            *font = base.join(&*font);
        }
        Ok(job)
    }

    fn poem(&self) -> anyhow::Result<String> {
        match (&self.poem, &self.poem_file) {
            (Some(p), _) => Ok(p.clone()),
            (None, Some(f)) => {
                std::fs::read_to_string(f).with_context(|| format!("read poem '{}'", f.display()))
            }
            (None, None) => anyhow::bail!("job needs 'poem' or 'poem_file'"),
        }
    }

    /// Resolve media and build the job. Resolution failures surface as `AssetUnavailable`.
    fn into_job(self) -> anyhow::Result<RenderJob> {
        let poem = self.poem()?;
        let video_dir = self.video_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let mut resolver = LocalAssetResolver::new(video_dir);
        if let Some(dir) = &self.audio_dir {
            resolver = resolver.with_audio_dir(dir);
        }
        let resolved = resolver.resolve(&ResolveRequest {
            theme: self.theme.clone().unwrap_or_default(),
            video: self.video.clone(),
            audio: self.audio.clone(),
        })?;
        Ok(RenderJob::new(RenderInputs {
            poem,
            video: Some(resolved.video),
            audio: resolved.audio,
            style: self.style.unwrap_or_default(),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("out")),
        }))
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("VERSEREEL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let res = match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Sweep(args) => cmd_sweep(args),
    };
    match res {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_style(path: Option<&Path>) -> anyhow::Result<StyleConfig> {
    Ok(match path {
        Some(p) => StyleConfig::from_path(p)?,
        None => StyleConfig::default(),
    })
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<ExitCode> {
    let mut job = match &args.job {
        Some(p) => JobFile::from_path(p)?,
        None => JobFile::default(),
    };
    if args.poem.is_some() || args.poem_file.is_some() {
        job.poem = args.poem;
        job.poem_file = args.poem_file;
    }
    job.video = args.video.or(job.video);
    job.audio = args.audio.or(job.audio);
    job.theme = args.theme.or(job.theme);
    job.video_dir = args.video_dir.or(job.video_dir);
    job.audio_dir = args.audio_dir.or(job.audio_dir);
    job.output_dir = args.out_dir.or(job.output_dir);
    if args.style.is_some() {
        job.style = Some(load_style(args.style.as_deref())?);
    }
    let mut style = job.style.take().unwrap_or_default();
    if let Some(d) = args.duration {
        style = style.with_duration(d);
    }
    if let Some(px) = args.font_size {
        style = style.with_font_size(px);
    }
    job.style = Some(style);

    let done = job.into_job()?.run(&RenderOpts::from_env());
    report(&[done])
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<ExitCode> {
    let poem = JobFile {
        poem: args.poem,
        poem_file: args.poem_file,
        ..Default::default()
    }
    .poem()?;
    let style = load_style(args.style.as_deref())?;
    let opts = RenderOpts::from_env();
    versereel::write_text_preview_png(&poem, &style, opts.font_dir.as_deref(), &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<ExitCode> {
    let jobs = args
        .jobs
        .iter()
        .map(|p| {
            JobFile::from_path(p)?
                .into_job()
                .with_context(|| format!("job file '{}'", p.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let done = versereel::run_batch(jobs, &RenderOpts::from_env(), args.threads)?;
    report(&done)
}

fn cmd_sweep(args: SweepArgs) -> anyhow::Result<ExitCode> {
    let root = args.root.unwrap_or_else(|| RenderOpts::from_env().temp_root);
    let removed =
        versereel::sweep_stale_temp_dirs(&root, Duration::from_secs(args.max_age_secs))?;
    eprintln!("removed {removed} stale temp dir(s) under {}", root.display());
    Ok(ExitCode::SUCCESS)
}

/// Print each outcome as one JSON line; fail when any job failed.
fn report(done: &[CompletedJob]) -> anyhow::Result<ExitCode> {
    for c in done {
        println!("{}", serde_json::to_string(c)?);
        match c.result() {
            Ok(v) => eprintln!("wrote {}", v.path.display()),
            Err(f) => eprintln!("job {}: {f}", c.id),
        }
    }
    Ok(if done.iter().all(|c| c.failure().is_none()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
