use std::path::Path;
use std::time::{Duration, SystemTime};

use rayon::prelude::*;

use crate::config::opts::RenderOpts;
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::render_job::{CompletedJob, RenderJob};

/// Default age after which a leftover job temp directory is considered stale.
pub const DEFAULT_STALE_AGE: Duration = Duration::from_secs(60 * 60);

/// Prefix of every per-job temporary directory.
pub(crate) const TEMP_DIR_PREFIX: &str = "versereel-";

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::invalid_style("batch 'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::render(format!("failed to build rayon thread pool: {e}")))
}

/// Run independent jobs in parallel. Results come back in input order; one job failing does not
/// affect the others.
pub fn run_batch(
    jobs: Vec<RenderJob>,
    opts: &RenderOpts,
    threads: Option<usize>,
) -> ReelResult<Vec<CompletedJob>> {
    let pool = build_thread_pool(threads)?;
    tracing::info!(jobs = jobs.len(), threads = pool.current_num_threads(), "batch started");
    let done: Vec<CompletedJob> = pool.install(|| jobs.into_par_iter().map(|job| job.run(opts)).collect());
    let failed = done.iter().filter(|c| c.failure().is_some()).count();
    tracing::info!(succeeded = done.len() - failed, failed, "batch finished");
    Ok(done)
}

/// Delete job temp directories under `root` last modified more than `max_age` ago.
///
/// Returns how many were removed. Entries that are not ours or that vanish mid-sweep are skipped.
pub fn sweep_stale_temp_dirs(root: &Path, max_age: Duration) -> ReelResult<usize> {
    let entries = match std::fs::read_dir(root) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(ReelError::render(format!(
                "failed to list temp root '{}': {e}",
                root.display()
            )));
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(TEMP_DIR_PREFIX) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_dir() {
            continue;
        }
        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if age < max_age {
            continue;
        }
        match std::fs::remove_dir_all(entry.path()) {
            Ok(()) => {
                tracing::info!(dir = %entry.path().display(), age_secs = age.as_secs(), "removed stale temp dir");
                removed += 1;
            }
            Err(e) => tracing::warn!(dir = %entry.path().display(), error = %e, "failed to remove stale temp dir"),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::media::MediaAsset;
    use crate::config::style::StyleConfig;
    use crate::foundation::error::ErrorKind;
    use crate::job::render_job::RenderInputs;

    #[test]
    fn sweep_only_touches_old_prefixed_dirs() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("versereel-abc-1")).unwrap();
        std::fs::create_dir(root.path().join("someone-else")).unwrap();
        std::fs::write(root.path().join("versereel-file"), b"x").unwrap();

        assert_eq!(sweep_stale_temp_dirs(root.path(), DEFAULT_STALE_AGE).unwrap(), 0);
        assert!(root.path().join("versereel-abc-1").exists());

        assert_eq!(sweep_stale_temp_dirs(root.path(), Duration::ZERO).unwrap(), 1);
        assert!(!root.path().join("versereel-abc-1").exists());
        assert!(root.path().join("someone-else").exists());
        assert!(root.path().join("versereel-file").exists());
    }

    #[test]
    fn sweep_of_missing_root_is_a_no_op() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(
            sweep_stale_temp_dirs(&root.path().join("nope"), Duration::ZERO).unwrap(),
            0
        );
    }

    #[test]
    fn zero_threads_is_rejected() {
        let err = run_batch(Vec::new(), &RenderOpts::default(), Some(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStyle);
    }

    #[test]
    fn batch_keeps_input_order_and_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.mp4");
        std::fs::write(&clip, b"").unwrap();
        let make = |poem: &str, duration: f64| {
            RenderJob::new(RenderInputs {
                poem: poem.to_owned(),
                video: Some(MediaAsset::video(&clip, 10.0, false)),
                audio: None,
                style: StyleConfig::default().with_duration(duration),
                output_dir: dir.path().to_path_buf(),
            })
        };
        let jobs = vec![make("", 15.0), make("x", 0.0), make("\n", 5.0)];
        let ids: Vec<_> = jobs.iter().map(|j| j.id()).collect();
        let opts = RenderOpts::default().with_temp_root(dir.path().join("tmp"));
        let done = run_batch(jobs, &opts, Some(2)).unwrap();

        assert_eq!(done.iter().map(|c| c.id).collect::<Vec<_>>(), ids);
        let kinds: Vec<ErrorKind> = done.iter().map(|c| c.failure().unwrap().kind).collect();
        assert_eq!(
            kinds,
            vec![ErrorKind::EmptyText, ErrorKind::InvalidDuration, ErrorKind::EmptyText]
        );
    }
}
