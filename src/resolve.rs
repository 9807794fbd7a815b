//! Asset resolution contract and a local-directory implementation.

use std::path::{Path, PathBuf};

use crate::assets::media::{MediaAsset, MediaKind, SUPPORTED_AUDIO_EXTENSIONS, SUPPORTED_VIDEO_EXTENSIONS};
use crate::foundation::error::{ReelError, ReelResult};

/// What the caller wants assets for.
#[derive(Clone, Debug, Default)]
pub struct ResolveRequest {
    /// Free-text theme, e.g. "ocean at night".
    pub theme: String,
    /// Use this video instead of searching.
    pub video: Option<PathBuf>,
    /// Use this audio track instead of searching.
    pub audio: Option<PathBuf>,
}

/// Local, probed assets ready for a render.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAssets {
    pub video: MediaAsset,
    pub audio: Option<MediaAsset>,
}

/// Turns a request into local media files. Failures are reported as `AssetUnavailable`.
pub trait AssetResolver {
    fn resolve(&self, request: &ResolveRequest) -> ReelResult<ResolvedAssets>;
}

/// Picks media from local directories by matching theme words against file names.
#[derive(Clone, Debug)]
pub struct LocalAssetResolver {
    video_dir: PathBuf,
    audio_dir: Option<PathBuf>,
}

impl LocalAssetResolver {
    pub fn new(video_dir: impl Into<PathBuf>) -> Self {
        Self {
            video_dir: video_dir.into(),
            audio_dir: None,
        }
    }

    /// Also look for background tracks in `dir`.
    pub fn with_audio_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audio_dir = Some(dir.into());
        self
    }

    fn pick(&self, dir: &Path, kind: MediaKind, theme: &str) -> ReelResult<PathBuf> {
        let allowed = match kind {
            MediaKind::Video => SUPPORTED_VIDEO_EXTENSIONS,
            MediaKind::Audio => SUPPORTED_AUDIO_EXTENSIONS,
        };
        let files = list_media(dir, allowed).map_err(|e| {
            ReelError::asset_unavailable(format!("cannot list {kind} dir '{}': {e}", dir.display()))
        })?;
        pick_for_theme(&files, theme).cloned().ok_or_else(|| {
            ReelError::asset_unavailable(format!("no {kind} files in '{}'", dir.display()))
        })
    }
}

impl AssetResolver for LocalAssetResolver {
    fn resolve(&self, request: &ResolveRequest) -> ReelResult<ResolvedAssets> {
        let video_path = match &request.video {
            Some(p) => p.clone(),
            None => self.pick(&self.video_dir, MediaKind::Video, &request.theme)?,
        };
        let video = MediaAsset::probe(MediaKind::Video, &video_path).map_err(|e| {
            ReelError::asset_unavailable(format!("video '{}': {e}", video_path.display()))
        })?;

        let audio_path = match (&request.audio, &self.audio_dir) {
            (Some(p), _) => Some(p.clone()),
            (None, Some(dir)) => match self.pick(dir, MediaKind::Audio, &request.theme) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(error = %e, "no background audio found");
                    None
                }
            },
            (None, None) => None,
        };
        let audio = audio_path.and_then(|p| match MediaAsset::probe(MediaKind::Audio, &p) {
            Ok(a) => Some(a),
            Err(e) => {
                tracing::warn!(path = %p.display(), error = %e, "audio probe failed; continuing without it");
                None
            }
        });

        tracing::info!(
            video = %video.path.display(),
            audio = ?audio.as_ref().map(|a| a.path.display().to_string()),
            "assets resolved"
        );
        Ok(ResolvedAssets { video, audio })
    }
}

fn list_media(dir: &Path, allowed: &[&str]) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| allowed.iter().any(|a| a.eq_ignore_ascii_case(e)))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// File whose stem shares the most words with `theme`; ties and no matches go to the first file.
pub(crate) fn pick_for_theme<'a>(files: &'a [PathBuf], theme: &str) -> Option<&'a PathBuf> {
    let words: Vec<String> = theme
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .collect();
    let score = |p: &PathBuf| {
        let stem = p
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_lowercase();
        words.iter().filter(|w| stem.contains(w.as_str())).count()
    };
    let mut best: Option<(&PathBuf, usize)> = None;
    for f in files {
        let s = score(f);
        if best.is_none_or(|(_, b)| s > b) {
            best = Some((f, s));
        }
    }
    best.map(|(f, _)| f)
}
