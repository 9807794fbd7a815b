use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};

/// Internal audio sample rate used across decode/mix/encode.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Internal channel count (interleaved stereo).
pub const MIX_CHANNELS: u16 = 2;

/// Container extensions accepted for background video.
pub const SUPPORTED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];
/// Container extensions accepted for background audio.
pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "ogg", "flac"];

/// Whether an asset is the background clip or the background track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Background video clip.
    Video,
    /// Background audio track.
    Audio,
}

impl MediaKind {
    fn supported_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Video => SUPPORTED_VIDEO_EXTENSIONS,
            Self::Audio => SUPPORTED_AUDIO_EXTENSIONS,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => f.write_str("video"),
            Self::Audio => f.write_str("audio"),
        }
    }
}

/// A resolved local media file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Video or audio.
    pub kind: MediaKind,
    /// Local path, already downloaded.
    pub path: PathBuf,
    /// Source duration in seconds.
    pub duration_secs: f64,
    /// Whether the file carries an audio stream. Always `true` for audio assets.
    pub has_audio: bool,
}

impl MediaAsset {
    /// Describe a video clip whose metadata is already known.
    pub fn video(path: impl Into<PathBuf>, duration_secs: f64, has_audio: bool) -> Self {
        Self {
            kind: MediaKind::Video,
            path: path.into(),
            duration_secs,
            has_audio,
        }
    }

    /// Describe an audio track whose metadata is already known.
    pub fn audio(path: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            kind: MediaKind::Audio,
            path: path.into(),
            duration_secs,
            has_audio: true,
        }
    }

    /// Build an asset by probing `path` with `ffprobe`.
    pub fn probe(kind: MediaKind, path: impl Into<PathBuf>) -> ReelResult<Self> {
        let path = path.into();
        let info = probe_media(&path)?;
        match kind {
            MediaKind::Video if !info.has_video => {
                return Err(ReelError::missing_asset(format!(
                    "'{}' has no video stream",
                    path.display()
                )));
            }
            MediaKind::Audio if !info.has_audio => {
                return Err(ReelError::missing_asset(format!(
                    "'{}' has no audio stream",
                    path.display()
                )));
            }
            _ => {}
        }
        Ok(Self {
            kind,
            path,
            duration_secs: info.duration_secs,
            has_audio: info.has_audio,
        })
    }

    /// Check that the file is present and has an accepted container extension.
    ///
    /// Only filesystem metadata is read; the media content is not opened.
    pub fn check_usable(&self) -> ReelResult<()> {
        let meta = std::fs::metadata(&self.path).map_err(|e| {
            ReelError::missing_asset(format!(
                "{} asset '{}' is not readable: {e}",
                self.kind,
                self.path.display()
            ))
        })?;
        if !meta.is_file() {
            return Err(ReelError::missing_asset(format!(
                "{} asset '{}' is not a regular file",
                self.kind,
                self.path.display()
            )));
        }
        if !has_supported_extension(&self.path, self.kind.supported_extensions()) {
            return Err(ReelError::missing_asset(format!(
                "{} asset '{}' has an unsupported container (expected one of {})",
                self.kind,
                self.path.display(),
                self.kind.supported_extensions().join(", ")
            )));
        }
        Ok(())
    }
}

fn has_supported_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| allowed.contains(&e.as_str()))
}

/// Stream-level facts reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaProbe {
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// First video stream dimensions, if any.
    pub video_size: Option<(u32, u32)>,
    /// At least one video stream is present.
    pub has_video: bool,
    /// At least one audio stream is present.
    pub has_audio: bool,
}

/// Probe media metadata through `ffprobe`.
pub fn probe_media(source_path: &Path) -> ReelResult<MediaProbe> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::render(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::render(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout).map_err(|e| {
        ReelError::render(format!(
            "ffprobe output for '{}' unusable: {e}",
            source_path.display()
        ))
    })
}

pub(crate) fn parse_probe_json(bytes: &[u8]) -> Result<MediaProbe, String> {
    #[derive(Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        duration: Option<String>,
    }
    #[derive(Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut =
        serde_json::from_slice(bytes).map_err(|e| format!("json parse failed: {e}"))?;

    let parse_secs = |s: &Option<String>| s.as_deref().and_then(|v| v.parse::<f64>().ok());
    let format_duration = parsed.format.as_ref().and_then(|f| parse_secs(&f.duration));
    let stream_duration = parsed
        .streams
        .iter()
        .filter_map(|s| parse_secs(&s.duration))
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));
    let duration_secs = format_duration
        .or(stream_duration)
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| "no positive duration reported".to_owned())?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let video_size = video.and_then(|s| Some((s.width?, s.height?)));
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(MediaProbe {
        duration_secs,
        video_size,
        has_video: video.is_some(),
        has_audio,
    })
}

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug)]
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }
}

/// Decode audio from a media file to stereo interleaved `f32` PCM at `sample_rate`.
///
/// Files without an audio stream decode to empty PCM.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> ReelResult<AudioPcm> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ReelError::render(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        // ffmpeg reports a missing audio stream as an error.
        if msg.contains("Stream specifier")
            || msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
            || msg.contains("does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels: MIX_CHANNELS,
                interleaved_f32: Vec::new(),
            });
        }
        return Err(ReelError::render(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(ReelError::render(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let interleaved_f32 = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Ok(AudioPcm {
        sample_rate,
        channels: MIX_CHANNELS,
        interleaved_f32,
    })
}

/// Return `true` when `tool -version` runs successfully from `PATH`.
pub fn is_tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
