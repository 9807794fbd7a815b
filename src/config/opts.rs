use std::path::PathBuf;

use crate::foundation::core::Fps;

/// Integrated loudness target for story audio, in LUFS.
pub const DEFAULT_TARGET_LUFS: f64 = -14.0;
/// Sample-peak ceiling applied after loudness gain, in dBFS.
pub const DEFAULT_PEAK_CEILING_DBFS: f64 = -1.0;
/// Largest boost applied to quiet sources, in dB.
pub const DEFAULT_MAX_GAIN_DB: f64 = 20.0;

/// Loudness normalization parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoudnessOpts {
    /// Target integrated loudness in LUFS.
    pub target_lufs: f64,
    /// Sample peak ceiling in dBFS.
    pub peak_ceiling_dbfs: f64,
    /// Maximum gain applied to quiet material, in dB.
    pub max_gain_db: f64,
}

impl Default for LoudnessOpts {
    fn default() -> Self {
        Self {
            target_lufs: DEFAULT_TARGET_LUFS,
            peak_ceiling_dbfs: DEFAULT_PEAK_CEILING_DBFS,
            max_gain_db: DEFAULT_MAX_GAIN_DB,
        }
    }
}

/// Process-level render options, shared by every job a caller runs.
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Output frame rate.
    pub fps: Fps,
    /// Directory under which per-job temporary directories are created.
    pub temp_root: PathBuf,
    /// Loudness normalization settings; `None` leaves levels untouched.
    pub loudness: Option<LoudnessOpts>,
    /// Fade-out applied to the end of the audio track, in seconds.
    pub audio_tail_fade_secs: f64,
    /// Background color used to flatten any transparent pixels before encoding.
    pub bg_rgba: [u8; 4],
    /// Bundled font directory searched after the requested font.
    pub font_dir: Option<PathBuf>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            temp_root: std::env::temp_dir(),
            loudness: Some(LoudnessOpts::default()),
            audio_tail_fade_secs: 0.5,
            bg_rgba: [0, 0, 0, 255],
            font_dir: Some(PathBuf::from("assets/fonts")),
        }
    }
}

impl RenderOpts {
    /// Defaults with `VERSEREEL_TEMP_DIR` and `VERSEREEL_FPS` applied when set and valid.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Some(dir) = std::env::var_os("VERSEREEL_TEMP_DIR").filter(|v| !v.is_empty()) {
            opts.temp_root = PathBuf::from(dir);
        }
        if let Some(fps) = std::env::var("VERSEREEL_FPS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            opts.fps = Fps { num: fps, den: 1 };
        }
        opts
    }

    /// Return options with a different frame rate.
    pub fn with_fps(mut self, fps: Fps) -> Self {
        self.fps = fps;
        self
    }

    /// Return options with a different temporary root.
    pub fn with_temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_root = dir.into();
        self
    }

    /// Return options with loudness normalization replaced.
    pub fn with_loudness(mut self, loudness: Option<LoudnessOpts>) -> Self {
        self.loudness = loudness;
        self
    }
}
