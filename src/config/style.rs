use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::color::Rgb8;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};

/// Default output duration in seconds.
pub const DEFAULT_DURATION_SECS: f64 = 15.0;
/// Default font size in pixels.
pub const DEFAULT_FONT_SIZE_PX: u32 = 80;

/// Horizontal placement of the text block and of each line within it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    /// Flush to the left margin.
    Left,
    /// Centered.
    #[default]
    Center,
    /// Flush to the right margin.
    Right,
}

impl HAlign {
    pub(crate) fn factor(self) -> f64 {
        match self {
            Self::Left => 0.0,
            Self::Center => 0.5,
            Self::Right => 1.0,
        }
    }
}

/// Vertical placement of the text block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VAlign {
    /// Near the top margin.
    Top,
    /// Centered.
    #[default]
    Center,
    /// Near the bottom margin.
    Bottom,
}

impl VAlign {
    pub(crate) fn factor(self) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => 0.5,
            Self::Bottom => 1.0,
        }
    }
}

/// Text and output-frame style for one render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Font size in pixels.
    pub font_size: u32,
    /// Text fill color.
    pub text_color: Rgb8,
    /// Horizontal alignment.
    pub h_align: HAlign,
    /// Vertical alignment.
    pub v_align: VAlign,
    /// Output duration in seconds.
    pub duration_secs: f64,
    /// Output frame size. Both dimensions must be even.
    pub canvas: Canvas,
    /// Preferred font file; the fallback chain is used when it cannot be loaded.
    pub font_path: Option<PathBuf>,
    /// Draw a dark outline around glyphs.
    pub outline: bool,
    /// Width of the text box as a fraction of the frame width.
    pub text_width_frac: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE_PX,
            text_color: Rgb8::WHITE,
            h_align: HAlign::Center,
            v_align: VAlign::Center,
            duration_secs: DEFAULT_DURATION_SECS,
            canvas: Canvas::STORY,
            font_path: None,
            outline: true,
            text_width_frac: 0.9,
        }
    }
}

impl StyleConfig {
    /// Load a style from a JSON file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::invalid_style(format!("open style JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Parse a style from a JSON reader.
    pub fn from_reader(r: impl Read) -> ReelResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| ReelError::invalid_style(format!("parse style JSON: {e}")))
    }

    /// Return a copy with a different output duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Return a copy with a different font size.
    pub fn with_font_size(mut self, px: u32) -> Self {
        self.font_size = px;
        self
    }

    /// Return a copy with a different canvas.
    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    /// Check the target duration alone.
    pub fn validate_duration(&self) -> ReelResult<()> {
        validate_target_duration(self.duration_secs)
    }

    /// Full validation. The duration is checked first so that a bad duration is always
    /// reported as [`ReelError::InvalidDuration`].
    pub fn validate(&self) -> ReelResult<()> {
        self.validate_duration()?;
        if self.font_size == 0 {
            return Err(ReelError::invalid_style("font_size must be > 0"));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ReelError::invalid_style("canvas width/height must be non-zero"));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            return Err(ReelError::invalid_style(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if u16::try_from(self.canvas.width).is_err() || u16::try_from(self.canvas.height).is_err() {
            return Err(ReelError::invalid_style("canvas width/height must fit in u16"));
        }
        if !(self.text_width_frac.is_finite()
            && self.text_width_frac > 0.0
            && self.text_width_frac <= 1.0)
        {
            return Err(ReelError::invalid_style("text_width_frac must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Reject non-positive and non-finite target durations.
pub(crate) fn validate_target_duration(secs: f64) -> ReelResult<()> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ReelError::invalid_duration(format!(
            "target duration must be a positive finite number of seconds, got {secs}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/config/style.rs"]
mod tests;
