use std::path::Path;

use crate::config::style::StyleConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::composite::over_in_place;
use crate::render::frame::FrameRGBA;
use crate::render::overlay::OverlayRenderer;
use crate::timing::segment::normalize_lines;

/// Draw the whole poem on a black canvas, one poem line per text line.
///
/// Alignment, color, outline and wrapping follow `style`, so the preview shows the same text
/// treatment as the rendered video.
pub fn render_text_preview(text: &str, style: &StyleConfig, font_dir: Option<&Path>) -> ReelResult<FrameRGBA> {
    style.validate()?;
    let lines = normalize_lines(text);
    if lines.is_empty() {
        return Err(ReelError::empty_text("poem has no non-blank lines to preview"));
    }
    let mut renderer = OverlayRenderer::new(style, font_dir)?;
    let overlay = renderer.render(&lines.join("\n"), style)?;
    let mut frame = FrameRGBA::solid(style.canvas.width, style.canvas.height, [0, 0, 0, 255]);
    over_in_place(&mut frame, &overlay);
    Ok(frame)
}

/// Render a preview and save it as PNG.
pub fn write_text_preview_png(
    text: &str,
    style: &StyleConfig,
    font_dir: Option<&Path>,
    out_path: &Path,
) -> ReelResult<()> {
    let frame = render_text_preview(text, style, font_dir)?;
    crate::encode::ffmpeg::ensure_parent_dir(out_path)?;
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data)
        .ok_or_else(|| ReelError::render("preview buffer does not match its dimensions"))?;
    img.save_with_format(out_path, image::ImageFormat::Png)
        .map_err(|e| ReelError::render(format!("failed to write preview '{}': {e}", out_path.display())))?;
    tracing::info!(path = %out_path.display(), "text preview written");
    Ok(())
}
