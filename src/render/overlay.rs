use std::path::{Path, PathBuf};

use crate::assets::fonts::{FontChain, font_candidates, load_font_chain};
use crate::assets::text::{TextBrushRgba8, TextLayoutEngine, missing_glyphs};
use crate::config::style::StyleConfig;
use crate::foundation::core::{Affine, Canvas, Vec2};
use crate::foundation::error::{ReelError, ReelResult};

/// Fraction of the canvas height kept clear above top-aligned and below bottom-aligned text.
const VERTICAL_MARGIN_FRAC: f64 = 0.08;
/// Directions the outline is stamped in, as unit vectors.
const OUTLINE_DIRECTIONS: usize = 16;

/// Premultiplied RGBA8 raster of one text block and its placement on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TextOverlay {
    /// Left edge on the canvas; may be negative.
    pub(crate) x: i32,
    /// Top edge on the canvas; may be negative.
    pub(crate) y: i32,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: Vec<u8>,
}

/// Outline thickness in pixels for `font_size`: at least 3, growing with the size.
pub(crate) fn outline_width_px(font_size: u32) -> u32 {
    (font_size / 20).max(3)
}

/// Lays out and rasterizes text blocks with a font fallback chain.
pub(crate) struct OverlayRenderer {
    engine: TextLayoutEngine,
    fonts: FontChain,
}

impl OverlayRenderer {
    /// Load the font fallback chain for `style`.
    pub(crate) fn new(style: &StyleConfig, font_dir: Option<&Path>) -> ReelResult<Self> {
        let candidates = font_candidates(style.font_path.as_deref(), font_dir);
        let renderer = Self::with_candidates(&candidates)?;
        if let Some(requested) = style.font_path.as_deref()
            && requested != renderer.fonts.primary
        {
            tracing::warn!(
                requested = %requested.display(),
                used = %renderer.fonts.primary.display(),
                "requested font unavailable; using fallback"
            );
        }
        Ok(renderer)
    }

    /// Use exactly `candidates`, in order, as the fallback chain.
    pub(crate) fn with_candidates(candidates: &[PathBuf]) -> ReelResult<Self> {
        let mut engine = TextLayoutEngine::new();
        let fonts = load_font_chain(candidates, &mut engine)?;
        Ok(Self { engine, fonts })
    }

    /// Path of the primary font.
    pub(crate) fn font_path(&self) -> &Path {
        &self.fonts.primary
    }

    /// Number of font files in the fallback chain.
    pub(crate) fn font_count(&self) -> usize {
        self.fonts.loaded.len()
    }

    /// Rasterize `text` (already split into lines with `\n`) the way `style` places it.
    ///
    /// Fails when a character has no glyph in any font of the chain.
    pub(crate) fn render(&mut self, text: &str, style: &StyleConfig) -> ReelResult<TextOverlay> {
        let canvas = style.canvas;
        let box_w = (f64::from(canvas.width) * style.text_width_frac).max(1.0);
        let layout = self.engine.layout_plain(
            text,
            &self.fonts.families,
            style.font_size as f32,
            TextBrushRgba8::opaque(style.text_color.to_rgba()),
            Some(box_w as f32),
        )?;
        let missing = missing_glyphs(&layout, text);
        if !missing.is_empty() {
            return Err(ReelError::render(format!(
                "no font in the fallback chain has glyphs for {:?} (tried {} font files)",
                missing.iter().collect::<String>(),
                self.fonts.loaded.len()
            )));
        }

        let block_w = f64::from(layout.width());
        let block_h = f64::from(layout.height());
        let outline = if style.outline {
            outline_width_px(style.font_size)
        } else {
            0
        };
        let pad = f64::from(outline + 2);

        let width = raster_extent(block_w + 2.0 * pad)?;
        let height = raster_extent(block_h + 2.0 * pad)?;

        let origin = block_origin(canvas, style, box_w, block_w, block_h);

        let mut ctx = vello_cpu::RenderContext::new(width, height);
        ctx.reset();

        let mut offsets: Vec<(Vec2, Option<[u8; 4]>)> = Vec::new();
        if outline > 0 {
            let r = f64::from(outline);
            for k in 0..OUTLINE_DIRECTIONS {
                let a = (k as f64) * std::f64::consts::TAU / OUTLINE_DIRECTIONS as f64;
                offsets.push((Vec2::new(r * a.cos(), r * a.sin()), Some([0, 0, 0, 255])));
                offsets.push((Vec2::new(0.5 * r * a.cos(), 0.5 * r * a.sin()), Some([0, 0, 0, 255])));
            }
        }
        offsets.push((Vec2::ZERO, None));

        for (delta, color_override) in offsets {
            for line in layout.lines() {
                let line_shift = (block_w - f64::from(line.metrics().advance)) * style.h_align.factor();
                let tr = Affine::translate(Vec2::new(pad + line_shift, pad) + delta);
                ctx.set_transform(affine_to_cpu(tr));
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let [r, g, b, a] = color_override.unwrap_or_else(|| {
                        let brush = run.style().brush;
                        [brush.r, brush.g, brush.b, brush.a]
                    });
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(run.run().font())
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(TextOverlay {
            x: (origin.x - pad).round() as i32,
            y: (origin.y - pad).round() as i32,
            width: u32::from(width),
            height: u32::from(height),
            data: pixmap.data_as_u8_slice().to_vec(),
        })
    }
}

/// Top-left corner of the text block on the canvas.
fn block_origin(canvas: Canvas, style: &StyleConfig, box_w: f64, block_w: f64, block_h: f64) -> Vec2 {
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let box_x = (cw - box_w) / 2.0;
    let x = box_x + (box_w - block_w).max(0.0) * style.h_align.factor();

    let margin = ch * VERTICAL_MARGIN_FRAC;
    let free = (ch - 2.0 * margin - block_h).max(0.0);
    let y = if block_h > ch - 2.0 * margin {
        // Taller than the safe area: center on the canvas and let it clip.
        (ch - block_h) / 2.0
    } else {
        margin + free * style.v_align.factor()
    };
    Vec2::new(x, y)
}

fn raster_extent(px: f64) -> ReelResult<u16> {
    let px = px.ceil().max(1.0);
    if px > f64::from(u16::MAX) {
        return Err(ReelError::render(format!(
            "text block of {px}px exceeds the rasterizer limit"
        )));
    }
    Ok(px as u16)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}
