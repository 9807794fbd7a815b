use std::borrow::Cow;

use crate::foundation::error::{ReelError, ReelResult};

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl TextBrushRgba8 {
    pub(crate) fn opaque([r, g, b, _]: [u8; 4]) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
///
/// System fonts are never consulted; glyphs come only from registered fonts. Each laid-out run
/// carries the font it was shaped with, so the rasterizer draws it with the same data.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Register raw font bytes (a single font or a collection) and return the family names they
    /// add.
    pub(crate) fn register_font(&mut self, bytes: Vec<u8>) -> ReelResult<Vec<String>> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes), None);
        let names: Vec<String> = families
            .iter()
            .filter_map(|(id, _)| {
                self.font_ctx
                    .collection
                    .family_name(*id)
                    .map(str::to_string)
            })
            .collect();
        if names.is_empty() {
            return Err(ReelError::render("no font families registered from font bytes"));
        }
        Ok(names)
    }

    /// Shape and lay out plain text, breaking lines at `max_width_px`.
    ///
    /// `families` is tried in order for every character, so later families only supply glyphs the
    /// earlier ones lack. Lines are start-aligned; callers position each line themselves.
    pub(crate) fn layout_plain(
        &mut self,
        text: &str,
        families: &[String],
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
    ) -> ReelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::invalid_style(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        let stack: Vec<parley::style::FontFamily<'_>> = families
            .iter()
            .map(|f| parley::style::FontFamily::Named(Cow::Borrowed(f.as_str())))
            .collect();
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::List(Cow::Owned(stack)),
        ));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::BOLD,
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        layout.align(
            max_width_px,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }
}

/// Characters of `text` that were shaped to the missing glyph (id 0) in `layout`.
///
/// Line breaks, spaces and control characters are ignored.
pub(crate) fn missing_glyphs(layout: &parley::Layout<TextBrushRgba8>, text: &str) -> Vec<char> {
    let mut missing = Vec::new();
    for line in layout.lines() {
        for run in line.runs() {
            for cluster in run.clusters() {
                if cluster.is_hard_line_break() || cluster.is_space_or_nbsp() {
                    continue;
                }
                let chars = text.get(cluster.text_range()).unwrap_or_default();
                if chars.chars().all(|c| c.is_whitespace() || c.is_control()) {
                    continue;
                }
                if cluster.glyphs().any(|g| g.id == 0) {
                    for c in chars.chars() {
                        if !missing.contains(&c) {
                            missing.push(c);
                        }
                    }
                }
            }
        }
    }
    missing
}
