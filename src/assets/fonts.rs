use std::path::{Path, PathBuf};

use crate::assets::text::TextLayoutEngine;
use crate::foundation::error::{ReelError, ReelResult};

/// Bundled fonts looked up inside the configured font directory, in priority order.
pub const BUNDLED_FONT_FILES: &[&str] = &["Roboto-Bold.ttf", "Roboto-Regular.ttf"];

/// Common system font locations tried after the bundled fonts, in priority order.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/ubuntu/Ubuntu-B.ttf",
    "/usr/share/fonts/truetype/roboto/Roboto-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/LiberationSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:/Windows/Fonts/arial.ttf",
    "C:/Windows/Fonts/calibri.ttf",
];

/// System fonts covering scripts and symbols the Latin fonts above lack, tried last.
pub const COVERAGE_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
    "/usr/share/fonts/truetype/noto/NotoSansArabic-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansDevanagari-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansSymbols2-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
    "/usr/share/fonts/noto/NotoColorEmoji.ttf",
    "/usr/share/fonts/google-noto-emoji/NotoColorEmoji.ttf",
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "/System/Library/Fonts/Apple Color Emoji.ttc",
    "C:/Windows/Fonts/msyhbd.ttc",
    "C:/Windows/Fonts/YuGothB.ttc",
    "C:/Windows/Fonts/seguiemj.ttf",
];

/// Every font that loaded from the fallback chain, in priority order.
#[derive(Clone, Debug)]
pub(crate) struct FontChain {
    /// First font that loaded; it draws every character it covers.
    pub(crate) primary: PathBuf,
    /// Files that loaded, in order.
    pub(crate) loaded: Vec<PathBuf>,
    /// Registered family names, deduplicated, in order.
    pub(crate) families: Vec<String>,
}

/// Fallback chain: requested font, bundled fonts, then other font files in the bundled
/// directory (sorted by name), then well-known system paths, then script and emoji coverage fonts.
pub(crate) fn font_candidates(requested: Option<&Path>, bundled_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(p) = requested {
        out.push(p.to_path_buf());
    }
    if let Some(dir) = bundled_dir {
        for name in BUNDLED_FONT_FILES {
            out.push(dir.join(name));
        }
        let mut extra: Vec<PathBuf> = std::fs::read_dir(dir)
            .into_iter()
            .flatten()
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| {
                        ["ttf", "otf", "ttc"].iter().any(|x| e.eq_ignore_ascii_case(x))
                    })
            })
            .collect();
        extra.sort();
        for p in extra {
            if !out.contains(&p) {
                out.push(p);
            }
        }
    }
    out.extend(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));
    out.extend(COVERAGE_FONT_CANDIDATES.iter().map(PathBuf::from));
    out
}

/// Register every candidate that can be read and parsed.
///
/// Layout tries the families in order per character, so a later font only fills in glyphs the
/// earlier ones lack. Fails when nothing loads.
pub(crate) fn load_font_chain(
    candidates: &[PathBuf],
    engine: &mut TextLayoutEngine,
) -> ReelResult<FontChain> {
    let mut loaded = Vec::new();
    let mut families: Vec<String> = Vec::new();
    for (i, path) in candidates.iter().enumerate() {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                if i == 0 {
                    tracing::debug!(path = %path.display(), error = %e, "font not readable");
                }
                continue;
            }
        };
        match engine.register_font(bytes) {
            Ok(names) => {
                if loaded.is_empty() && i > 0 {
                    tracing::info!(path = %path.display(), "using fallback font");
                }
                for name in names {
                    if !families.contains(&name) {
                        families.push(name);
                    }
                }
                loaded.push(path.clone());
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "font failed to load");
            }
        }
    }
    let Some(primary) = loaded.first().cloned() else {
        return Err(ReelError::render(format!(
            "no usable font found among {} candidates",
            candidates.len()
        )));
    };
    tracing::debug!(fonts = loaded.len(), families = families.len(), "font chain loaded");
    Ok(FontChain {
        primary,
        loaded,
        families,
    })
}
