//! Caller-supplied configuration: text style, colors and render options.

pub(crate) mod color;
pub(crate) mod opts;
pub(crate) mod style;
