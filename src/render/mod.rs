//! Frame production: background decode, text overlay rasterization and compositing.

pub(crate) mod composite;
pub(crate) mod compositor;
pub(crate) mod decoder;
pub(crate) mod frame;
pub(crate) mod overlay;
pub(crate) mod preview;
