//! Programming-task cards: 600x400 PNGs with a wrapped title, a syntax-highlighted code
//! panel or an illustration, a footer and a small corner overlay.
//! Used by the batch binary and the preview binary.

pub mod batch;
pub mod code_panel;
pub mod compose;
pub mod config;
pub mod error;
pub mod highlight;
pub mod image;
pub mod image_panel;
pub mod overlay;
pub mod placement;
pub mod raster;
pub mod surface;
pub mod text_block;
pub mod theme;
pub mod token;
pub mod watcher;
pub mod wrap;
