//! Raster drawing: colors, fonts, the canvas primitives and the frame compositor

pub mod canvas;
pub mod color;
pub mod compositor;
pub mod text;

pub use canvas::{Canvas, DrawState, Shadow, TextAlign, TextStyle};
pub use color::{preset, Color, COLOR_PRESETS};
pub use compositor::FrameCompositor;
pub use text::FontBook;
