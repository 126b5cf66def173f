//! GIF export pipeline
//!
//! [`ExportDriver`] renders every frame sequentially, hands them to a
//! [`FrameEncoder`] and optionally passes the result through a
//! [`GifCompressor`]. Progress is reported on one monotonic 0-100 scale:
//! rendering 0-35, encoding 35-60, compressing from 60, complete at 100.

pub mod compressor;
pub mod driver;
pub mod encoder;
pub mod progress;

pub use compressor::{GifCompressor, Gifsicle};
pub use driver::{ExportDriver, ExportPlan, GifResult};
pub use encoder::{EncodeFrame, EncoderSettings, FrameEncoder, GifEncoder};
pub use progress::{format_file_size, ExportPhase, ExportProgress, ProgressTracker};
