use image::RgbaImage;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{ExportError, Result};

/// A rendered frame queued for encoding
#[derive(Debug, Clone)]
pub struct EncodeFrame {
    pub image: RgbaImage,
    pub delay_ms: u32,
}

/// Global encoder parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    /// Quantization speed, 1 (best palette) to 30 (fastest)
    pub quality: u32,
}

/// Turns an ordered frame sequence into one animated image
///
/// Runs on a blocking thread; `progress` receives the encoder's own completion
/// in `[0, 1]`.
pub trait FrameEncoder: Send + Sync {
    fn encode(
        &self,
        frames: Vec<EncodeFrame>,
        settings: &EncoderSettings,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<u8>>;
}

/// Looping GIF encoder on top of the `gif` crate
///
/// Palette quantization runs in parallel batches; frames are written in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GifEncoder;

impl GifEncoder {
    pub fn new() -> Self {
        Self
    }
}

/// Milliseconds to GIF centiseconds, rounded
pub fn delay_centiseconds(delay_ms: u32) -> u16 {
    ((delay_ms + 5) / 10).min(u16::MAX as u32) as u16
}

fn encoding_error<E: std::fmt::Display>(e: E) -> crate::error::TyperError {
    ExportError::Encoding {
        reason: e.to_string(),
    }
    .into()
}

impl FrameEncoder for GifEncoder {
    fn encode(
        &self,
        frames: Vec<EncodeFrame>,
        settings: &EncoderSettings,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<u8>> {
        if frames.is_empty() {
            return Err(ExportError::NoFrames.into());
        }

        let width = u16::try_from(settings.width).map_err(encoding_error)?;
        let height = u16::try_from(settings.height).map_err(encoding_error)?;

        if let Some(frame) = frames
            .iter()
            .find(|f| f.image.dimensions() != (settings.width, settings.height))
        {
            return Err(ExportError::Encoding {
                reason: format!(
                    "frame is {}x{}, expected {}x{}",
                    frame.image.width(),
                    frame.image.height(),
                    settings.width,
                    settings.height
                ),
            }
            .into());
        }

        let speed = settings.quality.clamp(1, 30) as i32;
        let total = frames.len();
        let batch = rayon::current_num_threads().max(1) * 2;

        debug!("Encoding {} frames at {}x{} (speed {})", total, width, height, speed);

        let mut buffer = Vec::new();
        {
            let mut encoder = gif::Encoder::new(&mut buffer, width, height, &[]).map_err(encoding_error)?;
            encoder.set_repeat(gif::Repeat::Infinite).map_err(encoding_error)?;

            let mut written = 0usize;
            let mut pending = frames.into_iter();
            loop {
                let chunk: Vec<EncodeFrame> = pending.by_ref().take(batch).collect();
                if chunk.is_empty() {
                    break;
                }

                let quantized: Vec<gif::Frame<'static>> = chunk
                    .into_par_iter()
                    .map(|frame| {
                        let mut pixels = frame.image.into_raw();
                        let mut out = gif::Frame::from_rgba_speed(width, height, &mut pixels, speed);
                        out.delay = delay_centiseconds(frame.delay_ms);
                        out
                    })
                    .collect();

                for frame in &quantized {
                    encoder.write_frame(frame).map_err(encoding_error)?;
                }

                written += quantized.len();
                progress(written as f32 / total as f32);
            }
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, value: u8, delay_ms: u32) -> EncodeFrame {
        EncodeFrame {
            image: RgbaImage::from_pixel(width, height, Rgba([value, 0, 255 - value, 255])),
            delay_ms,
        }
    }

    fn settings(width: u32, height: u32) -> EncoderSettings {
        EncoderSettings {
            width,
            height,
            quality: 10,
        }
    }

    #[test]
    fn test_encodes_looping_gif() {
        let frames = vec![solid(16, 8, 0, 83), solid(16, 8, 128, 83), solid(16, 8, 255, 83)];
        let mut reports = Vec::new();
        let bytes = GifEncoder::new()
            .encode(frames, &settings(16, 8), &mut |p| reports.push(p))
            .unwrap();

        assert_eq!(&bytes[..6], b"GIF89a");
        assert_eq!(*bytes.last().unwrap(), 0x3b);
        assert_eq!(reports.last().copied(), Some(1.0));
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(bytes.as_slice()).unwrap();
        assert_eq!((decoder.width(), decoder.height()), (16, 8));

        let mut count = 0;
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            assert_eq!(frame.delay, 8);
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_rejects_empty_and_mismatched_input() {
        let encoder = GifEncoder::new();
        assert!(encoder.encode(vec![], &settings(4, 4), &mut |_| {}).is_err());
        assert!(encoder
            .encode(vec![solid(4, 4, 0, 10)], &settings(8, 8), &mut |_| {})
            .is_err());
        assert!(encoder
            .encode(vec![solid(4, 4, 0, 10)], &settings(70_000, 4), &mut |_| {})
            .is_err());
    }

    #[test]
    fn test_delay_rounding() {
        assert_eq!(delay_centiseconds(83), 8);
        assert_eq!(delay_centiseconds(85), 9);
        assert_eq!(delay_centiseconds(167), 17);
        assert_eq!(delay_centiseconds(0), 0);
    }
}
