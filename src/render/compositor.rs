use std::sync::Arc;

use image::RgbaImage;
use tracing::debug;

use crate::{
    animation::FrameState,
    backgrounds::{BackgroundState, BASE_COLOR},
    config::{Config, FontConfig},
    error::Result,
};

use super::{
    canvas::{Canvas, Shadow, TextAlign, TextStyle},
    color::Color,
    text::FontBook,
};

/// Left inset of the typed text
pub const TEXT_PADDING: f32 = 40.0;

/// Gap between the end of the text and the cursor bar
pub const CURSOR_GAP: f32 = 4.0;

pub const CURSOR_WIDTH: f32 = 2.0;

const TEXT_GLOW_BLUR: f32 = 8.0;
const CURSOR_GLOW_BLUR: f32 = 4.0;

/// Dims the background so the text stays readable
const OVERLAY: Color = Color::rgba(0, 0, 0, 77);

/// Turns a [`FrameState`] and a background into pixels
///
/// Owns a single frame buffer that every `compose` call overwrites.
pub struct FrameCompositor {
    canvas: Canvas,
    font: FontConfig,
    accent: Color,
}

impl FrameCompositor {
    pub fn new(width: u32, height: u32, fonts: Arc<FontBook>, font: FontConfig, accent: Color) -> Result<Self> {
        Ok(Self {
            canvas: Canvas::new(width, height, fonts)?,
            font,
            accent,
        })
    }

    pub fn from_config(config: &Config, fonts: Arc<FontBook>) -> Result<Self> {
        Self::new(
            config.background.width,
            config.background.height,
            fonts,
            config.font.clone(),
            config.background.color,
        )
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    fn text_style(&self) -> TextStyle {
        TextStyle {
            family: self.font.family,
            size: self.font.size as f32,
            color: self.font.color,
            bold: self.font.bold,
            italic: self.font.italic,
        }
    }

    /// Paint one complete frame and return the buffer
    pub fn compose(&mut self, state: &FrameState, background: Option<&BackgroundState>) -> Result<&RgbaImage> {
        self.canvas.reset_state();

        match background {
            Some(background) => background.render(&mut self.canvas, self.accent),
            None => self.canvas.clear(BASE_COLOR),
        }

        let (width, height) = (self.canvas.width() as f32, self.canvas.height() as f32);
        self.canvas.fill_rect(0.0, 0.0, width, height, OVERLAY);

        let style = self.text_style();
        let middle = height / 2.0;

        self.canvas.set_shadow(Some(Shadow {
            color: self.accent,
            blur: TEXT_GLOW_BLUR,
        }));
        let text_width = self
            .canvas
            .fill_text(&state.text, TEXT_PADDING, middle, &style, TextAlign::Left)?;
        self.canvas.set_shadow(None);

        if state.cursor_visible {
            self.canvas.set_shadow(Some(Shadow {
                color: self.accent,
                blur: CURSOR_GLOW_BLUR,
            }));
            self.canvas.fill_rect(
                TEXT_PADDING + text_width + CURSOR_GAP,
                middle - style.size / 2.0,
                CURSOR_WIDTH,
                style.size,
                self.accent,
            );
        }

        self.canvas.reset_state();
        debug!("Composed frame: {:?} (cursor {})", state.text, state.cursor_visible);

        Ok(self.canvas.image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backgrounds::BackgroundKind;
    use crate::render::text::tests::host_fonts;

    fn state(text: &str, cursor_visible: bool) -> FrameState {
        FrameState {
            text: text.to_string(),
            cursor_visible,
            background_tick: 0,
        }
    }

    fn compositor(fonts: Arc<FontBook>) -> FrameCompositor {
        FrameCompositor::new(200, 60, fonts, FontConfig::default(), Color::rgb(0, 255, 0)).unwrap()
    }

    #[test]
    fn test_fallback_background_with_overlay() {
        let mut compositor = compositor(Arc::new(FontBook::empty()));
        let image = compositor.compose(&state("", false), None).unwrap();

        // #0a0a0a darkened by the 30% overlay
        let px = image.get_pixel(0, 0).0;
        assert_eq!(px[0], px[1]);
        assert!(px[0] < 0x0a && px[0] > 0);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_cursor_sits_after_empty_text() {
        let mut compositor = compositor(Arc::new(FontBook::empty()));
        let image = compositor.compose(&state("", true), None).unwrap();

        let cursor = image.get_pixel(44, 30).0;
        assert_eq!(cursor, [0, 255, 0, 255]);
        let left_of_text = image.get_pixel(5, 30).0;
        assert!(left_of_text[1] < 20);

        let hidden = compositor.compose(&state("", false), None).unwrap();
        assert!(hidden.get_pixel(44, 30).0[1] < 20);
    }

    #[test]
    fn test_text_without_fonts_is_a_render_error() {
        let mut compositor = compositor(Arc::new(FontBook::empty()));
        assert!(compositor.compose(&state("hello", true), None).is_err());
        // The next frame still renders cleanly
        assert!(compositor.compose(&state("", false), None).is_ok());
        assert_eq!(compositor.canvas().state().shadow, None);
    }

    #[test]
    fn test_composes_text_over_background() {
        let Some(fonts) = host_fonts() else {
            return;
        };
        let mut compositor = compositor(fonts);
        let mut background = BackgroundState::new(BackgroundKind::Plain, 200, 60, Some(1));
        background.step(200, 60);

        let blank = compositor.compose(&state("", false), Some(&background)).unwrap().clone();
        let typed = compositor.compose(&state("Hey", true), Some(&background)).unwrap();
        assert_ne!(&blank, typed);

        // Nothing is drawn left of the padding except glow
        assert!(typed.get_pixel(2, 30).0[0] < 60);
    }
}
