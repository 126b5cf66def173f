use std::sync::Arc;

use ab_glyph::{point, Font, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::{
    config::FontFamily,
    error::{RenderError, Result},
};

use super::{color::Color, text::FontBook};

/// Blur halo drawn behind shapes and text while set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub blur: f32,
}

/// Per-draw state; reset between frames so effects never leak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    /// Global alpha multiplier in `[0.0, 1.0]`
    pub alpha: f32,
    pub shadow: Option<Shadow>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            shadow: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub family: FontFamily,
    pub size: f32,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// Horizontal shear applied to synthesized italics
const ITALIC_SHEAR: f32 = 0.2;

/// An RGBA pixel buffer with the drawing primitives the effects need
///
/// Drawing is source-over blending onto an opaque surface. Coordinates are
/// pixels with the origin at the top-left corner.
pub struct Canvas {
    image: RgbaImage,
    fonts: Arc<FontBook>,
    state: DrawState,
}

impl Canvas {
    pub fn new(width: u32, height: u32, fonts: Arc<FontBook>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::ContextUnavailable {
                reason: format!("cannot create a {}x{} canvas", width, height),
            }
            .into());
        }

        Ok(Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            fonts,
            state: DrawState::default(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn fonts(&self) -> &Arc<FontBook> {
        &self.fonts
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let Rgba([r, g, b, a]) = *self.image.get_pixel(x, y);
        Color::rgba(r, g, b, a)
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state.shadow = shadow;
    }

    pub fn reset_state(&mut self) {
        self.state = DrawState::default();
    }

    /// Replace every pixel with `color`, ignoring draw state
    pub fn clear(&mut self, color: Color) {
        let pixel = Rgba([color.r, color.g, color.b, 255]);
        for p in self.image.pixels_mut() {
            *p = pixel;
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        if let Some(shadow) = self.state.shadow {
            self.rect_halo(x, y, width, height, shadow);
        }

        let (x1, y1) = (x + width, y + height);
        let Some((px0, py0, px1, py1)) = self.clip(x, y, x1, y1) else {
            return;
        };

        for py in py0..py1 {
            let cover_y = overlap(py as f32, y, y1);
            for px in px0..px1 {
                let coverage = overlap(px as f32, x, x1) * cover_y;
                self.blend(px, py, color, coverage);
            }
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }

        if let Some(shadow) = self.state.shadow {
            self.circle_halo(cx, cy, radius, shadow);
        }

        let Some((px0, py0, px1, py1)) =
            self.clip(cx - radius - 1.0, cy - radius - 1.0, cx + radius + 1.0, cy + radius + 1.0)
        else {
            return;
        };

        for py in py0..py1 {
            for px in px0..px1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                let coverage = (radius - d + 0.5).clamp(0.0, 1.0);
                self.blend(px, py, color, coverage);
            }
        }
    }

    /// Anti-aliased line segment of the given width
    pub fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, width: f32, color: Color) {
        let half = (width / 2.0).max(0.25);
        let pad = half + 1.0;
        let Some((px0, py0, px1, py1)) = self.clip(
            x0.min(x1) - pad,
            y0.min(y1) - pad,
            x0.max(x1) + pad,
            y0.max(y1) + pad,
        ) else {
            return;
        };

        let (dx, dy) = (x1 - x0, y1 - y0);
        let length_sq = dx * dx + dy * dy;

        for py in py0..py1 {
            for px in px0..px1 {
                let (qx, qy) = (px as f32 + 0.5, py as f32 + 0.5);
                let t = if length_sq > 0.0 {
                    (((qx - x0) * dx + (qy - y0) * dy) / length_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (nx, ny) = (x0 + t * dx - qx, y0 + t * dy - qy);
                let d = (nx * nx + ny * ny).sqrt();
                let coverage = (half - d + 0.5).clamp(0.0, 1.0);
                self.blend(px, py, color, coverage);
            }
        }
    }

    /// Fill the whole canvas with a gradient along `(x0, y0) -> (x1, y1)`
    ///
    /// `stops` are `(offset, color)` pairs sorted by offset in `[0.0, 1.0]`.
    pub fn fill_linear_gradient(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, stops: &[(f32, Color)]) {
        if stops.is_empty() {
            return;
        }

        let (dx, dy) = (x1 - x0, y1 - y0);
        let length_sq = (dx * dx + dy * dy).max(f32::EPSILON);

        for py in 0..self.height() {
            for px in 0..self.width() {
                let (qx, qy) = (px as f32 + 0.5, py as f32 + 0.5);
                let t = ((qx - x0) * dx + (qy - y0) * dy) / length_sq;
                let color = gradient_at(stops, t);
                self.blend(px, py, color, 1.0);
            }
        }
    }

    /// Radial glow: `color` at the center fading to transparent at `radius`
    pub fn fill_radial_glow(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }

        let Some((px0, py0, px1, py1)) = self.clip(cx - radius, cy - radius, cx + radius, cy + radius)
        else {
            return;
        };

        for py in py0..py1 {
            for px in px0..px1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let falloff = 1.0 - (dx * dx + dy * dy).sqrt() / radius;
                if falloff > 0.0 {
                    self.blend(px, py, color, falloff);
                }
            }
        }
    }

    /// Advance width of `text` in pixels
    pub fn measure_text(&self, text: &str, style: &TextStyle) -> Result<f32> {
        if text.is_empty() {
            return Ok(0.0);
        }

        let face = self
            .fonts
            .face(style.family, style.bold, style.italic)
            .ok_or_else(no_font)?;
        let scaled = face.font.as_scaled(PxScale::from(style.size));

        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(previous) = previous {
                width += scaled.kern(previous, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }

        if face.synthetic_bold {
            width += 1.0;
        }

        Ok(width)
    }

    /// Draw `text` with its vertical middle at `y`; returns the advance width
    pub fn fill_text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle, align: TextAlign) -> Result<f32> {
        if text.is_empty() {
            return Ok(0.0);
        }

        let width = self.measure_text(text, style)?;
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
        };

        if let Some(shadow) = self.state.shadow {
            let spread = (shadow.blur / 4.0).max(1.0);
            let halo = shadow.color.with_alpha(shadow.color.alpha_f32() * 0.35);
            for (ox, oy) in [(-1.0, 0.0), (1.0, 0.0), (0.0, -1.0), (0.0, 1.0), (-1.0, -1.0), (1.0, 1.0), (-1.0, 1.0), (1.0, -1.0)] {
                self.draw_glyphs(text, left + ox * spread, y + oy * spread, style, halo)?;
            }
        }

        self.draw_glyphs(text, left, y, style, style.color)?;
        Ok(width)
    }

    fn draw_glyphs(&mut self, text: &str, left: f32, middle: f32, style: &TextStyle, color: Color) -> Result<()> {
        let fonts = Arc::clone(&self.fonts);
        let face = fonts
            .face(style.family, style.bold, style.italic)
            .ok_or_else(no_font)?;
        let scaled = face.font.as_scaled(PxScale::from(style.size));
        let baseline = middle + (scaled.ascent() + scaled.descent()) / 2.0;

        let mut caret = left;
        let mut previous = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, id);
            }

            let glyph = id.with_scale_and_position(scaled.scale(), point(caret, baseline));
            if let Some(outlined) = scaled.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let fy = bounds.min.y + gy as f32;
                    let mut fx = bounds.min.x + gx as f32;
                    if face.synthetic_italic {
                        fx += (baseline - fy) * ITALIC_SHEAR;
                    }
                    self.blend_at(fx, fy, color, coverage);
                    if face.synthetic_bold {
                        self.blend_at(fx + 1.0, fy, color, coverage);
                    }
                });
            }

            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        Ok(())
    }

    fn rect_halo(&mut self, x: f32, y: f32, width: f32, height: f32, shadow: Shadow) {
        let blur = shadow.blur.max(1.0);
        let (x1, y1) = (x + width, y + height);
        let Some((px0, py0, px1, py1)) = self.clip(x - blur, y - blur, x1 + blur, y1 + blur) else {
            return;
        };

        for py in py0..py1 {
            for px in px0..px1 {
                let (qx, qy) = (px as f32 + 0.5, py as f32 + 0.5);
                let dx = (x - qx).max(qx - x1).max(0.0);
                let dy = (y - qy).max(qy - y1).max(0.0);
                let d = (dx * dx + dy * dy).sqrt();
                if d > 0.0 && d < blur {
                    let falloff = 1.0 - d / blur;
                    self.blend(px, py, shadow.color, falloff * falloff);
                }
            }
        }
    }

    fn circle_halo(&mut self, cx: f32, cy: f32, radius: f32, shadow: Shadow) {
        let blur = shadow.blur.max(1.0);
        let outer = radius + blur;
        let Some((px0, py0, px1, py1)) = self.clip(cx - outer, cy - outer, cx + outer, cy + outer) else {
            return;
        };

        for py in py0..py1 {
            for px in px0..px1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt() - radius;
                if d > 0.0 && d < blur {
                    let falloff = 1.0 - d / blur;
                    self.blend(px, py, shadow.color, falloff * falloff);
                }
            }
        }
    }

    /// Pixel rectangle covering `[x0, x1) x [y0, y1)`, clipped to the canvas
    fn clip(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = (self.width() as f32, self.height() as f32);
        let px0 = x0.floor().clamp(0.0, w) as u32;
        let py0 = y0.floor().clamp(0.0, h) as u32;
        let px1 = x1.ceil().clamp(0.0, w) as u32;
        let py1 = y1.ceil().clamp(0.0, h) as u32;

        if px0 >= px1 || py0 >= py1 {
            None
        } else {
            Some((px0, py0, px1, py1))
        }
    }

    fn blend_at(&mut self, x: f32, y: f32, color: Color, coverage: f32) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (px, py) = (x as u32, y as u32);
        if px < self.width() && py < self.height() {
            self.blend(px, py, color, coverage);
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Color, coverage: f32) {
        let a = color.alpha_f32() * coverage.clamp(0.0, 1.0) * self.state.alpha;
        if a <= 0.0 {
            return;
        }

        let dst = self.image.get_pixel_mut(x, y);
        let mix = |d: u8, s: u8| (d as f32 + (s as f32 - d as f32) * a).round() as u8;
        dst.0 = [mix(dst.0[0], color.r), mix(dst.0[1], color.g), mix(dst.0[2], color.b), 255];
    }
}

/// Fraction of the unit pixel cell starting at `p` covered by `[lo, hi)`
fn overlap(p: f32, lo: f32, hi: f32) -> f32 {
    ((p + 1.0).min(hi) - p.max(lo)).clamp(0.0, 1.0)
}

fn gradient_at(stops: &[(f32, Color)], t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mut previous = stops[0];
    if t <= previous.0 {
        return previous.1;
    }

    for &stop in &stops[1..] {
        if t <= stop.0 {
            let span = (stop.0 - previous.0).max(f32::EPSILON);
            return previous.1.lerp(stop.1, (t - previous.0) / span);
        }
        previous = stop;
    }

    previous.1
}

fn no_font() -> crate::error::TyperError {
    RenderError::ContextUnavailable {
        reason: "no font loaded for text rendering".to_string(),
    }
    .into()
}
