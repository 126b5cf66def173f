use crate::render::{Canvas, Color};

use super::BASE_COLOR;

const MID_COLOR: Color = Color::rgb(0x11, 0x11, 0x11);

/// Static diagonal gradient with a glow in the upper-right corner
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainGradient;

impl PlainGradient {
    pub fn render(&self, canvas: &mut Canvas, color: Color) {
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);

        canvas.clear(BASE_COLOR);
        canvas.fill_linear_gradient(
            0.0,
            0.0,
            w,
            h,
            &[(0.0, BASE_COLOR), (0.5, MID_COLOR), (1.0, BASE_COLOR)],
        );
        canvas.fill_radial_glow(w * 0.8, h * 0.2, w * 0.5, color.with_alpha(0.3));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FontBook;
    use std::sync::Arc;

    #[test]
    fn test_glow_brightens_upper_right() {
        let mut canvas = Canvas::new(100, 50, Arc::new(FontBook::empty())).unwrap();
        PlainGradient.render(&mut canvas, Color::rgb(255, 0, 0));

        let glow = canvas.pixel(80, 10);
        let corner = canvas.pixel(0, 49);
        assert!(glow.r > corner.r + 40, "glow {:?} corner {:?}", glow, corner);
        assert_eq!(corner.g, corner.b);
    }
}
