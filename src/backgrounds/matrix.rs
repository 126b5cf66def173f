use rand::{rngs::SmallRng, Rng};
use tracing::debug;

use crate::{
    config::FontFamily,
    render::{Canvas, Color, Shadow, TextAlign, TextStyle},
};

/// Column width and glyph height in pixels
pub const CHAR_SIZE: f32 = 12.0;

const GLYPHS: &str = "アイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワヲン01";

const MATRIX_BASE: Color = Color::rgb(0x05, 0x05, 0x05);

const SHIMMER_CHANCE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub x: f32,
    /// Position of the head glyph
    pub y: f32,
    pub speed: f32,
    /// Trail length in glyphs
    pub length: usize,
    pub opacity: f32,
    /// Indices into the glyph table
    glyphs: Vec<usize>,
}

impl Column {
    fn reroll(&mut self, rng: &mut SmallRng) {
        self.speed = rng.gen_range(2.0..5.0);
        self.length = rng.gen_range(8..23);
        self.opacity = rng.gen_range(0.5..1.0);
    }
}

/// Falling columns of glyphs with fading trails
pub struct MatrixRain {
    columns: Vec<Column>,
    table: Vec<char>,
}

impl MatrixRain {
    pub fn new(width: f32, height: f32, rng: &mut SmallRng) -> Self {
        let table: Vec<char> = GLYPHS.chars().collect();
        let count = (width / CHAR_SIZE).floor() as usize;
        let glyphs_per_column = (height / CHAR_SIZE).floor() as usize + 10;

        let columns = (0..count)
            .map(|i| {
                let mut column = Column {
                    x: i as f32 * CHAR_SIZE + CHAR_SIZE / 2.0,
                    y: rng.gen::<f32>() * height * 2.0 - height,
                    speed: 0.0,
                    length: 0,
                    opacity: 0.0,
                    glyphs: (0..glyphs_per_column)
                        .map(|_| rng.gen_range(0..table.len()))
                        .collect(),
                };
                column.reroll(rng);
                column
            })
            .collect();

        Self { columns, table }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn step(&mut self, height: f32, rng: &mut SmallRng) {
        for column in &mut self.columns {
            column.y += column.speed;

            if column.y - column.length as f32 * CHAR_SIZE > height {
                column.reroll(rng);
                column.y = -(column.length as f32) * CHAR_SIZE;
            }

            if rng.gen_bool(SHIMMER_CHANCE) && !column.glyphs.is_empty() {
                let slot = rng.gen_range(0..column.glyphs.len());
                column.glyphs[slot] = rng.gen_range(0..self.table.len());
            }
        }
    }

    pub fn render(&self, canvas: &mut Canvas, color: Color) {
        canvas.clear(MATRIX_BASE);
        let height = canvas.height() as f32;
        let has_font = !canvas.fonts().is_empty();

        for column in &self.columns {
            for i in 0..column.length {
                let y = column.y - i as f32 * CHAR_SIZE;
                if y < -CHAR_SIZE || y > height + CHAR_SIZE {
                    continue;
                }

                let fade = 1.0 - i as f32 / column.length as f32;
                let (fill, shadow) = match i {
                    0 => (Color::WHITE, Some(8.0)),
                    1 => (color, Some(4.0)),
                    _ => (color.with_alpha(fade * column.opacity), None),
                };
                canvas.set_shadow(shadow.map(|blur| Shadow { color, blur }));

                let index = column.glyphs[i % column.glyphs.len()];
                if has_font {
                    let glyph = self.glyph(canvas, index);
                    let style = TextStyle {
                        family: FontFamily::Mono,
                        size: CHAR_SIZE,
                        color: fill,
                        bold: true,
                        italic: false,
                    };
                    let mut buf = [0u8; 4];
                    if let Err(e) = canvas.fill_text(glyph.encode_utf8(&mut buf), column.x, y, &style, TextAlign::Center) {
                        debug!("Matrix glyph {:?} not drawn: {}", glyph, e);
                    }
                } else {
                    canvas.fill_rect(column.x - 3.0, y - 4.0, 6.0, 8.0, fill);
                }
            }
        }

        canvas.set_shadow(None);
    }

    /// Glyph for a table slot, or an ASCII digit when the font lacks it
    fn glyph(&self, canvas: &Canvas, index: usize) -> char {
        let ch = self.table[index];
        if canvas.fonts().has_glyph(FontFamily::Mono, ch) {
            ch
        } else {
            char::from(b'0' + (index % 10) as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::text::tests::host_fonts;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[test]
    fn test_one_column_per_char_width() {
        let mut rng = SmallRng::seed_from_u64(1);
        let rain = MatrixRain::new(600.0, 200.0, &mut rng);
        assert_eq!(rain.columns().len(), 50);
        assert_eq!(rain.columns()[0].x, 6.0);
        assert_eq!(rain.columns()[1].x, 18.0);
    }

    #[test]
    fn test_columns_recycle_to_top() {
        let mut rng = SmallRng::seed_from_u64(2);
        let height = 60.0;
        let mut rain = MatrixRain::new(48.0, height, &mut rng);

        for _ in 0..1000 {
            rain.step(height, &mut rng);
            for column in rain.columns() {
                assert!((2.0..5.0).contains(&column.speed));
                assert!((8..=22).contains(&column.length));
                assert!((0.5..1.0).contains(&column.opacity));
                // A column is recycled as soon as its whole trail has left
                assert!(column.y - column.length as f32 * CHAR_SIZE <= height);
            }
        }
    }

    #[test]
    fn test_missing_glyphs_fall_back_to_digits() {
        let Some(fonts) = host_fonts() else {
            return;
        };
        let mut rng = SmallRng::seed_from_u64(8);
        let mut rain = MatrixRain::new(48.0, 60.0, &mut rng);
        let mut canvas = Canvas::new(48, 60, Arc::clone(&fonts)).unwrap();

        for (index, &ch) in rain.table.iter().enumerate() {
            let expected = if fonts.has_glyph(FontFamily::Mono, ch) {
                ch
            } else {
                char::from(b'0' + (index % 10) as u8)
            };
            assert_eq!(rain.glyph(&canvas, index), expected);
        }

        // The table ends with "01", which every text face carries
        let last = rain.table.len() - 1;
        assert_eq!(rain.glyph(&canvas, last), '1');
        assert_eq!(rain.glyph(&canvas, last - 1), '0');

        // DejaVu Sans Mono has no katakana
        if !fonts.has_glyph(FontFamily::Mono, 'ア') {
            assert_eq!(rain.glyph(&canvas, 0), '0');
            assert_eq!(rain.glyph(&canvas, 13), '3');
        }

        for column in &mut rain.columns {
            column.y = 30.0;
        }
        rain.render(&mut canvas, Color::rgb(0x9b, 0x5d, 0xe5));
        let lit = (0..60)
            .flat_map(|y| (0..48).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y) != MATRIX_BASE)
            .count();
        assert!(lit > 0);
    }

    #[test]
    fn test_narrow_canvas_has_no_columns() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut rain = MatrixRain::new(5.0, 20.0, &mut rng);
        assert!(rain.columns().is_empty());
        rain.step(20.0, &mut rng);
    }
}
