use rand::{rngs::SmallRng, Rng};

use crate::render::{Canvas, Color};

use super::BASE_COLOR;

pub const PARTICLE_COUNT: usize = 50;

/// Particles closer than this are joined by a line
pub const LINK_DISTANCE: f32 = 80.0;

const LINK_ALPHA: f32 = 0x20 as f32 / 255.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub opacity: f32,
}

/// Drifting points that wrap around the canvas edges
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new(width: f32, height: f32, rng: &mut SmallRng) -> Self {
        let particles = (0..PARTICLE_COUNT)
            .map(|_| Particle {
                x: rng.gen::<f32>() * width,
                y: rng.gen::<f32>() * height,
                vx: rng.gen_range(-0.25..0.25),
                vy: rng.gen_range(-0.25..0.25),
                size: rng.gen_range(1.0..3.0),
                opacity: rng.gen_range(0.2..0.7),
            })
            .collect();

        Self { particles }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn step(&mut self, width: f32, height: f32) {
        for p in &mut self.particles {
            p.x = wrap(p.x + p.vx, width);
            p.y = wrap(p.y + p.vy, height);
        }
    }

    pub fn render(&self, canvas: &mut Canvas, color: Color) {
        canvas.clear(BASE_COLOR);

        for p in &self.particles {
            canvas.fill_circle(p.x, p.y, p.size * 2.0, color.with_alpha(p.opacity * 50.0 / 255.0));
            canvas.fill_circle(p.x, p.y, p.size, color.with_alpha(p.opacity));
        }

        let link = color.with_alpha(LINK_ALPHA);
        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let (dx, dy) = (a.x - b.x, a.y - b.y);
                if (dx * dx + dy * dy).sqrt() < LINK_DISTANCE {
                    canvas.stroke_line(a.x, a.y, b.x, b.y, 0.5, link);
                }
            }
        }
    }
}

/// Wrap `value` into `[0, bound)`
fn wrap(value: f32, bound: f32) -> f32 {
    if bound <= 0.0 {
        return 0.0;
    }
    let wrapped = value.rem_euclid(bound);
    // rem_euclid can round up to `bound` for tiny negative inputs
    if wrapped >= bound {
        0.0
    } else {
        wrapped
    }
}
