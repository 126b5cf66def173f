//! Generative background effects
//!
//! Every effect is a variant of [`Effect`] owned by a single
//! [`BackgroundState`]. The caller decides the cadence: each `step` is one
//! tick, whatever wall-clock time separates two calls.

pub mod life;
pub mod matrix;
pub mod particle;
pub mod plain;

use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::render::{Canvas, Color};

pub use life::LifeGrid;
pub use matrix::MatrixRain;
pub use particle::ParticleField;
pub use plain::PlainGradient;

/// Shared dark base most effects paint first
pub const BASE_COLOR: Color = Color::rgb(0x0a, 0x0a, 0x0a);

/// The available background effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    Particle,
    Matrix,
    #[serde(alias = "life")]
    GameOfLife,
    Plain,
}

impl BackgroundKind {
    pub const ALL: [BackgroundKind; 4] = [
        BackgroundKind::Particle,
        BackgroundKind::Matrix,
        BackgroundKind::GameOfLife,
        BackgroundKind::Plain,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BackgroundKind::Particle => "particle",
            BackgroundKind::Matrix => "matrix",
            BackgroundKind::GameOfLife => "gameoflife",
            BackgroundKind::Plain => "plain",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BackgroundKind::Particle => "Drifting particles linked by faint lines",
            BackgroundKind::Matrix => "Falling columns of glyphs",
            BackgroundKind::GameOfLife => "Conway's Game of Life on a wrapping grid",
            BackgroundKind::Plain => "Static dark gradient with an accent glow",
        }
    }
}

/// Effect-specific simulation state
pub enum Effect {
    Particle(ParticleField),
    Matrix(MatrixRain),
    Life(LifeGrid),
    Plain(PlainGradient),
}

impl Effect {
    fn new(kind: BackgroundKind, width: u32, height: u32, rng: &mut SmallRng) -> Self {
        let (w, h) = (width as f32, height as f32);
        match kind {
            BackgroundKind::Particle => Effect::Particle(ParticleField::new(w, h, rng)),
            BackgroundKind::Matrix => Effect::Matrix(MatrixRain::new(w, h, rng)),
            BackgroundKind::GameOfLife => Effect::Life(LifeGrid::new(width, height, rng)),
            BackgroundKind::Plain => Effect::Plain(PlainGradient),
        }
    }
}

/// One session's background: effect state plus its own random source
///
/// Never shared between sessions; preview and export each build their own.
pub struct BackgroundState {
    kind: BackgroundKind,
    tick: u64,
    width: u32,
    height: u32,
    rng: SmallRng,
    effect: Effect,
}

impl BackgroundState {
    /// Initialize an effect for a `width x height` canvas
    ///
    /// A `seed` makes the session reproducible; `None` draws one from the OS.
    pub fn new(kind: BackgroundKind, width: u32, height: u32, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let effect = Effect::new(kind, width, height, &mut rng);

        debug!("Initialized {} background at {}x{}", kind.name(), width, height);

        Self {
            kind,
            tick: 0,
            width,
            height,
            rng,
            effect,
        }
    }

    pub fn kind(&self) -> BackgroundKind {
        self.kind
    }

    /// Number of `step` calls since the effect was (re)initialized
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    /// Advance the simulation one tick, reinitializing first if the canvas changed size
    pub fn step(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            self.resize(width, height);
        }

        let (w, h) = (width as f32, height as f32);
        match &mut self.effect {
            Effect::Particle(field) => field.step(w, h),
            Effect::Matrix(rain) => rain.step(h, &mut self.rng),
            Effect::Life(grid) => grid.step(&mut self.rng),
            Effect::Plain(_) => {}
        }

        self.tick += 1;
    }

    /// Discard the effect state and start over for new dimensions
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.tick = 0;
        self.effect = Effect::new(self.kind, width, height, &mut self.rng);
    }

    /// Paint the current state over the whole canvas
    pub fn render(&self, canvas: &mut Canvas, color: Color) {
        match &self.effect {
            Effect::Particle(field) => field.render(canvas, color),
            Effect::Matrix(rain) => rain.render(canvas, color),
            Effect::Life(grid) => grid.render(canvas, color),
            Effect::Plain(gradient) => gradient.render(canvas, color),
        }
        canvas.reset_state();
    }
}
