use rand::{rngs::SmallRng, Rng};

use crate::render::{Canvas, Color, Shadow};

use super::BASE_COLOR;

pub const CELL_SIZE: u32 = 8;

/// The grid advances one generation every this many ticks
pub const TICKS_PER_GENERATION: u64 = 5;

const INITIAL_DENSITY: f64 = 0.15;
const GLIDER_CHANCE: f64 = 0.05;

/// Glider cells relative to the injection point
const GLIDER: [(i64, i64); 5] = [(0, 0), (1, 1), (-1, 2), (0, 2), (1, 2)];

const GRID_LINE: Color = Color::rgba(255, 255, 255, 5);

/// Conway's Game of Life on a toroidal grid
pub struct LifeGrid {
    cols: usize,
    rows: usize,
    cells: Vec<bool>,
    ticks: u64,
    generation: u64,
}

impl LifeGrid {
    pub fn new(width: u32, height: u32, rng: &mut SmallRng) -> Self {
        let cols = width.div_ceil(CELL_SIZE) as usize;
        let rows = height.div_ceil(CELL_SIZE) as usize;
        let cells = (0..cols * rows).map(|_| rng.gen_bool(INITIAL_DENSITY)).collect();

        Self {
            cols,
            rows,
            cells,
            ticks: 0,
            generation: 0,
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn alive(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.cols + x]
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|alive| **alive).count()
    }

    pub fn step(&mut self, rng: &mut SmallRng) {
        self.ticks += 1;
        if self.ticks % TICKS_PER_GENERATION == 0 {
            self.advance(rng);
        }
    }

    fn advance(&mut self, rng: &mut SmallRng) {
        if self.cells.is_empty() {
            return;
        }

        self.evolve();

        if rng.gen_bool(GLIDER_CHANCE) {
            let x = rng.gen_range(0..self.cols) as i64;
            let y = rng.gen_range(0..self.rows) as i64;
            self.inject_glider(x, y);
        }

        self.generation += 1;
    }

    /// Apply the survival/birth rule once
    fn evolve(&mut self) {
        let mut next = vec![false; self.cells.len()];
        for y in 0..self.rows {
            for x in 0..self.cols {
                let neighbors = self.neighbors(x, y);
                let alive = self.alive(x, y);
                next[y * self.cols + x] = matches!((alive, neighbors), (true, 2) | (_, 3));
            }
        }
        self.cells = next;
    }

    fn inject_glider(&mut self, x: i64, y: i64) {
        for (dx, dy) in GLIDER {
            let (gx, gy) = self.wrapped(x + dx, y + dy);
            self.cells[gy * self.cols + gx] = true;
        }
    }

    fn neighbors(&self, x: usize, y: usize) -> usize {
        let mut count = 0;
        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = self.wrapped(x as i64 + dx, y as i64 + dy);
                if self.cells[ny * self.cols + nx] {
                    count += 1;
                }
            }
        }
        count
    }

    fn wrapped(&self, x: i64, y: i64) -> (usize, usize) {
        (
            x.rem_euclid(self.cols as i64) as usize,
            y.rem_euclid(self.rows as i64) as usize,
        )
    }

    pub fn render(&self, canvas: &mut Canvas, color: Color) {
        canvas.clear(BASE_COLOR);
        let cell = CELL_SIZE as f32;

        canvas.set_shadow(Some(Shadow { color, blur: 4.0 }));
        for y in 0..self.rows {
            for x in 0..self.cols {
                if self.alive(x, y) {
                    canvas.fill_rect(x as f32 * cell + 1.0, y as f32 * cell + 1.0, cell - 2.0, cell - 2.0, color);
                }
            }
        }
        canvas.set_shadow(None);

        let (width, height) = (canvas.width() as f32, canvas.height() as f32);
        for x in (0..=canvas.width()).step_by(CELL_SIZE as usize) {
            canvas.fill_rect(x as f32 - 0.25, 0.0, 0.5, height, GRID_LINE);
        }
        for y in (0..=canvas.height()).step_by(CELL_SIZE as usize) {
            canvas.fill_rect(0.0, y as f32 - 0.25, width, 0.5, GRID_LINE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn grid_from(cols: usize, rows: usize, alive: &[(usize, usize)]) -> LifeGrid {
        let mut cells = vec![false; cols * rows];
        for (x, y) in alive {
            cells[y * cols + x] = true;
        }
        LifeGrid {
            cols,
            rows,
            cells,
            ticks: 0,
            generation: 0,
        }
    }

    #[test]
    fn test_grid_dimensions_round_up_and_never_change() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut grid = LifeGrid::new(601, 200, &mut rng);
        assert_eq!(grid.dimensions(), (76, 25));

        for _ in 0..100 {
            grid.step(&mut rng);
            assert_eq!(grid.dimensions(), (76, 25));
            assert_eq!(grid.cells.len(), 76 * 25);
        }
    }

    #[test]
    fn test_generation_every_five_ticks() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut grid = LifeGrid::new(80, 80, &mut rng);
        for _ in 0..4 {
            grid.step(&mut rng);
        }
        assert_eq!(grid.generation(), 0);
        grid.step(&mut rng);
        assert_eq!(grid.generation(), 1);
    }

    #[test]
    fn test_blinker_oscillates() {
        let mut grid = grid_from(5, 5, &[(1, 2), (2, 2), (3, 2)]);
        let before = grid.cells.clone();

        grid.evolve();
        assert_eq!(grid.population(), 3);
        assert!(grid.alive(2, 1) && grid.alive(2, 2) && grid.alive(2, 3));
        assert!(!grid.alive(1, 2));

        grid.evolve();
        assert_eq!(grid.cells, before);
    }

    #[test]
    fn test_neighbors_wrap_around_edges() {
        let grid = grid_from(4, 4, &[(3, 3), (0, 3), (3, 0)]);
        assert_eq!(grid.neighbors(0, 0), 3);
    }

    #[test]
    fn test_glider_injection_wraps() {
        let mut grid = grid_from(6, 6, &[]);
        grid.inject_glider(0, 5);
        assert_eq!(grid.population(), 5);
        assert!(grid.alive(0, 5));
        assert!(grid.alive(1, 0));
        assert!(grid.alive(5, 1) && grid.alive(0, 1) && grid.alive(1, 1));
    }
}
