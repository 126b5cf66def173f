//! # Animation Timeline Engine
//!
//! Turns a [`Config`](crate::config::Config) into an ordered list of typing
//! operations and maps any point in time onto the text, cursor and background
//! tick that should be on screen.
//!
//! ## Usage
//!
//! ```rust
//! use gif_typer::{animation::{generate_steps, Timeline}, config::Config};
//!
//! let config = Config::default();
//! let timeline = Timeline::new(generate_steps(&config), config.speed);
//!
//! let state = timeline.at_ms(250.0);
//! assert!(state.text.starts_with("Hey"));
//! ```

pub mod steps;
pub mod timeline;

pub use steps::{generate_steps, validate_script, AnimationStep};
pub use timeline::{
    interpolate, interpolate_at_time, step_duration_ms, total_duration_ms, FrameState, Timeline,
};

/// Delete runs faster than typing by this factor
pub const DELETE_SPEED_FACTOR: f64 = 0.5;

/// Cursor blink half-period in milliseconds
pub const CURSOR_BLINK_MS: f64 = 300.0;

/// Background cadence used by time-indexed queries
pub const BACKGROUND_MS_PER_TICK: f64 = 16.0;
