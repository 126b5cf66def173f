//! # gif-typer
//!
//! Render looping "typewriter" intro animations over generative backgrounds
//! and export them as GIFs.
//!
//! A [`Config`] describes the text fragments, typing speed, font, background
//! effect and export settings. From it the library derives an ordered list of
//! typing steps, a timeline that maps any instant onto the text on screen,
//! and finally pixels.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gif_typer::{config::Config, export::ExportDriver, render::FontBook};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let fonts = Arc::new(FontBook::discover(&config.font)?);
//!
//! let driver = ExportDriver::new(config, fonts);
//! let result = driver
//!     .export_to_file("intro.gif", |p| println!("{} {}%", p.phase, p.percent))
//!     .await?;
//! println!("{} frames", result.frame_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`animation`] - Step generation and the timeline interpolator
//! - [`backgrounds`] - Particle, matrix, Game of Life and plain effects
//! - [`render`] - Canvas primitives, font loading and the frame compositor
//! - [`export`] - Frame rendering, GIF encoding, compression and progress
//! - [`preview`] - Real-time preview loop
//! - [`config`] - Configuration management

pub mod animation;
pub mod backgrounds;
pub mod config;
pub mod error;
pub mod export;
pub mod preview;
pub mod render;

pub use crate::{
    animation::{generate_steps, AnimationStep, FrameState, Timeline},
    backgrounds::{BackgroundKind, BackgroundState},
    config::Config,
    error::{Result, TyperError},
    export::{ExportDriver, GifResult},
    preview::{PreviewHandle, PreviewLoop},
    render::{Color, FontBook, FrameCompositor},
};
