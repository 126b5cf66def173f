// Render a single frame of the animation to a PNG

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use gif_typer::{
    animation::Timeline,
    backgrounds::BackgroundState,
    config::Config,
    error::RenderError,
    render::{FontBook, FrameCompositor},
};

#[derive(Parser)]
#[command(name = "snapshot", about = "Render one frame of the animation to a PNG")]
struct Args {
    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Animation time in milliseconds
    #[arg(short, long, default_value_t = 1000.0)]
    at: f64,

    /// Output PNG path
    #[arg(short, long, default_value = "snapshot.png")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.validate()?;
    let config = config.sanitized();

    let timeline = Timeline::from_config(&config);
    let state = timeline.at_ms(args.at);
    info!("Frame at {:.0}ms: {:?}", args.at, state.text);

    // Run the background up to the tick this instant maps to
    let (width, height) = (config.background.width, config.background.height);
    let mut background = BackgroundState::new(config.background.kind, width, height, config.background.seed);
    for _ in 0..=state.background_tick {
        background.step(width, height);
    }

    let fonts = Arc::new(FontBook::discover(&config.font)?);
    let mut compositor = FrameCompositor::from_config(&config, fonts)?;
    let image = compositor.compose(&state, Some(&background))?;

    image.save(&args.output).map_err(|e| RenderError::ImageWriteFailed {
        path: args.output.display().to_string(),
        reason: e.to_string(),
    })?;

    println!("📁 Saved {}", args.output.display());
    Ok(())
}
