use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gif_typer::{
    animation::{generate_steps, Timeline},
    backgrounds::BackgroundKind,
    config::Config,
    export::{format_file_size, ExportDriver},
    preview::{PreviewLoop, PREVIEW_FPS},
    render::FontBook,
};

#[derive(Parser)]
#[command(
    name = "gif-typer",
    version,
    about = "Render typing-text intro animations as GIFs",
    long_about = "gif-typer types out an intro line, a name, a role and social handles over an animated background and exports the loop as a GIF."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the animation and write it as a GIF
    Export {
        /// Output file (defaults to `{prefix}{name}-intro.gif`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Background effect (particle, matrix, gameoflife, plain)
        #[arg(short, long)]
        background: Option<String>,

        /// Frames per second
        #[arg(long)]
        fps: Option<u32>,

        /// Playback speed multiplier
        #[arg(long)]
        playback_speed: Option<f32>,

        /// Seed for the background effect
        #[arg(long)]
        seed: Option<u64>,

        /// Skip gifsicle compression
        #[arg(long)]
        no_compress: bool,
    },

    /// Play the animation in the terminal
    Preview {
        /// How long to play, in seconds
        #[arg(short, long, default_value_t = 10)]
        seconds: u64,
    },

    /// Print the generated animation steps
    Steps,

    /// Write a default configuration file
    InitConfig {
        #[arg(default_value = "gif-typer.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Config::from_file(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    config.validate()?;
    Ok(config)
}

fn parse_background(name: &str) -> Result<BackgroundKind> {
    BackgroundKind::ALL
        .into_iter()
        .find(|kind| kind.name() == name.to_lowercase())
        .ok_or_else(|| anyhow::anyhow!("Unknown background: {}", name))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting gif-typer v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Export {
            output,
            background,
            fps,
            playback_speed,
            seed,
            no_compress,
        } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(name) = background {
                config.background.kind = parse_background(&name)?;
            }
            if let Some(fps) = fps {
                config.gif.fps = fps;
            }
            if let Some(speed) = playback_speed {
                config.gif.playback_speed = speed;
            }
            if seed.is_some() {
                config.background.seed = seed;
            }
            if no_compress {
                config.gif.compression.enabled = false;
            }

            let output = output.unwrap_or_else(|| PathBuf::from(config.output_filename()));
            let fonts = Arc::new(FontBook::discover(&config.font).map_err(|e| anyhow::anyhow!(e.user_message()))?);

            let driver = ExportDriver::new(config, fonts);
            let result = driver
                .export_to_file(&output, |progress| {
                    eprint!("\r{:>3}% {:<12}", progress.percent, progress.phase.to_string());
                    let _ = std::io::stderr().flush();
                })
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            eprintln!();

            println!(
                "{} ({} frames, {} -> {})",
                output.display(),
                result.frame_count,
                format_file_size(result.original_size),
                format_file_size(result.compressed_size)
            );
        }

        Command::Preview { seconds } => {
            let config = load_config(cli.config.as_ref())?;
            let fonts = Arc::new(FontBook::discover(&config.font).map_err(|e| anyhow::anyhow!(e.user_message()))?);

            info!("Previewing at {} fps for {}s", PREVIEW_FPS, seconds);
            let mut handle = PreviewLoop::spawn(config, fonts, |frame| {
                let cursor = if frame.state.cursor_visible { "▌" } else { " " };
                print!("\r\x1b[2K{}{}", frame.state.text, cursor);
                let _ = std::io::stdout().flush();
            });

            tokio::time::sleep(Duration::from_secs(seconds)).await;
            handle.stop();
            println!();
        }

        Command::Steps => {
            let config = load_config(cli.config.as_ref())?;
            let timeline = Timeline::new(generate_steps(&config), config.speed);

            for (index, step) in timeline.steps().iter().enumerate() {
                println!("{:>3}  {}", index, step);
            }
            println!(
                "total: {:.0}ms, {} frames at {} fps",
                timeline.total_ms(),
                timeline.frame_count(f64::from(config.gif.fps)),
                config.gif.fps
            );
        }

        Command::InitConfig { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            Config::default().save_to_file(&path)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
