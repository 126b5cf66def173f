use std::path::Path;
use std::sync::Arc;

use tokio::{sync::mpsc, task};
use tracing::{debug, info, warn};

use crate::{
    animation::{generate_steps, Timeline},
    backgrounds::BackgroundState,
    config::{Config, GifSettings},
    error::{ExportError, Result},
    render::{FontBook, FrameCompositor},
};

use super::{
    compressor::{GifCompressor, Gifsicle},
    encoder::{EncodeFrame, EncoderSettings, FrameEncoder, GifEncoder},
    progress::{format_file_size, ExportProgress, ProgressTracker},
};

/// Frames rendered between cooperative yields to the runtime
const YIELD_EVERY: u64 = 8;

/// Frame count and timing for one export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportPlan {
    pub fps: u32,
    pub total_frames: u64,
    /// Delay written for every frame, scaled by the playback speed
    pub frame_delay_ms: u32,
}

impl ExportPlan {
    pub fn new(timeline: &Timeline, settings: &GifSettings) -> Self {
        let fps = settings.fps.max(1);
        let playback = if settings.playback_speed.is_finite() && settings.playback_speed > 0.0 {
            f64::from(settings.playback_speed)
        } else {
            1.0
        };

        Self {
            fps,
            total_frames: timeline.frame_count(f64::from(fps)),
            frame_delay_ms: (1000.0 / f64::from(fps) / playback).round() as u32,
        }
    }

    /// Animation time sampled by frame `frame`
    pub fn frame_time_ms(&self, frame: u64) -> f64 {
        frame as f64 / f64::from(self.fps) * 1000.0
    }
}

/// The finished export
#[derive(Debug, Clone)]
pub struct GifResult {
    pub bytes: Vec<u8>,
    pub original_size: u64,
    pub compressed_size: u64,
    pub frame_count: u64,
    pub frame_delay_ms: u32,
}

impl GifResult {
    pub fn was_compressed(&self) -> bool {
        self.compressed_size != self.original_size
    }
}

/// Renders a configuration into a GIF
///
/// The pipeline is:
/// 1. Rendering - every frame is composited in order on one buffer
/// 2. Encoding - frames go to the encoder on a blocking thread
/// 3. Compressing - optional, falls back to the encoder output on failure
pub struct ExportDriver {
    config: Config,
    fonts: Arc<FontBook>,
    encoder: Arc<dyn FrameEncoder>,
    compressor: Arc<dyn GifCompressor>,
}

impl ExportDriver {
    pub fn new(config: Config, fonts: Arc<FontBook>) -> Self {
        Self {
            config,
            fonts,
            encoder: Arc::new(GifEncoder::new()),
            compressor: Arc::new(Gifsicle::new()),
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn FrameEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn GifCompressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn prepared_config(&self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config.sanitized())
    }

    /// Frame count and delay the export will use
    pub fn plan(&self) -> Result<ExportPlan> {
        let config = self.prepared_config()?;
        let timeline = Timeline::from_config(&config);
        Ok(ExportPlan::new(&timeline, &config.gif))
    }

    /// Run the whole pipeline and return the GIF bytes
    pub async fn export<F>(&self, progress: F) -> Result<GifResult>
    where
        F: FnMut(ExportProgress) + Send,
    {
        let config = self.prepared_config()?;
        let mut tracker = ProgressTracker::new(progress);

        let timeline = Timeline::new(generate_steps(&config), config.speed);
        let plan = ExportPlan::new(&timeline, &config.gif);

        info!("🎬 Starting GIF export");
        info!("   Canvas: {}x{}", config.background.width, config.background.height);
        info!("   Background: {}", config.background.kind.name());
        info!(
            "   Duration: {:.0}ms, {} frames at {} fps ({}ms delay)",
            timeline.total_ms(),
            plan.total_frames,
            plan.fps,
            plan.frame_delay_ms
        );

        if plan.total_frames == 0 {
            return Err(ExportError::NoFrames.into());
        }

        // Step 1: rendering
        let frames = self.render_frames(&config, &timeline, &plan, &mut tracker).await?;

        // Step 2: encoding
        let settings = EncoderSettings {
            width: config.background.width,
            height: config.background.height,
            quality: config.gif.quality,
        };
        let raw = self.encode_frames(frames, settings, &mut tracker).await?;
        let original_size = raw.len() as u64;
        info!("   ✅ Encoded {}", format_file_size(original_size));

        // Step 3: compression
        let bytes = if config.gif.compression.enabled {
            tracker.compressing();
            self.compress(raw, &config).await
        } else {
            raw
        };
        let compressed_size = bytes.len() as u64;

        tracker.complete(original_size, compressed_size);
        info!(
            "🎉 Export complete: {} -> {}",
            format_file_size(original_size),
            format_file_size(compressed_size)
        );

        Ok(GifResult {
            bytes,
            original_size,
            compressed_size,
            frame_count: plan.total_frames,
            frame_delay_ms: plan.frame_delay_ms,
        })
    }

    /// Export and write the result to `path`
    pub async fn export_to_file<P, F>(&self, path: P, progress: F) -> Result<GifResult>
    where
        P: AsRef<Path>,
        F: FnMut(ExportProgress) + Send,
    {
        let path = path.as_ref();
        let result = self.export(progress).await?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, &result.bytes).await?;

        info!("💾 Saved {:?}", path);
        Ok(result)
    }

    async fn render_frames<F>(
        &self,
        config: &Config,
        timeline: &Timeline,
        plan: &ExportPlan,
        tracker: &mut ProgressTracker<F>,
    ) -> Result<Vec<EncodeFrame>>
    where
        F: FnMut(ExportProgress) + Send,
    {
        info!("🖌️  Step 1: Rendering {} frames...", plan.total_frames);

        let (width, height) = (config.background.width, config.background.height);
        let mut compositor = FrameCompositor::from_config(config, Arc::clone(&self.fonts))?;
        let mut background = BackgroundState::new(config.background.kind, width, height, config.background.seed);
        let mut frames = Vec::with_capacity(plan.total_frames as usize);

        for frame in 0..plan.total_frames {
            background.step(width, height);
            let state = timeline.at_ms(plan.frame_time_ms(frame));
            let image = compositor.compose(&state, Some(&background))?;

            frames.push(EncodeFrame {
                image: image.clone(),
                delay_ms: plan.frame_delay_ms,
            });
            tracker.rendering(frame, plan.total_frames);

            if frame % YIELD_EVERY == YIELD_EVERY - 1 {
                task::yield_now().await;
            }
        }

        debug!("Rendered {} frames", frames.len());
        Ok(frames)
    }

    async fn encode_frames<F>(
        &self,
        frames: Vec<EncodeFrame>,
        settings: EncoderSettings,
        tracker: &mut ProgressTracker<F>,
    ) -> Result<Vec<u8>>
    where
        F: FnMut(ExportProgress) + Send,
    {
        info!("📦 Step 2: Encoding GIF...");

        let (tx, mut rx) = mpsc::unbounded_channel::<f32>();
        let encoder = Arc::clone(&self.encoder);

        let handle = task::spawn_blocking(move || {
            encoder.encode(frames, &settings, &mut |fraction| {
                // The receiver only goes away if the export future was dropped
                let _ = tx.send(fraction);
            })
        });

        while let Some(fraction) = rx.recv().await {
            tracker.encoding(fraction);
        }

        handle
            .await
            .map_err(|e| ExportError::TaskFailed {
                reason: e.to_string(),
            })?
            .map_err(|e| {
                warn!("Encoding failed, discarding frames: {}", e);
                e
            })
    }

    /// Compress `raw`, or hand it back untouched if the compressor fails
    async fn compress(&self, raw: Vec<u8>, config: &Config) -> Vec<u8> {
        info!("🗜️  Step 3: Compressing GIF...");

        let compressor = Arc::clone(&self.compressor);
        let settings = config.gif.compression.clone();
        let raw = Arc::new(raw);
        let input = Arc::clone(&raw);

        let outcome = task::spawn_blocking(move || compressor.compress(&input, &settings)).await;

        let compressed = match outcome {
            Ok(Ok(bytes)) => Some(bytes),
            Ok(Err(e)) => {
                warn!("Compression failed, using uncompressed GIF: {}", e);
                None
            }
            Err(e) => {
                warn!("Compression task failed, using uncompressed GIF: {}", e);
                None
            }
        };

        match compressed {
            Some(bytes) => bytes,
            None => Arc::try_unwrap(raw).unwrap_or_else(|shared| shared.as_ref().clone()),
        }
    }
}
