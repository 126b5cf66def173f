use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    animation::AnimationStep,
    backgrounds::BackgroundKind,
    error::{ConfigError, Result},
    render::Color,
};

/// Allowed range for `speed` (milliseconds per character)
pub const SPEED_RANGE: (u32, u32) = (10, 1000);
/// Allowed range for the font size in pixels
pub const FONT_SIZE_RANGE: (u32, u32) = (16, 32);
/// Allowed range for the exported frame rate
pub const FPS_RANGE: (u32, u32) = (4, 20);
/// Playback multipliers offered for export
pub const PLAYBACK_SPEEDS: [f32; 8] = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0];

/// Main configuration for one render session
///
/// The configuration is replaced wholesale on every edit; steps and background
/// state are always regenerated from it rather than patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Opening line, always typed first
    pub intro_text: String,

    /// Name typed after the intro (skipped when empty)
    pub name: String,

    /// Role that replaces the name (skipped when empty)
    pub role: String,

    /// Typing speed in milliseconds per character
    pub speed: u32,

    /// Base pause in milliseconds
    pub pause_ms: u64,

    /// Social handles, in display order
    pub socials: Vec<Social>,

    /// Text styling
    pub font: FontConfig,

    /// Background effect and canvas size
    pub background: BackgroundConfig,

    /// Export-only GIF settings
    pub gif: GifSettings,

    /// Explicit step script; replaces the generated steps when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<Vec<AnimationStep>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            intro_text: "Hey there! I am".to_string(),
            name: "Niraj".to_string(),
            role: "Software Engineer".to_string(),
            speed: 50,
            pause_ms: 1500,
            socials: vec![
                Social::new(SocialKind::X, "0xkniraj"),
                Social::new(SocialKind::Sns, "0xkniraj"),
                Social::new(SocialKind::Ens, "0xkniraj"),
            ],
            font: FontConfig::default(),
            background: BackgroundConfig::default(),
            gif: GifSettings::default(),
            script: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    ///
    /// Only values that cannot be sensibly clamped are rejected here; ranged
    /// values are brought into range by [`Config::sanitized`].
    pub fn validate(&self) -> Result<()> {
        if self.speed == 0 {
            return Err(ConfigError::InvalidValue {
                key: "speed".to_string(),
                value: self.speed.to_string(),
            }.into());
        }

        self.background.validate()?;
        self.gif.validate()?;

        if let Some(script) = &self.script {
            crate::animation::validate_script(script)?;
        }

        Ok(())
    }

    /// Copy of the configuration with every ranged value clamped into range
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();

        config.speed = clamp_logged("speed", config.speed, SPEED_RANGE);
        config.font.size = clamp_logged("font.size", config.font.size, FONT_SIZE_RANGE);
        config.gif.fps = clamp_logged("gif.fps", config.gif.fps, FPS_RANGE);
        config.gif.quality = clamp_logged("gif.quality", config.gif.quality, (1, 30));

        let snapped = snap_playback_speed(config.gif.playback_speed);
        if snapped != config.gif.playback_speed {
            warn!("gif.playback_speed {} snapped to {}", config.gif.playback_speed, snapped);
            config.gif.playback_speed = snapped;
        }

        let compression = &mut config.gif.compression;
        compression.lossy = clamp_logged("gif.compression.lossy", compression.lossy, (0, 200));
        compression.optimization_level = clamp_logged(
            "gif.compression.optimization_level",
            compression.optimization_level,
            (1, 3),
        );
        compression.colors = compression
            .colors
            .map(|colors| clamp_logged("gif.compression.colors", colors, (2, 256)));

        config
    }

    /// File name for the exported GIF: `{prefix}{lowercased name}-intro.gif`
    pub fn output_filename(&self) -> String {
        let name = self.name.trim().to_lowercase();
        let name = if name.is_empty() { "animation".to_string() } else { name };
        format!("{}{}-intro.gif", self.gif.filename_prefix, name)
    }

    /// Socials that will actually appear in the animation
    pub fn visible_socials(&self) -> impl Iterator<Item = &Social> {
        self.socials
            .iter()
            .filter(|social| social.enabled && !social.handle.is_empty())
    }
}

fn clamp_logged<T>(key: &str, value: T, (min, max): (T, T)) -> T
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    if value < min {
        warn!("{} = {} is below {}, clamping", key, value, min);
        min
    } else if value > max {
        warn!("{} = {} is above {}, clamping", key, value, max);
        max
    } else {
        value
    }
}

/// Nearest allowed playback multiplier
pub fn snap_playback_speed(speed: f32) -> f32 {
    if !speed.is_finite() {
        return 1.0;
    }
    PLAYBACK_SPEEDS
        .iter()
        .copied()
        .min_by(|a, b| (a - speed).abs().total_cmp(&(b - speed).abs()))
        .unwrap_or(1.0)
}

/// Kinds of social handle the animation knows how to display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialKind {
    X,
    Sns,
    Ens,
    Youtube,
    Github,
}

impl SocialKind {
    pub const ALL: [SocialKind; 5] = [
        SocialKind::X,
        SocialKind::Sns,
        SocialKind::Ens,
        SocialKind::Youtube,
        SocialKind::Github,
    ];

    /// Text shown before the handle
    pub fn prefix(&self) -> &'static str {
        match self {
            SocialKind::X => "x.com/",
            SocialKind::Youtube => "youtube.com/@",
            SocialKind::Github => "github.com/",
            SocialKind::Sns | SocialKind::Ens => "",
        }
    }

    /// Text shown after the handle
    pub fn suffix(&self) -> &'static str {
        match self {
            SocialKind::Sns => ".sol",
            SocialKind::Ens => ".eth",
            SocialKind::X | SocialKind::Youtube | SocialKind::Github => "",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SocialKind::X => "X (Twitter)",
            SocialKind::Sns => "Solana Name Service",
            SocialKind::Ens => "Ethereum Name Service",
            SocialKind::Youtube => "YouTube",
            SocialKind::Github => "GitHub",
        }
    }

    /// Full display form of a handle
    pub fn display(&self, handle: &str) -> String {
        format!("{}{}{}", self.prefix(), handle, self.suffix())
    }
}

/// A social handle entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Social {
    #[serde(rename = "type")]
    pub kind: SocialKind,
    pub handle: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Social {
    pub fn new<S: Into<String>>(kind: SocialKind, handle: S) -> Self {
        Self {
            kind,
            handle: handle.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

fn default_true() -> bool {
    true
}

/// Font families offered for the typed text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    Mono,
    Sans,
    Serif,
}

/// Text styling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: FontFamily,

    /// Font size in pixels
    pub size: u32,

    pub color: Color,

    pub bold: bool,

    pub italic: bool,

    /// Explicit TrueType file; overrides font discovery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: FontFamily::Mono,
            size: 24,
            color: Color::WHITE,
            bold: false,
            italic: false,
            file: None,
        }
    }
}

/// Background effect and canvas configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    #[serde(rename = "type")]
    pub kind: BackgroundKind,

    /// Accent color used by the effect, the cursor and the text glow
    pub color: Color,

    pub width: u32,

    pub height: u32,

    /// Seed for the effect's random state; unseeded sessions differ per run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            kind: BackgroundKind::Particle,
            color: Color::rgb(0x9b, 0x5d, 0xe5),
            width: 600,
            height: 200,
            seed: None,
        }
    }
}

impl BackgroundConfig {
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "background.size".to_string(),
                value: format!("{}x{}", self.width, self.height),
            }.into());
        }

        // GIF logical screens are 16-bit
        if self.width > u16::MAX as u32 || self.height > u16::MAX as u32 {
            return Err(ConfigError::InvalidValue {
                key: "background.size".to_string(),
                value: format!("{}x{}", self.width, self.height),
            }.into());
        }

        Ok(())
    }
}

/// Export-only GIF settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GifSettings {
    /// Frames per second of the exported GIF
    pub fps: u32,

    /// Playback multiplier applied to frame delays
    pub playback_speed: f32,

    /// Palette quantization speed passed to the encoder (1 = best, 30 = fastest)
    pub quality: u32,

    /// Prepended to the exported file name
    pub filename_prefix: String,

    pub compression: CompressionSettings,
}

impl Default for GifSettings {
    fn default() -> Self {
        Self {
            fps: 12,
            playback_speed: 1.0,
            quality: 10,
            filename_prefix: String::new(),
            compression: CompressionSettings::default(),
        }
    }
}

impl GifSettings {
    fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "gif.fps".to_string(),
                value: self.fps.to_string(),
            }.into());
        }

        if !(self.playback_speed.is_finite() && self.playback_speed > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "gif.playback_speed".to_string(),
                value: self.playback_speed.to_string(),
            }.into());
        }

        Ok(())
    }
}

/// Settings for the post-encoding lossy compressor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    pub enabled: bool,

    /// Lossy strength, 0 disables lossy compression
    pub lossy: u32,

    /// Optimization level 1-3
    pub optimization_level: u8,

    /// Palette size limit; `None` keeps the encoder's palette
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<u32>,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            lossy: 50,
            optimization_level: 2,
            colors: None,
        }
    }
}
