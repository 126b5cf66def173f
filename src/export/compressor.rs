use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::{
    config::CompressionSettings,
    error::{ExportError, Result},
};

/// Shrinks an encoded GIF
///
/// Failures are recoverable: callers keep the uncompressed bytes.
pub trait GifCompressor: Send + Sync {
    fn compress(&self, gif: &[u8], settings: &CompressionSettings) -> Result<Vec<u8>>;
}

/// Runs the external `gifsicle` binary over stdin/stdout
#[derive(Debug, Clone)]
pub struct Gifsicle {
    binary: PathBuf,
}

impl Default for Gifsicle {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("gifsicle"),
        }
    }
}

impl Gifsicle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary<P: Into<PathBuf>>(binary: P) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Command-line options for the given settings; out-of-range values are clamped
    pub fn build_args(settings: &CompressionSettings) -> Vec<String> {
        let mut args = vec![format!("-O{}", settings.optimization_level.clamp(1, 3))];

        if settings.lossy > 0 {
            args.push(format!("--lossy={}", settings.lossy.min(200)));
        }

        if let Some(colors) = settings.colors {
            if (2..=256).contains(&colors) {
                args.push("--colors".to_string());
                args.push(colors.to_string());
            }
        }

        args
    }
}

fn compression_error<E: std::fmt::Display>(e: E) -> crate::error::TyperError {
    ExportError::Compression {
        reason: e.to_string(),
    }
    .into()
}

impl GifCompressor for Gifsicle {
    fn compress(&self, gif: &[u8], settings: &CompressionSettings) -> Result<Vec<u8>> {
        let args = Self::build_args(settings);
        debug!("Running {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| compression_error(format!("failed to start {}: {}", self.binary.display(), e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| compression_error("stdin not captured"))?;

        // Feed stdin from a separate thread so a full stdout pipe cannot deadlock us
        let input = gif.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child.wait_with_output().map_err(compression_error)?;

        writer
            .join()
            .map_err(|_| compression_error("stdin writer panicked"))?
            .map_err(compression_error)?;

        if !output.status.success() {
            return Err(compression_error(format!(
                "gifsicle exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(compression_error("no output generated"));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(lossy: u32, level: u8, colors: Option<u32>) -> CompressionSettings {
        CompressionSettings {
            enabled: true,
            lossy,
            optimization_level: level,
            colors,
        }
    }

    #[test]
    fn test_default_args() {
        assert_eq!(
            Gifsicle::build_args(&CompressionSettings::default()),
            vec!["-O2", "--lossy=50"]
        );
    }

    #[test]
    fn test_lossless_with_color_limit() {
        assert_eq!(
            Gifsicle::build_args(&settings(0, 3, Some(64))),
            vec!["-O3", "--colors", "64"]
        );
    }

    #[test]
    fn test_out_of_range_values() {
        assert_eq!(
            Gifsicle::build_args(&settings(500, 9, Some(1))),
            vec!["-O3", "--lossy=200"]
        );
        assert_eq!(Gifsicle::build_args(&settings(0, 0, Some(300))), vec!["-O1"]);
    }

    #[test]
    fn test_missing_binary_is_a_compression_error() {
        let gifsicle = Gifsicle::with_binary("/nonexistent/gifsicle-binary");
        assert!(!gifsicle.is_available());

        let err = gifsicle
            .compress(b"GIF89a", &CompressionSettings::default())
            .unwrap_err();
        assert!(err.is_recoverable());
    }
}
