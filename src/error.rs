use thiserror::Error;

/// Main error type for the gif-typer library
#[derive(Error, Debug)]
pub enum TyperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path} ({reason})")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid hex color: {value}")]
    InvalidColor { value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Errors raised while building or validating a step script
#[derive(Error, Debug)]
pub enum AnimationError {
    #[error("Step {index} deletes {count} characters but only {available} are on screen")]
    DeleteUnderflow {
        index: usize,
        count: usize,
        available: usize,
    },
}

/// Drawing-boundary errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing context unavailable: {reason}")]
    ContextUnavailable { reason: String },

    #[error("Failed to load font {path}: {reason}")]
    FontLoadFailed { path: String, reason: String },

    #[error("Failed to write image {path}: {reason}")]
    ImageWriteFailed { path: String, reason: String },
}

/// Export pipeline errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("GIF encoding failed: {reason}")]
    Encoding { reason: String },

    #[error("GIF compression failed: {reason}")]
    Compression { reason: String },

    #[error("Export produced no frames")]
    NoFrames,

    #[error("Background task failed: {reason}")]
    TaskFailed { reason: String },
}

/// Convenience type alias for Results using TyperError
pub type Result<T> = std::result::Result<T, TyperError>;

impl TyperError {
    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            // The canvas may simply not be attached yet
            Self::Render(RenderError::ContextUnavailable { .. }) => true,
            Self::Export(ExportError::Compression { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Config(ConfigError::InvalidColor { value }) => {
                format!("'{}' is not a valid color. Use #rgb or #rrggbb.", value)
            }
            Self::Render(RenderError::ContextUnavailable { reason }) => {
                format!(
                    "Could not prepare the drawing surface ({}). Install a TrueType font or set font.file in the config.",
                    reason
                )
            }
            Self::Export(ExportError::Encoding { reason }) => {
                format!("GIF encoding failed: {}. No file was written.", reason)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        let err: TyperError = RenderError::ContextUnavailable {
            reason: "no fonts".to_string(),
        }
        .into();
        assert!(err.is_recoverable());

        let err: TyperError = ExportError::Encoding {
            reason: "boom".to_string(),
        }
        .into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_user_message_mentions_value() {
        let err: TyperError = ConfigError::InvalidColor {
            value: "#zzz".to_string(),
        }
        .into();
        assert!(err.user_message().contains("#zzz"));
    }

    #[test]
    fn test_script_errors_are_not_recoverable() {
        let err: TyperError = AnimationError::DeleteUnderflow {
            index: 2,
            count: 9,
            available: 4,
        }
        .into();
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("Step 2 deletes 9"));
    }
}
