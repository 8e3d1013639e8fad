//! Error types for Sensei3D

use thiserror::Error;

/// Main error type for Sensei3D
#[derive(Error, Debug)]
pub enum Sensei3dError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

/// Graphics surface errors.
///
/// These never reach the host: a failed surface is swapped for the static
/// placeholder at mount time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("No graphics context available: {0}")]
    NoContext(String),

    #[error("Surface has zero area: {width}x{height}")]
    ZeroSize { width: u32, height: u32 },

    #[error("Graphics context lost")]
    ContextLost,
}

/// Frame scheduler errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Frame rate must be positive, got {0}")]
    InvalidFrameRate(f32),

    #[error("Unknown subscription: {0}")]
    UnknownSubscription(u64),
}

/// Result type alias for Sensei3D operations
pub type Result<T> = std::result::Result<T, Sensei3dError>;

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
