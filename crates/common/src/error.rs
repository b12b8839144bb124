//! Error types shared across Proofshot crates.

/// Top-level error type for Proofshot operations.
#[derive(Debug, thiserror::Error)]
pub enum ProofshotError {
    /// No root/display surface could be obtained (headless session,
    /// display server gone). Fatal, never retried.
    #[error("No display window available: {message}")]
    NoWindow { message: String },

    /// The initial monitor bounds probe failed before any frame was written.
    #[error("Monitor not available: {message}")]
    MonitorUnavailable { message: String },

    /// No capture backend is usable on this platform.
    #[error("Unsupported capture backend: {message}")]
    UnsupportedBackend { message: String },

    /// A requested sub-region exceeds the source frame's bounds.
    #[error("Crop error: {message}")]
    Crop { message: String },

    /// A single grab returned an empty or malformed frame.
    #[error("Capture error: {message}")]
    Capture { message: String },

    /// Video or image encoding failed.
    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ProofshotError.
pub type ProofshotResult<T> = Result<T, ProofshotError>;

impl ProofshotError {
    pub fn no_window(msg: impl Into<String>) -> Self {
        Self::NoWindow {
            message: msg.into(),
        }
    }

    pub fn monitor_unavailable(msg: impl Into<String>) -> Self {
        Self::MonitorUnavailable {
            message: msg.into(),
        }
    }

    pub fn unsupported_backend(msg: impl Into<String>) -> Self {
        Self::UnsupportedBackend {
            message: msg.into(),
        }
    }

    pub fn crop(msg: impl Into<String>) -> Self {
        Self::Crop {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
