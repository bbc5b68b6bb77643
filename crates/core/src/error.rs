/// Result alias that carries the custom [`SoundDeckError`] type.
pub type Result<T> = std::result::Result<T, SoundDeckError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SoundDeckError {
    /// Free-form error used by subsystems whose failures carry no richer
    /// structure, e.g. poisoned locks on shared audio state.
    #[error("{0}")]
    Message(String),
    /// Visualization was started before the render host attached a surface.
    #[error("render surface has not been attached")]
    SurfaceMissing,
    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl SoundDeckError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for SoundDeckError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SoundDeckError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
