//! Error types for YantraMotion

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// YantraMotion error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Drive speed outside the accepted 1..=100 percent range
    #[error("Invalid speed {0}: must be in 1..=100")]
    InvalidSpeed(u8),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Encoder could not be read
    #[error("Encoder read failed: {0}")]
    EncoderRead(String),

    /// Limit switch could not be read
    #[error("Limit switch read failed: {0}")]
    SwitchRead(String),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Motion was aborted by an external shutdown request
    #[error("Motion interrupted")]
    Interrupted,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
