//! Error types for the simulator

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Framing error: {0}")]
    Frame(#[from] FrameError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wire framing errors
///
/// These are reported per datagram and never escalate past the receive
/// path: a malformed datagram is logged and the remainder discarded.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("bad magic {0:02x?}, expected \"PS\"")]
    BadMagic([u8; 2]),

    #[error("truncated frame: need {needed} more bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("body of {0} bytes does not fit the 32-bit length field")]
    BodyTooLarge(usize),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
