//! Error types for the decode pipeline and its configuration

use thiserror::Error;

/// Errors raised while decoding a captured trace
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The capture was sampled too slowly to resolve 10 µs bits
    #[error("sample rate is too low: {sample_rate} Hz (sample at >= {minimum} Hz)")]
    SampleRateTooLow { sample_rate: u32, minimum: u32 },

    /// A frame buffer handed to the frame decoder was not 25 bytes long
    #[error("frame buffer has {0} bytes, expected 25")]
    InvalidFrameLength(usize),

    #[error("capture has {levels} levels but {timestamps} timestamps")]
    LengthMismatch { levels: usize, timestamps: usize },

    #[error("timestamp at sample {index} does not increase")]
    NonMonotonicTimestamp { index: usize },

    /// Only the lower 8 lines of a sample can carry S.BUS data
    #[error("data channel {0} is out of range (0..=7)")]
    InvalidDataChannel(u8),
}

/// Errors raised while reading configuration values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown S.BUS mode: {0:?}")]
    UnknownMode(String),

    #[error("unknown bit order: {0:?}")]
    UnknownBitOrder(String),
}
