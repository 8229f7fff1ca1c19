//! Futaba S.BUS decoder for captured logic-analyzer traces
//!
//! A capture is a list of (levels, timestamp) samples taken on level changes.
//! The pipeline:
//! 1. Resample the data line to one sample per 10 µs bit ([`trace`])
//! 2. Group bits into 8E2 bytes and 25-byte frames ([`decoder`])
//! 3. Decode each frame into 18 channels and status flags ([`sbus`])

pub mod bits;
pub mod config;
pub mod decoder;
pub mod error;
pub mod sbus;
pub mod synth;
pub mod trace;

pub use config::Config;
pub use decoder::{AnalysisReport, AnalyzerConfig, DecodeEvent, FrameKind, SbusAnalyzer};
pub use error::{ConfigError, DecodeError};
pub use sbus::{DecodedFrame, Failsafe, FrameCounters, FrameDecoder, SbusMode};
pub use trace::SampleStream;
