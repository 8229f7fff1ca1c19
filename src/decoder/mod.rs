//! Trace decoding pipeline
//!
//! Resampled bits are grouped into 12-bit bytes and 25-byte frames, each frame
//! goes through the S.BUS frame decoder. Results flow out through two sinks:
//! annotations ([`DecodeEvent`]) and progress in percent.

mod events;
mod framer;
mod runner;

pub use events::{format_value, DecodeEvent, FrameKind};
pub use framer::{Framer, FramerStats};
pub use runner::{AnalysisReport, AnalyzerConfig, SbusAnalyzer, DATA_LABEL};
