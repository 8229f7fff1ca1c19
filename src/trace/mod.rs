//! Captured logic traces and bit recovery
//!
//! S.BUS runs at 100 kbit/s:
//! 1. Resample the edge list to one sample per 10 µs bit
//! 2. Detect the link speed from the gaps between frames
//!
//! Frames are 25 bytes of 12 bits (8E2), 300 bits in total.

mod mode;
mod resample;
mod samples;

pub use mode::detect_mode;
pub use resample::BitResampler;
pub use samples::{BitSample, SampleStream};

/// Duration of one bit in seconds
pub const BIT_PERIOD: f64 = 10e-6;

/// Start + 8 data + parity + 2 stop bits
pub const BITS_PER_BYTE: usize = 12;

/// 25 bytes of 12 bits
pub const BITS_PER_FRAME: usize = 300;

/// Slowest capture that still resolves the bit edges
pub const MIN_SAMPLE_RATE: u32 = 200_000;
