//! Bit-order helpers shared by the framer and the frame decoder

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Order in which the bits of a value are presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitOrder {
    #[default]
    MsbFirst,
    LsbFirst,
}

impl BitOrder {
    /// Convert a `width`-bit value into this bit order.
    /// `MsbFirst` is the identity, `LsbFirst` mirrors the value.
    pub fn convert(self, value: u32, width: u32) -> u32 {
        match self {
            BitOrder::MsbFirst => value,
            BitOrder::LsbFirst => reverse_bits(value, width),
        }
    }
}

impl FromStr for BitOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "msb" | "msb_first" | "msb-first" => Ok(BitOrder::MsbFirst),
            "lsb" | "lsb_first" | "lsb-first" => Ok(BitOrder::LsbFirst),
            _ => Err(ConfigError::UnknownBitOrder(s.to_string())),
        }
    }
}

impl fmt::Display for BitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitOrder::MsbFirst => write!(f, "MSB first"),
            BitOrder::LsbFirst => write!(f, "LSB first"),
        }
    }
}

/// Mirror the lowest `width` bits of `value` (bit 0 <-> bit width-1).
/// Bits above `width` are dropped.
pub fn reverse_bits(value: u32, width: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    let width = width.min(32);
    value.reverse_bits() >> (32 - width)
}

/// Progress of `value` through `start..=end` in percent, clamped to 0..=100
pub fn percentage(value: usize, start: usize, end: usize) -> u8 {
    if end <= start {
        return 100;
    }
    let done = value.saturating_sub(start).min(end - start);
    ((done as u64 * 100) / (end - start) as u64) as u8
}
