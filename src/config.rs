//! Configuration loaded from environment variables

use std::time::Duration;

use crate::bits::BitOrder;
use crate::decoder::AnalyzerConfig;
use crate::error::ConfigError;
use crate::sbus::SbusMode;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Logic analyzer line carrying S.BUS (0-7)
    pub data_channel: u8,

    /// Link speed, `auto` to detect it from the capture
    pub mode: SbusMode,

    /// Bit order of the per-byte annotations
    pub bit_order: BitOrder,

    /// Sample rate of the demo capture in Hz
    pub sample_rate: u32,

    /// Number of frames in the demo capture
    pub frame_count: usize,

    /// Frame interval of the demo capture in milliseconds
    pub frame_period_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; unset or unparsable numbers fall
    /// back to their defaults, unknown mode or bit order names are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            data_channel: lookup("SBUS_DATA_CHANNEL")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),

            mode: lookup("SBUS_MODE")
                .map(|s| s.parse::<SbusMode>())
                .transpose()?
                .unwrap_or_default(),

            bit_order: lookup("SBUS_BIT_ORDER")
                .map(|s| s.parse::<BitOrder>())
                .transpose()?
                .unwrap_or_default(),

            sample_rate: lookup("SBUS_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_000_000),

            frame_count: lookup("SBUS_FRAME_COUNT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),

            frame_period_ms: lookup("SBUS_FRAME_PERIOD_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(14),
        })
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            data_channel: self.data_channel,
            mode: self.mode,
            bit_order: self.bit_order,
        }
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_period_ms)
    }
}
