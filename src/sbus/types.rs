//! S.BUS data types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::layout::NUM_CHANNELS;
use crate::error::ConfigError;

/// Frame interval of a low speed link
pub const LOW_SPEED_PERIOD: Duration = Duration::from_millis(14);

/// Frame interval of a high speed link
pub const HIGH_SPEED_PERIOD: Duration = Duration::from_millis(7);

/// Transmission speed of an S.BUS link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SbusMode {
    /// Determine the mode from the gaps between frames
    #[default]
    Autodetect,
    /// One frame every 14 ms
    LowSpeed,
    /// One frame every 7 ms
    HighSpeed,
}

impl SbusMode {
    pub fn label(self) -> &'static str {
        match self {
            SbusMode::Autodetect => "Unknown",
            SbusMode::LowSpeed => "Low Speed",
            SbusMode::HighSpeed => "High Speed",
        }
    }

    /// Nominal frame interval, if the mode is known
    pub fn frame_period(self) -> Option<Duration> {
        match self {
            SbusMode::Autodetect => None,
            SbusMode::LowSpeed => Some(LOW_SPEED_PERIOD),
            SbusMode::HighSpeed => Some(HIGH_SPEED_PERIOD),
        }
    }
}

impl fmt::Display for SbusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SbusMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "autodetect" => Ok(SbusMode::Autodetect),
            "low" | "low_speed" | "low-speed" => Ok(SbusMode::LowSpeed),
            "high" | "high_speed" | "high-speed" => Ok(SbusMode::HighSpeed),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// Failsafe state reported by the receiver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Failsafe {
    #[default]
    Inactive,
    Active,
}

impl fmt::Display for Failsafe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failsafe::Inactive => write!(f, "inactive"),
            Failsafe::Active => write!(f, "active"),
        }
    }
}

/// Running frame counters of one decode session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounters {
    /// Frames with valid header and footer
    pub good_frames: u64,
    /// Valid frames flagged as lost by the receiver
    pub lost_frames: u64,
    /// Frames rejected for a bad header or footer
    pub decoder_error_frames: u64,
}

impl FrameCounters {
    pub fn total(&self) -> u64 {
        self.good_frames + self.lost_frames + self.decoder_error_frames
    }

    /// Share of lost and rejected frames in percent, truncated.
    /// `None` until the first frame has been processed.
    pub fn frame_loss_percent(&self) -> Option<u64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some((self.lost_frames + self.decoder_error_frames) * 100 / total)
    }
}

/// Channel values and failsafe state of the latest valid frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedFrame {
    /// Channels 1..=18 at indices 0..=17, each 0..=2047
    pub channels: [u16; NUM_CHANNELS],
    pub failsafe: Failsafe,
}

impl DecodedFrame {
    /// Value of channel `channel` (1-based)
    pub fn channel(&self, channel: usize) -> Option<u16> {
        if channel == 0 {
            return None;
        }
        self.channels.get(channel - 1).copied()
    }

    /// Channel scaled to roughly -100..=106
    pub fn normalized_channel(&self, channel: usize) -> Option<i32> {
        self.channel(channel)
            .map(|value| (value as f64 / 9.92).round() as i32 - 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_loss_percent() {
        let counters = FrameCounters::default();
        assert_eq!(counters.frame_loss_percent(), None);

        let counters = FrameCounters {
            good_frames: 3,
            lost_frames: 1,
            decoder_error_frames: 2,
        };
        assert_eq!(counters.frame_loss_percent(), Some(50));

        // truncated, not rounded
        let counters = FrameCounters {
            good_frames: 2,
            lost_frames: 1,
            decoder_error_frames: 0,
        };
        assert_eq!(counters.frame_loss_percent(), Some(33));
    }

    #[test]
    fn test_frame_loss_grows_with_failures() {
        let mut counters = FrameCounters {
            good_frames: 10,
            ..Default::default()
        };
        let mut previous = counters.frame_loss_percent().unwrap();
        for i in 0..20 {
            if i % 2 == 0 {
                counters.lost_frames += 1;
            } else {
                counters.decoder_error_frames += 1;
            }
            let current = counters.frame_loss_percent().unwrap();
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_channel_accessors() {
        let mut frame = DecodedFrame::default();
        frame.channels[0] = 992;
        frame.channels[17] = 2047;

        assert_eq!(frame.channel(0), None);
        assert_eq!(frame.channel(1), Some(992));
        assert_eq!(frame.channel(18), Some(2047));
        assert_eq!(frame.channel(19), None);

        assert_eq!(frame.normalized_channel(1), Some(0));
        assert_eq!(frame.normalized_channel(2), Some(-100));
        assert_eq!(frame.normalized_channel(18), Some(106));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("auto".parse::<SbusMode>(), Ok(SbusMode::Autodetect));
        assert_eq!("Low-Speed".parse::<SbusMode>(), Ok(SbusMode::LowSpeed));
        assert_eq!("high".parse::<SbusMode>(), Ok(SbusMode::HighSpeed));
        assert_eq!(
            "fast".parse::<SbusMode>(),
            Err(ConfigError::UnknownMode("fast".to_string()))
        );
        assert_eq!(SbusMode::LowSpeed.to_string(), "Low Speed");
    }
}
