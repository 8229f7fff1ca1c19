//! S.BUS frame decoder
//!
//! Turns the 25 bytes collected by the framer into 16 proportional channels,
//! 2 digital channels and the frame-lost / failsafe flags.
//!
//! The channel layout follows the mbed FutabaSBUS library by digixx.

use std::fmt;
use tracing::{debug, trace};

use super::layout::{
    extract_channel, reverse11, ANALOG_CHANNELS, CHANNEL_MAX, END_BYTE, FLAGS_BYTE, FLAG_CH17,
    FLAG_CH18, FLAG_FAILSAFE, FLAG_FRAME_LOST, FRAME_LEN, START_BYTE,
};
use super::types::{DecodedFrame, Failsafe, FrameCounters};
use crate::error::DecodeError;

/// Result of decoding one frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Channels decoded
    Good,
    /// Channels decoded, but the receiver flagged the frame as lost
    Lost,
    /// Bad header or footer, channels left untouched
    Rejected,
}

/// Per-session frame decoder
///
/// Counters accumulate across frames until [`FrameDecoder::reset`].
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    frame: DecodedFrame,
    counters: FrameCounters,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one collected frame buffer.
    ///
    /// Fails only if `bytes` is not exactly 25 bytes long.
    pub fn process(&mut self, bytes: &[u8]) -> Result<FrameStatus, DecodeError> {
        let bytes: &[u8; FRAME_LEN] = bytes
            .try_into()
            .map_err(|_| DecodeError::InvalidFrameLength(bytes.len()))?;

        if bytes[0] != START_BYTE || bytes[FRAME_LEN - 1] != END_BYTE {
            // out of sync
            self.counters.decoder_error_frames += 1;
            debug!(
                "Rejected frame #{}: header=0x{:02X} footer=0x{:02X} hex={}",
                self.counters.decoder_error_frames,
                bytes[0],
                bytes[FRAME_LEN - 1],
                hex::encode(bytes)
            );
            return Ok(FrameStatus::Rejected);
        }
        self.counters.good_frames += 1;

        self.frame = decode_frame(bytes);

        let lost = bytes[FLAGS_BYTE] & FLAG_FRAME_LOST != 0;
        if lost {
            self.counters.lost_frames += 1;
        }

        trace!("Decoded frame: {}", self);

        Ok(if lost {
            FrameStatus::Lost
        } else {
            FrameStatus::Good
        })
    }

    /// Latest valid frame
    pub fn frame(&self) -> &DecodedFrame {
        &self.frame
    }

    pub fn counters(&self) -> FrameCounters {
        self.counters
    }

    /// Value of channel `channel` (1-based) from the latest valid frame
    pub fn channel(&self, channel: usize) -> Option<u16> {
        self.frame.channel(channel)
    }

    pub fn normalized_channel(&self, channel: usize) -> Option<i32> {
        self.frame.normalized_channel(channel)
    }

    pub fn failsafe(&self) -> Failsafe {
        self.frame.failsafe
    }

    /// Lost plus rejected frames in percent of all frames, `None` before the first frame
    pub fn frame_loss_percent(&self) -> Option<u64> {
        self.counters.frame_loss_percent()
    }

    /// Forget channel state and counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for FrameDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channels={:?} failsafe={}, good_frames={}, lost_frames={}, decoder_error_frames={}",
            self.frame.channels,
            self.frame.failsafe,
            self.counters.good_frames,
            self.counters.lost_frames,
            self.counters.decoder_error_frames
        )
    }
}

/// Channel values and failsafe state of a frame with a valid header and footer
pub fn decode_frame(bytes: &[u8; FRAME_LEN]) -> DecodedFrame {
    let mut frame = DecodedFrame::default();

    // LSB is received first
    for (index, channel) in frame.channels[..ANALOG_CHANNELS].iter_mut().enumerate() {
        *channel = reverse11(extract_channel(bytes, index));
    }

    let flags = bytes[FLAGS_BYTE];
    frame.channels[16] = if flags & FLAG_CH17 != 0 { CHANNEL_MAX } else { 0 };
    frame.channels[17] = if flags & FLAG_CH18 != 0 { CHANNEL_MAX } else { 0 };

    frame.failsafe = if flags & FLAG_FAILSAFE != 0 {
        Failsafe::Active
    } else {
        Failsafe::Inactive
    };

    frame
}
