//! S.BUS test signal source
//!
//! Packs channel values into wire frames and renders them as the edge list a
//! logic analyzer would capture from a receiver's S.BUS output.

use std::time::Duration;

use crate::error::DecodeError;
use crate::sbus::layout::CHANNEL_MAX;
use crate::sbus::FRAME_LEN;
use crate::trace::{SampleStream, BITS_PER_BYTE, BIT_PERIOD};

/// Header byte as transmitted
pub const WIRE_HEADER: u8 = 0x0F;

/// Wire flag bits of byte 23
pub const WIRE_CH17: u8 = 0x01;
pub const WIRE_CH18: u8 = 0x02;
pub const WIRE_FRAME_LOST: u8 = 0x04;
pub const WIRE_FAILSAFE: u8 = 0x08;

/// Content of one frame as a transmitter sees it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SbusFrame {
    /// Proportional channels, 11 bits each
    pub channels: [u16; 16],
    /// Byte 23 as transmitted, see the `WIRE_*` constants
    pub flags: u8,
}

/// Pack `frame` into the 25 bytes sent on the wire.
/// Channels are packed LSB first, back to back, from byte 1 on.
pub fn encode_frame(frame: &SbusFrame) -> [u8; FRAME_LEN] {
    let mut bytes = [0u8; FRAME_LEN];
    bytes[0] = WIRE_HEADER;

    for (index, &value) in frame.channels.iter().enumerate() {
        let value = value & CHANNEL_MAX;
        for bit in 0..11 {
            if value >> bit & 1 != 0 {
                let pos = index * 11 + bit;
                bytes[1 + pos / 8] |= 1 << (pos % 8);
            }
        }
    }

    bytes[23] = frame.flags;
    bytes
}

/// Wire bytes as the framer collects them (each byte mirrored)
pub fn to_collected(wire: &[u8; FRAME_LEN]) -> [u8; FRAME_LEN] {
    wire.map(u8::reverse_bits)
}

/// Logic levels of one byte as sent: start, 8 data bits LSB first, even
/// parity, two stop bits. `true` is a high UART level.
fn uart_bits(byte: u8) -> [bool; BITS_PER_BYTE] {
    let mut bits = [true; BITS_PER_BYTE];
    bits[0] = false;
    for i in 0..8 {
        bits[1 + i] = byte >> i & 1 != 0;
    }
    bits[9] = byte.count_ones() % 2 != 0;
    bits
}

/// Renders wire frames as a captured edge list
#[derive(Debug, Clone)]
pub struct TraceSynth {
    sample_rate: u32,
    mask: u32,
    frame_period: Duration,
}

impl TraceSynth {
    pub fn new(sample_rate: u32, data_channel: u8, frame_period: Duration) -> Result<Self, DecodeError> {
        if data_channel > 7 {
            return Err(DecodeError::InvalidDataChannel(data_channel));
        }
        Ok(Self {
            sample_rate,
            mask: 1 << data_channel,
            frame_period,
        })
    }

    /// Capture of `frames` sent one per frame period.
    ///
    /// The line idles low from tick 0, frame `k` starts at `(k + 1)` periods and
    /// one idle sample closes the capture a period after the last frame start.
    /// Only level changes are stored.
    pub fn synthesize(&self, frames: &[[u8; FRAME_LEN]]) -> SampleStream {
        let rate = self.sample_rate as f64;
        let period = self.frame_period.as_secs_f64();
        let tick = |seconds: f64| (seconds * rate).round() as u64;

        let mut levels = vec![0];
        let mut times = vec![0];
        let mut high = false;

        for (k, frame) in frames.iter().enumerate() {
            let start = (k + 1) as f64 * period;
            for (n, &byte) in frame.iter().enumerate() {
                for (b, &bit) in uart_bits(byte).iter().enumerate() {
                    // the S.BUS line is inverted
                    let line = !bit;
                    if line != high {
                        let position = (n * BITS_PER_BYTE + b) as f64;
                        levels.push(if line { self.mask } else { 0 });
                        times.push(tick(start + position * BIT_PERIOD));
                        high = line;
                    }
                }
            }
            // stop bits end low, the line stays idle until the next frame
        }

        levels.push(0);
        times.push(tick((frames.len() + 1) as f64 * period));

        SampleStream::from_parts(levels, times, self.sample_rate)
    }
}
