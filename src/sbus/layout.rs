//! S.BUS frame layout
//!
//! Byte values here are as the framer collects them: each data byte arrives
//! LSB first, so the framer's MSB-first accumulation leaves it bit-mirrored.
//! The real header 0x0F is therefore seen as 0xF0 and the flag bits of byte 23
//! appear from the top down.

use crate::bits::reverse_bits;

/// Bytes in one frame
pub const FRAME_LEN: usize = 25;

/// Header byte as collected (0x0F on the wire)
pub const START_BYTE: u8 = 0xF0;

/// Footer byte as collected
pub const END_BYTE: u8 = 0x00;

/// Proportional channels packed into bytes 1..=22
pub const ANALOG_CHANNELS: usize = 16;

/// Proportional plus digital channels
pub const NUM_CHANNELS: usize = 18;

/// Full scale of an 11-bit channel
pub const CHANNEL_MAX: u16 = 0x07FF;

/// Index of the flag byte
pub const FLAGS_BYTE: usize = 23;

pub const FLAG_CH17: u8 = 0x80;
pub const FLAG_CH18: u8 = 0x40;
pub const FLAG_FRAME_LOST: u8 = 0x20;
pub const FLAG_FAILSAFE: u8 = 0x10;

/// Contribution of one source byte to a channel value.
/// A positive shift moves the byte left, a negative one right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitWindow {
    pub byte: usize,
    pub shift: i8,
}

const fn w(byte: usize, shift: i8) -> BitWindow {
    BitWindow { byte, shift }
}

/// Source windows of channels 1..=16; each channel spans two or three bytes.
/// Channels 9..=16 repeat the pattern of 1..=8 eleven bytes further on.
pub const CHANNEL_WINDOWS: [&[BitWindow]; ANALOG_CHANNELS] = [
    &[w(1, 3), w(2, -5)],
    &[w(2, 6), w(3, -2)],
    &[w(3, 9), w(4, 1), w(5, -7)],
    &[w(5, 4), w(6, -4)],
    &[w(6, 7), w(7, -1)],
    &[w(7, 10), w(8, 2), w(9, -6)],
    &[w(9, 5), w(10, -3)],
    &[w(10, 8), w(11, 0)],
    &[w(12, 3), w(13, -5)],
    &[w(13, 6), w(14, -2)],
    &[w(14, 9), w(15, 1), w(16, -7)],
    &[w(16, 4), w(17, -4)],
    &[w(17, 7), w(18, -1)],
    &[w(18, 10), w(19, 2), w(20, -6)],
    &[w(20, 5), w(21, -3)],
    &[w(21, 8), w(22, 0)],
];

/// Assemble the raw (still mirrored) 11-bit field of analog channel `index` (0-based)
pub fn extract_channel(bytes: &[u8; FRAME_LEN], index: usize) -> u16 {
    let raw = CHANNEL_WINDOWS[index]
        .iter()
        .fold(0u32, |acc, window| {
            let byte = bytes[window.byte] as u32;
            let part = if window.shift >= 0 {
                byte << window.shift
            } else {
                byte >> -window.shift
            };
            acc | part
        });
    (raw & CHANNEL_MAX as u32) as u16
}

/// Mirror an 11-bit channel value (bit 0 <-> bit 10)
#[inline]
pub fn reverse11(value: u16) -> u16 {
    reverse_bits(value as u32, 11) as u16
}
