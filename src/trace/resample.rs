//! Bit resampling
//!
//! The capture only holds a sample per level change. S.BUS has no clock line,
//! so bit boundaries are recovered from the time between edges: an edge that
//! holds its level for n bit periods becomes n unit-bit samples. Frames are
//! located by the idle gap in front of them, which is longer than a whole frame.
//!
//! Output timestamps lie on a uniform grid starting at each frame's first edge,
//! so jitter on the input edges does not leak into the framer.

use tracing::{debug, trace};

use super::samples::SampleStream;
use super::{BITS_PER_FRAME, BIT_PERIOD};
use crate::error::DecodeError;

/// Converts an edge list into one sample per bit period
#[derive(Debug, Clone)]
pub struct BitResampler {
    /// Exact ticks per bit, may be fractional
    ticks_per_bit: f64,
    /// Whole ticks between output samples
    step: u64,
    mask: u32,
}

impl BitResampler {
    pub fn new(sample_rate: u32, data_channel: u8) -> Result<Self, DecodeError> {
        if data_channel > 7 {
            return Err(DecodeError::InvalidDataChannel(data_channel));
        }
        let ticks_per_bit = sample_rate as f64 * BIT_PERIOD;
        Ok(Self {
            ticks_per_bit,
            // truncated, so the grid never outruns the real bit clock
            step: (ticks_per_bit as u64).max(1),
            mask: 1 << data_channel,
        })
    }

    /// Tick distance between consecutive bits of the output
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Expand every frame of `stream` into exactly 300 unit-bit samples plus one
    /// trailing end-of-frame sample.
    ///
    /// Output levels are logic-level corrected and masked to the data line, so a
    /// sample is either 0 or the channel mask.
    pub fn resample(&self, stream: &SampleStream) -> SampleStream {
        let levels = stream.levels();
        let times = stream.timestamps();
        let n = levels.len();
        let frame_ticks = self.ticks_per_bit * BITS_PER_FRAME as f64;
        let gap = |idx: usize| (times[idx] - times[idx - 1]) as f64;

        let mut out_levels = Vec::new();
        let mut out_times = Vec::new();
        let mut frames = 0usize;
        let mut padded_frames = 0usize;

        // Find first start of frame
        let mut idx = 1;
        while idx < n && gap(idx) < frame_ticks {
            idx += 1;
        }

        while idx < n {
            if gap(idx) <= frame_ticks {
                idx += 1;
                continue;
            }

            // sample idx is the first edge of a frame
            let frame_start = times[idx];
            idx += 1;
            if idx >= n {
                // a lone edge at the end of the capture carries no frame
                break;
            }

            let mut bits = 0;
            while idx < n && bits < BITS_PER_FRAME && gap(idx) <= frame_ticks {
                // round() absorbs edges that land slightly off the bit grid,
                // min() clips the last stop bits of the last byte
                let n_bits = ((gap(idx) / self.ticks_per_bit).round() as usize)
                    .min(BITS_PER_FRAME - bits);
                self.push_run(&mut out_levels, &mut out_times, levels[idx - 1], frame_start, bits, n_bits);
                bits += n_bits;
                idx += 1;
            }

            if bits < BITS_PER_FRAME {
                // The last edge runs into the idle gap (or the end of the capture),
                // its level holds for the rest of the frame
                let remaining = BITS_PER_FRAME - bits;
                if remaining > 2 {
                    padded_frames += 1;
                    trace!("Frame at tick {} padded with {} bits", frame_start, remaining);
                }
                self.push_run(&mut out_levels, &mut out_times, levels[idx - 1], frame_start, bits, remaining);
            }

            // artificial end transition after the last frame bit
            out_levels.push(self.mask);
            out_times.push(frame_start + BITS_PER_FRAME as u64 * self.step);
            frames += 1;
        }

        debug!(
            "Resampled {} samples into {} bit samples ({} frames, {} padded)",
            n,
            out_levels.len(),
            frames,
            padded_frames
        );

        SampleStream::from_parts(out_levels, out_times, stream.sample_rate())
    }

    fn push_run(
        &self,
        levels: &mut Vec<u32>,
        times: &mut Vec<u64>,
        level: u32,
        frame_start: u64,
        first_bit: usize,
        count: usize,
    ) {
        // the line is active low
        let value = (level ^ 0xFF) & self.mask;
        for bit in first_bit..first_bit + count {
            levels.push(value);
            times.push(frame_start + bit as u64 * self.step);
        }
    }
}
