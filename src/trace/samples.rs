//! Captured logic samples
//!
//! A logic analyzer stores one sample per level change: the state of all input
//! lines as a bitmask plus the tick at which that state began.

use crate::error::DecodeError;

/// Parallel level/timestamp arrays of a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleStream {
    levels: Vec<u32>,
    timestamps: Vec<u64>,
    /// Ticks per second
    sample_rate: u32,
}

/// One inferred bit of the resampled stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSample {
    pub bit: bool,
    /// Tick at which the bit period starts
    pub timestamp: u64,
}

impl SampleStream {
    /// Build a stream, checking that both arrays line up and time moves forward
    pub fn new(levels: Vec<u32>, timestamps: Vec<u64>, sample_rate: u32) -> Result<Self, DecodeError> {
        if levels.len() != timestamps.len() {
            return Err(DecodeError::LengthMismatch {
                levels: levels.len(),
                timestamps: timestamps.len(),
            });
        }

        if let Some(index) = timestamps
            .windows(2)
            .position(|pair| pair[1] <= pair[0])
        {
            return Err(DecodeError::NonMonotonicTimestamp { index: index + 1 });
        }

        Ok(Self::from_parts(levels, timestamps, sample_rate))
    }

    /// Build a stream the caller already knows to be well formed
    pub(crate) fn from_parts(levels: Vec<u32>, timestamps: Vec<u64>, sample_rate: u32) -> Self {
        debug_assert_eq!(levels.len(), timestamps.len());
        Self {
            levels,
            timestamps,
            sample_rate,
        }
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Read sample `index` as a single bit of the line selected by `mask`
    pub fn bit_at(&self, index: usize, mask: u32) -> Option<BitSample> {
        let level = *self.levels.get(index)?;
        Some(BitSample {
            bit: level & mask != 0,
            timestamp: self.timestamps[index],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_length_mismatch() {
        let result = SampleStream::new(vec![0, 1], vec![0], 1_000_000);
        assert_eq!(
            result,
            Err(DecodeError::LengthMismatch {
                levels: 2,
                timestamps: 1
            })
        );
    }

    #[test]
    fn test_new_rejects_non_increasing_timestamps() {
        let result = SampleStream::new(vec![0, 1, 0], vec![0, 10, 10], 1_000_000);
        assert_eq!(result, Err(DecodeError::NonMonotonicTimestamp { index: 2 }));
    }

    #[test]
    fn test_bit_at() {
        let stream = SampleStream::new(vec![0b10, 0b01], vec![5, 15], 1_000_000).unwrap();
        assert_eq!(
            stream.bit_at(0, 0b10),
            Some(BitSample {
                bit: true,
                timestamp: 5
            })
        );
        assert_eq!(stream.bit_at(1, 0b10).map(|b| b.bit), Some(false));
        assert_eq!(stream.bit_at(2, 0b10), None);
    }
}
