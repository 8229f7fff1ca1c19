//! S.BUS speed detection
//!
//! A low speed link sends a frame every 14 ms, a high speed link every 7 ms.
//! Between frames the line idles, so the idle gap that occurs most often tells
//! the two apart.

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Duration;
use tracing::{debug, warn};

use super::samples::SampleStream;
use super::{BITS_PER_FRAME, BIT_PERIOD};
use crate::sbus::{SbusMode, HIGH_SPEED_PERIOD, LOW_SPEED_PERIOD};

/// Classify the link speed from the idle gaps within `range` of `stream`.
///
/// Never returns [`SbusMode::Autodetect`]. When the most frequent gap is as far
/// from 14 ms as from 7 ms, or when there is no gap at all, the result is
/// [`SbusMode::HighSpeed`].
pub fn detect_mode(stream: &SampleStream, range: Range<usize>) -> SbusMode {
    let times = stream.timestamps();
    let end = range.end.min(times.len());
    let min_gap = BIT_PERIOD * BITS_PER_FRAME as f64;
    let sample_rate = stream.sample_rate() as f64;

    // tally in ticks, equal gaps must compare equal
    let mut histogram: BTreeMap<u64, usize> = BTreeMap::new();
    for i in range.start..end.saturating_sub(1) {
        let ticks = times[i + 1] - times[i];
        if ticks as f64 / sample_rate > min_gap {
            *histogram.entry(ticks).or_insert(0) += 1;
        }
    }

    // most frequent gap, the shortest one on equal counts
    let dominant = histogram
        .iter()
        .fold(None, |best: Option<(u64, usize)>, (&ticks, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((ticks, count)),
        });

    let Some((ticks, count)) = dominant else {
        warn!("No inter-frame gaps found, assuming {}", SbusMode::HighSpeed);
        return SbusMode::HighSpeed;
    };

    // |ticks / rate - period| scaled by rate * 1e9, exact in integers
    let distance = |period: Duration| {
        (ticks as i128 * 1_000_000_000 - period.as_nanos() as i128 * stream.sample_rate() as i128).abs()
    };
    let mode = if distance(LOW_SPEED_PERIOD) < distance(HIGH_SPEED_PERIOD) {
        SbusMode::LowSpeed
    } else {
        SbusMode::HighSpeed
    };

    debug!(
        "Dominant gap {:.3} ms ({} of {} gaps) -> {}",
        ticks as f64 / sample_rate * 1e3,
        count,
        histogram.values().sum::<usize>(),
        mode
    );

    mode
}
