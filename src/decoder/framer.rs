//! Byte and frame assembly
//!
//! Walks a resampled stream one bit at a time. Bits are only collected while
//! the next sample is at most one bit period away; a longer step is an idle gap
//! and drops whatever byte or frame was in progress.

use tracing::{debug, trace};

use super::events::{format_value, DecodeEvent, FrameKind};
use crate::bits::{percentage, BitOrder};
use crate::error::DecodeError;
use crate::sbus::{FrameDecoder, FRAME_LEN};
use crate::trace::{BitResampler, SampleStream, BITS_PER_BYTE};

/// Framer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramerStats {
    /// Complete 12-bit windows
    pub bytes: u64,
    /// Complete 25-byte frames handed to the decoder
    pub frames: u64,
    /// Partial frames dropped on an idle gap
    pub abandoned_frames: u64,
}

/// Assembles 8E2 bytes into frames and feeds them to a [`FrameDecoder`]
pub struct Framer {
    channel: u8,
    mask: u32,
    /// Largest sample spacing still treated as the next bit
    step: u64,
    bit_order: BitOrder,
    pub stats: FramerStats,
}

impl Framer {
    /// Framer for the output of `resampler` on line `channel`
    pub fn new(resampler: &BitResampler, channel: u8, bit_order: BitOrder) -> Self {
        Self {
            channel,
            mask: resampler.mask(),
            step: resampler.step(),
            bit_order,
            stats: FramerStats::default(),
        }
    }

    /// Decode every frame in `stream`.
    ///
    /// `annotate` receives one event per byte and one per completed frame,
    /// `progress` the position in percent after every step.
    pub fn run<P, A>(
        &mut self,
        stream: &SampleStream,
        decoder: &mut FrameDecoder,
        mut progress: P,
        mut annotate: A,
    ) -> Result<FramerStats, DecodeError>
    where
        P: FnMut(u8),
        A: FnMut(DecodeEvent),
    {
        let times = stream.timestamps();
        let end = stream.len().saturating_sub(1);

        let mut buffer: Vec<u8> = Vec::with_capacity(FRAME_LEN);
        let mut raw = 0u32;
        let mut bit_count = 0;
        let mut byte_start = 0;
        let mut frame_index = 1;
        let mut last_loss = 0;
        let mut last_progress = None;

        let mut idx = 0;
        while idx < end {
            if times[idx + 1] - times[idx] <= self.step {
                if bit_count == 0 {
                    byte_start = idx;
                }
                // MSB first: start bit lands in bit 11, last stop bit in bit 0
                if stream.bit_at(idx, self.mask).map_or(false, |s| s.bit) {
                    raw |= 1 << (BITS_PER_BYTE - 1 - bit_count);
                }
                bit_count += 1;
                idx += 1;

                if bit_count == BITS_PER_BYTE {
                    let data = ((raw >> 3) & 0xFF) as u8;
                    let value = self.bit_order.convert(raw, BITS_PER_BYTE as u32);
                    annotate(DecodeEvent::Byte {
                        channel: self.channel,
                        frame_index,
                        byte_index: buffer.len(),
                        start_index: byte_start,
                        end_index: idx,
                        start_time: times[byte_start],
                        end_time: times[idx],
                        raw: value as u16,
                        data,
                        text: format_value(value),
                    });
                    buffer.push(data);
                    self.stats.bytes += 1;
                    raw = 0;
                    bit_count = 0;

                    if buffer.len() == FRAME_LEN {
                        frame_index += 1;
                        self.stats.frames += 1;
                        decoder.process(&buffer)?;

                        let loss = decoder.frame_loss_percent().unwrap_or(0);
                        let kind = if loss == last_loss {
                            FrameKind::FrameDecoded
                        } else {
                            FrameKind::FrameLost
                        };
                        annotate(DecodeEvent::Frame {
                            channel: self.channel,
                            kind,
                            sample_index: idx,
                            status: decoder.to_string(),
                        });
                        last_loss = loss;
                        buffer.clear();
                    }
                }
            } else {
                if bit_count > 0 || !buffer.is_empty() {
                    self.stats.abandoned_frames += 1;
                    trace!(
                        "Gap at sample {}: dropped {} bytes and {} bits of frame {}",
                        idx,
                        buffer.len(),
                        bit_count,
                        frame_index
                    );
                }
                buffer.clear();
                raw = 0;
                bit_count = 0;
                idx += 1;
            }

            let percent = percentage(idx, 0, end);
            progress(percent);
            last_progress = Some(percent);
        }

        if last_progress != Some(100) {
            progress(100);
        }

        debug!(
            "Framer done: {} bytes, {} frames, {} abandoned",
            self.stats.bytes, self.stats.frames, self.stats.abandoned_frames
        );

        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::reverse_bits;
    use crate::sbus::FrameCounters;
    use crate::synth::{encode_frame, to_collected, SbusFrame};

    const RATE: u32 = 1_000_000;
    const STEP: u64 = 10;

    /// Resampled stream for line 0 holding the given collected byte runs,
    /// each run followed by a trailing sample and an idle gap
    fn resampled(runs: &[Vec<u8>]) -> SampleStream {
        let mut levels = Vec::new();
        let mut times = Vec::new();
        let mut now = 0;
        for run in runs {
            now += 20_000;
            for &byte in run {
                // start 0, data, parity 0, two stop bits
                let raw = (byte as u32) << 3 | 0b011;
                for p in (0..12).rev() {
                    levels.push((raw >> p) & 1);
                    times.push(now);
                    now += STEP;
                }
            }
            levels.push(1);
            times.push(now);
        }
        SampleStream::new(levels, times, RATE).unwrap()
    }

    fn collected(frame: &SbusFrame) -> Vec<u8> {
        to_collected(&encode_frame(frame)).to_vec()
    }

    fn run(runs: &[Vec<u8>], bit_order: BitOrder) -> (Vec<DecodeEvent>, FramerStats, FrameDecoder) {
        let resampler = BitResampler::new(RATE, 0).unwrap();
        let mut framer = Framer::new(&resampler, 0, bit_order);
        let mut decoder = FrameDecoder::new();
        let mut events = Vec::new();
        let stats = framer
            .run(&resampled(runs), &mut decoder, |_| {}, |e| events.push(e))
            .unwrap();
        (events, stats, decoder)
    }

    fn frame_kinds(events: &[DecodeEvent]) -> Vec<FrameKind> {
        events
            .iter()
            .filter_map(|e| match e {
                DecodeEvent::Frame { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_single_frame() {
        let mut frame = SbusFrame::default();
        frame.channels[0] = 1000;
        let (events, stats, decoder) = run(&[collected(&frame)], BitOrder::MsbFirst);

        assert_eq!(events.len(), 26);
        assert_eq!(
            stats,
            FramerStats {
                bytes: 25,
                frames: 1,
                abandoned_frames: 0
            }
        );
        assert_eq!(decoder.channel(1), Some(1000));

        match &events[0] {
            DecodeEvent::Byte {
                frame_index,
                byte_index,
                start_index,
                end_index,
                start_time,
                end_time,
                raw,
                data,
                text,
                ..
            } => {
                assert_eq!(*frame_index, 1);
                assert_eq!(*byte_index, 0);
                assert_eq!((*start_index, *end_index), (0, 12));
                assert_eq!(*start_time, 20_000);
                assert_eq!(*end_time, 20_000 + 12 * STEP);
                assert_eq!(*raw, 0x783);
                assert_eq!(*data, 0xF0);
                // U+0783 is a Thaana letter
                assert_eq!(text, "0x783 (\u{783})");
            }
            other => panic!("unexpected event {:?}", other),
        }

        for (i, event) in events[..25].iter().enumerate() {
            match event {
                DecodeEvent::Byte { byte_index, .. } => assert_eq!(*byte_index, i),
                other => panic!("unexpected event {:?}", other),
            }
        }

        match &events[25] {
            DecodeEvent::Frame {
                kind,
                sample_index,
                status,
                ..
            } => {
                assert_eq!(*kind, FrameKind::FrameDecoded);
                assert_eq!(*sample_index, 300);
                assert_eq!(status, &decoder.to_string());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_lsb_first_payload() {
        let (events, _, _) = run(&[collected(&SbusFrame::default())], BitOrder::LsbFirst);
        match &events[0] {
            DecodeEvent::Byte { raw, data, text, .. } => {
                assert_eq!(*raw as u32, reverse_bits(0x783, 12));
                assert_eq!(*raw, 0xC1E);
                // the frame buffer is not affected by the display order
                assert_eq!(*data, 0xF0);
                // U+0C1E is a Telugu letter
                assert_eq!(text, "0xC1E (\u{C1E})");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_gap_abandons_partial_frame() {
        let good = collected(&SbusFrame::default());
        let partial = good[..10].to_vec();
        let (events, stats, decoder) = run(&[partial, good], BitOrder::MsbFirst);

        assert_eq!(stats.abandoned_frames, 1);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.bytes, 35);
        assert_eq!(decoder.counters().good_frames, 1);
        assert_eq!(decoder.counters().decoder_error_frames, 0);

        // the next frame starts over at byte 0 of frame 1
        match &events[10] {
            DecodeEvent::Byte {
                frame_index,
                byte_index,
                data,
                ..
            } => {
                assert_eq!(*frame_index, 1);
                assert_eq!(*byte_index, 0);
                assert_eq!(*data, 0xF0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_frame_tags_follow_loss_percentage() {
        let good = collected(&SbusFrame::default());
        let mut bad = good.clone();
        bad[0] = 0x0F;
        let (events, stats, decoder) = run(
            &[good.clone(), good.clone(), bad, good],
            BitOrder::MsbFirst,
        );

        assert_eq!(stats.frames, 4);
        // 0%, 0%, 33%, 25%
        assert_eq!(
            frame_kinds(&events),
            vec![
                FrameKind::FrameDecoded,
                FrameKind::FrameDecoded,
                FrameKind::FrameLost,
                FrameKind::FrameLost
            ]
        );
        assert_eq!(
            decoder.counters(),
            FrameCounters {
                good_frames: 3,
                lost_frames: 0,
                decoder_error_frames: 1
            }
        );
    }

    #[test]
    fn test_frame_index_counts_frames() {
        let good = collected(&SbusFrame::default());
        let (events, _, _) = run(&[good.clone(), good.clone(), good], BitOrder::MsbFirst);
        let last_index = events.iter().rev().find_map(|e| match e {
            DecodeEvent::Byte { frame_index, .. } => Some(*frame_index),
            _ => None,
        });
        assert_eq!(last_index, Some(3));
    }

    #[test]
    fn test_progress_is_monotonic() {
        let good = collected(&SbusFrame::default());
        let stream = resampled(&[good.clone(), good]);
        let resampler = BitResampler::new(RATE, 0).unwrap();
        let mut framer = Framer::new(&resampler, 0, BitOrder::MsbFirst);
        let mut decoder = FrameDecoder::new();
        let mut seen = Vec::new();
        framer
            .run(&stream, &mut decoder, |p| seen.push(p), |_| {})
            .unwrap();

        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&100));
    }

    #[test]
    fn test_empty_stream() {
        let resampler = BitResampler::new(RATE, 0).unwrap();
        let mut framer = Framer::new(&resampler, 0, BitOrder::MsbFirst);
        let mut decoder = FrameDecoder::new();
        let mut seen = Vec::new();
        let stream = SampleStream::new(Vec::new(), Vec::new(), RATE).unwrap();
        let stats = framer
            .run(&stream, &mut decoder, |p| seen.push(p), |_| {})
            .unwrap();

        assert_eq!(stats, FramerStats::default());
        assert_eq!(seen, vec![100]);
    }
}
