//! Decode runner - drives one capture through the whole pipeline

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::events::DecodeEvent;
use super::framer::Framer;
use crate::bits::BitOrder;
use crate::error::DecodeError;
use crate::sbus::{DecodedFrame, FrameCounters, FrameDecoder, SbusMode};
use crate::trace::{detect_mode, BitResampler, SampleStream, MIN_SAMPLE_RATE};

/// Label attached to the analyzed line
pub const DATA_LABEL: &str = "DATA";

/// Analyzer settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Input line carrying S.BUS, 0..=7
    pub data_channel: u8,
    /// Link speed, or `Autodetect` to derive it from the capture
    pub mode: SbusMode,
    /// Presentation of the per-byte payload
    pub bit_order: BitOrder,
}

/// Summary of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Mode in effect, detected or configured
    pub mode: SbusMode,
    /// Frames handed to the decoder
    pub frames: u64,
    /// Partial frames dropped on an idle gap
    pub abandoned_frames: u64,
    /// Length of the resampled stream
    pub resampled_bits: usize,
    pub counters: FrameCounters,
    pub last_frame: DecodedFrame,
}

/// S.BUS analyzer for captured logic traces
pub struct SbusAnalyzer {
    config: AnalyzerConfig,
}

impl SbusAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Decode `stream` into `decoder`, reporting through the two sinks.
    ///
    /// Fails before emitting anything when the capture is sampled below
    /// 200 kHz or the data channel is out of range.
    pub fn run<P, A>(
        &self,
        stream: &SampleStream,
        decoder: &mut FrameDecoder,
        progress: P,
        mut annotate: A,
    ) -> Result<AnalysisReport, DecodeError>
    where
        P: FnMut(u8),
        A: FnMut(DecodeEvent),
    {
        if stream.sample_rate() < MIN_SAMPLE_RATE {
            return Err(DecodeError::SampleRateTooLow {
                sample_rate: stream.sample_rate(),
                minimum: MIN_SAMPLE_RATE,
            });
        }

        let channel = self.config.data_channel;
        let resampler = BitResampler::new(stream.sample_rate(), channel)?;
        debug!("datamask = 0x{:X}", resampler.mask());

        annotate(DecodeEvent::ChannelLabel {
            channel,
            label: DATA_LABEL.to_string(),
        });

        let mode = match self.config.mode {
            SbusMode::Autodetect => {
                info!("Detecting which S.BUS mode is most probably used...");
                let mode = detect_mode(stream, 0..stream.len());
                info!("Detected mode: {}", mode);
                mode
            }
            mode => mode,
        };

        let resampled = resampler.resample(stream);
        debug!(
            "Resampled {} samples at {} Hz into {} bits",
            stream.len(),
            stream.sample_rate(),
            resampled.len()
        );

        let mut framer = Framer::new(&resampler, channel, self.config.bit_order);
        let stats = framer.run(&resampled, decoder, progress, annotate)?;

        let counters = decoder.counters();
        info!(
            "Decoded {} frames ({} abandoned): good={}, lost={}, errors={}",
            stats.frames,
            stats.abandoned_frames,
            counters.good_frames,
            counters.lost_frames,
            counters.decoder_error_frames
        );

        Ok(AnalysisReport {
            mode,
            frames: stats.frames,
            abandoned_frames: stats.abandoned_frames,
            resampled_bits: resampled.len(),
            counters,
            last_frame: *decoder.frame(),
        })
    }

    /// Run with a fresh decoder and collect every event
    pub fn decode(&self, stream: &SampleStream) -> Result<(AnalysisReport, Vec<DecodeEvent>), DecodeError> {
        let mut decoder = FrameDecoder::new();
        let mut events = Vec::new();
        let report = self.run(stream, &mut decoder, |_| {}, |event| events.push(event))?;
        Ok((report, events))
    }
}
