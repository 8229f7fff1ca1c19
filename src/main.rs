//! S.BUS Decode - loopback demo
//!
//! Synthesizes a receiver capture, decodes it on a blocking worker and logs
//! the annotations as they arrive.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sbus_decode::synth::{encode_frame, SbusFrame, TraceSynth, WIRE_CH17, WIRE_FRAME_LOST};
use sbus_decode::{Config, DecodeEvent, FrameDecoder, SbusAnalyzer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(
                    "sbus_decode=info"
                        .parse::<tracing_subscriber::filter::Directive>()
                        .context("Invalid log directive")?,
                ),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!("===========================================");
    info!("   S.BUS Decode - logic trace analyzer");
    info!("===========================================");

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;

    info!("Configuration:");
    info!("  Data channel: {}", config.data_channel);
    info!("  Mode: {}", config.mode);
    info!("  Bit order: {}", config.bit_order);
    info!("  Sample rate: {} Hz", config.sample_rate);
    info!("  Frames: {} every {} ms", config.frame_count, config.frame_period_ms);

    // Sweep channel 1, flag every tenth frame as lost
    let frames: Vec<[u8; 25]> = (0..config.frame_count)
        .map(|i| {
            let mut frame = SbusFrame {
                channels: [992; 16],
                flags: WIRE_CH17,
            };
            frame.channels[0] = (172 + (i * 1639) / config.frame_count.max(1)) as u16;
            if i % 10 == 9 {
                frame.flags |= WIRE_FRAME_LOST;
            }
            encode_frame(&frame)
        })
        .collect();

    let stream = TraceSynth::new(config.sample_rate, config.data_channel, config.frame_period())?
        .synthesize(&frames);
    info!("Synthesized capture: {} samples", stream.len());

    // Decode events flow from the worker to this task
    let (event_tx, event_rx) = crossbeam_channel::bounded::<DecodeEvent>(1024);
    let progress = Arc::new(AtomicU8::new(0));

    let analyzer = SbusAnalyzer::new(config.analyzer_config());
    let worker_progress = progress.clone();
    let handle = tokio::task::spawn_blocking(move || {
        let mut decoder = FrameDecoder::new();
        let report = analyzer.run(
            &stream,
            &mut decoder,
            |percent| worker_progress.store(percent, Ordering::Relaxed),
            |event| {
                // receiver gone, nothing left to report to
                let _ = event_tx.send(event);
            },
        );
        report.map(|report| (report, decoder))
    });

    let mut bytes = 0u64;
    let mut last_progress_report = Instant::now();

    loop {
        match event_rx.recv_timeout(Duration::from_millis(500)) {
            Ok(DecodeEvent::ChannelLabel { channel, label }) => {
                info!("Channel {}: {}", channel, label);
            }
            Ok(DecodeEvent::Byte {
                frame_index,
                byte_index,
                start_time,
                text,
                ..
            }) => {
                bytes += 1;
                debug!(
                    "frame {} byte {:2} @{}: {}",
                    frame_index, byte_index, start_time, text
                );
            }
            Ok(DecodeEvent::Frame {
                kind,
                sample_index,
                status,
                ..
            }) => {
                info!("[{}] @{} {}", kind, sample_index, status);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                // No event, fall through to the progress report
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Decode worker finished");
                break;
            }
        }

        if last_progress_report.elapsed() >= Duration::from_millis(500) {
            info!("Progress: {}%", progress.load(Ordering::Relaxed));
            last_progress_report = Instant::now();
        }
    }

    let (report, decoder) = handle
        .await
        .context("Decode worker panicked")?
        .context("Decode failed")?;

    info!("Mode: {}", report.mode);
    info!(
        "Frames: {} decoded, {} abandoned, {} bytes",
        report.frames, report.abandoned_frames, bytes
    );
    info!(
        "Counters: good={}, lost={}, errors={}",
        report.counters.good_frames, report.counters.lost_frames, report.counters.decoder_error_frames
    );
    match decoder.frame_loss_percent() {
        Some(loss) if loss > 0 => warn!("Frame loss: {}%", loss),
        Some(loss) => info!("Frame loss: {}%", loss),
        None => warn!("No frames found in the capture"),
    }
    info!(
        "Last frame: ch1={:?} ch17={:?} failsafe={}",
        decoder.channel(1),
        decoder.channel(17),
        decoder.failsafe()
    );

    info!("Shutdown complete.");
    Ok(())
}
