//! Annotations produced while decoding a trace

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome tag of a completed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// The frame loss percentage did not change
    FrameDecoded,
    /// The frame was lost or rejected
    FrameLost,
}

impl FrameKind {
    pub fn label(self) -> &'static str {
        match self {
            FrameKind::FrameDecoded => "FRAME DECODED",
            FrameKind::FrameLost => "FRAME LOST",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Event emitted to the annotation sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecodeEvent {
    /// Names the analyzed line, sent once at the start of a run
    ChannelLabel { channel: u8, label: String },

    /// One 12-bit byte window
    Byte {
        channel: u8,
        /// 1-based index of the frame being collected
        frame_index: usize,
        /// Position within the frame, 0..=24
        byte_index: usize,
        /// First sample of the window in the resampled stream
        start_index: usize,
        /// Sample following the last bit of the window
        end_index: usize,
        start_time: u64,
        end_time: u64,
        /// Start, data, parity and stop bits after bit-order conversion
        raw: u16,
        /// Data bits as handed to the frame decoder
        data: u8,
        /// Display form of `raw`
        text: String,
    },

    /// A complete frame went through the frame decoder
    Frame {
        channel: u8,
        kind: FrameKind,
        /// Sample following the last bit of the frame
        sample_index: usize,
        /// Decoder state after the frame
        status: String,
    },
}

/// Hexadecimal form of `value`, followed by the character in parentheses when
/// the value is a letter or digit
pub fn format_value(value: u32) -> String {
    match char::from_u32(value).filter(|c| c.is_alphanumeric()) {
        Some(c) => format!("0x{:X} ({})", value, c),
        None => format!("0x{:X}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0x41), "0x41 (A)");
        assert_eq!(format_value(0x37), "0x37 (7)");
        assert_eq!(format_value(0x20), "0x20");
        assert_eq!(format_value(0x0), "0x0");
        assert_eq!(format_value(0x2D), "0x2D");
        // surrogate range has no char
        assert_eq!(format_value(0xD800), "0xD800");
    }

    #[test]
    fn test_frame_kind_labels() {
        assert_eq!(FrameKind::FrameDecoded.to_string(), "FRAME DECODED");
        assert_eq!(FrameKind::FrameLost.to_string(), "FRAME LOST");
    }

    #[test]
    fn test_byte_event_json() {
        let event = DecodeEvent::Byte {
            channel: 0,
            frame_index: 1,
            byte_index: 0,
            start_index: 0,
            end_index: 12,
            start_time: 14_000,
            end_time: 14_120,
            raw: 0x783,
            data: 0xF0,
            text: format_value(0x783),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "byte");
        assert_eq!(value["frame_index"], 1);
        assert_eq!(value["end_time"], 14_120);
        assert_eq!(value["raw"], 0x783);
        assert_eq!(value["data"], 0xF0);
        assert_eq!(value["text"], "0x783 (\u{783})");

        let back: DecodeEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_frame_event_json() {
        let event = DecodeEvent::Frame {
            channel: 2,
            kind: FrameKind::FrameLost,
            sample_index: 300,
            status: "good_frames=1".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"frame","channel":2,"kind":"frame_lost","sample_index":300,"status":"good_frames=1"}"#
        );

        let back: DecodeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_channel_label_json() {
        let event = DecodeEvent::ChannelLabel {
            channel: 0,
            label: "DATA".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"channel_label","channel":0,"label":"DATA"}"#
        );
    }
}
