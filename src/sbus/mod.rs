//! S.BUS frame layout and decoding
//!
//! A frame is 25 bytes sent as 8E2 at 100 kbit/s on an inverted line:
//! header, 22 bytes holding 16 channels of 11 bits, a flag byte, footer.

mod decoder;
pub mod layout;
mod types;

pub use decoder::{decode_frame, FrameDecoder, FrameStatus};
pub use layout::FRAME_LEN;
pub use types::{
    DecodedFrame, Failsafe, FrameCounters, SbusMode, HIGH_SPEED_PERIOD, LOW_SPEED_PERIOD,
};
