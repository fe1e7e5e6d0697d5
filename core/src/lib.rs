//! Binary FSK audio modem for short text messages over an analog channel
//!
//! Text is framed by two fixed 32-bit markers and rendered as a
//! phase-continuous two-tone signal of signed 8-bit samples. The streaming
//! decoder accumulates incoming samples in a ring buffer and periodically
//! searches them for a complete frame by correlating against reference tones.

pub mod clock;
pub mod config;
pub mod correlation;
pub mod decoder;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod framing;
pub mod pcm;
pub mod ring_buffer;
pub mod sink;

use std::time::Duration;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ModemConfig;
pub use decoder::{DecoderStats, StreamingDecoder};
pub use detector::{DecodedFrame, Detection, FrameDetector};
pub use encoder::BfskEncoder;
pub use error::{ModemError, Result};
pub use framing::{TextFilter, END_OF_DATA_MARKER, MARKER_BITS, START_OF_DATA_MARKER};
pub use ring_buffer::RingBuffer;
pub use sink::{ChannelSink, MessageQueue, MessageSink};

// Timing
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;
pub const DEFAULT_BAUD_RATE: u32 = 1200;
pub const MAX_BAUD_RATE: u32 = 1200;

// Tones: one and two full cycles per bit at the default rates
pub const DEFAULT_FREQ_ZERO: f64 = 1200.0; // Hz
pub const DEFAULT_FREQ_ONE: f64 = 2400.0; // Hz
pub const TONE_AMPLITUDE: f64 = 127.0;

// Detection
pub const DEFAULT_BUFFER_CAPACITY: usize = DEFAULT_SAMPLE_RATE as usize * 10; // 10 s
pub const DEFAULT_MARKER_THRESHOLD: f64 = 2000.0;
pub const DEFAULT_PARSE_INTERVAL: Duration = Duration::from_millis(1000);
/// Coarse search step is `samples_per_bit / STRIDE_DIVISOR`
pub const STRIDE_DIVISOR: usize = 20;

// Transmit padding
pub const DEFAULT_LEAD_IN: Duration = Duration::from_millis(300);
pub const DEFAULT_TAIL: Duration = Duration::from_millis(700);
