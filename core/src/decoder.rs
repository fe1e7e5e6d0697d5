//! Streaming BFSK decoder
//!
//! Audio is appended to a ring buffer on every `feed_audio_data` call. A
//! detection pass over a snapshot of the buffer runs at most once per
//! `parse_interval`, and never while another pass is still running.

use crate::clock::{Clock, SystemClock};
use crate::config::ModemConfig;
use crate::detector::{Detection, FrameDetector};
use crate::error::Result;
use crate::ring_buffer::RingBuffer;
use crate::sink::MessageSink;
use log::{debug, trace};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Counters describing what the decoder has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Detection passes started
    pub attempts: u64,
    /// Feeds that found another pass in flight
    pub skipped_busy: u64,
    /// Feeds that arrived within `parse_interval` of the last pass
    pub skipped_rate_limited: u64,
    /// Non-empty messages delivered to the sink
    pub frames_decoded: u64,
    pub bytes_fed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU64,
    skipped_busy: AtomicU64,
    skipped_rate_limited: AtomicU64,
    frames_decoded: AtomicU64,
    bytes_fed: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DecoderStats {
        DecoderStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            skipped_busy: self.skipped_busy.load(Ordering::Relaxed),
            skipped_rate_limited: self.skipped_rate_limited.load(Ordering::Relaxed),
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            bytes_fed: self.bytes_fed.load(Ordering::Relaxed),
        }
    }
}

/// Single-flight and debounce state for detection passes
#[derive(Debug, Default)]
struct GateState {
    in_flight: bool,
    /// Clock reading when the last pass started
    last_attempt: Option<Duration>,
}

/// Clears `in_flight` when a pass ends, however it ends
struct PassGuard<'a> {
    gate: &'a Mutex<GateState>,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        lock(self.gate).in_flight = false;
    }
}

/// Decoder fed with a continuous stream of signed 8-bit samples.
///
/// All methods take `&self`; share it between capture threads with `Arc`.
pub struct StreamingDecoder<S: MessageSink, C: Clock = SystemClock> {
    detector: FrameDetector,
    buffer: Mutex<RingBuffer>,
    gate: Mutex<GateState>,
    parse_interval: Duration,
    clock: C,
    sink: S,
    counters: Counters,
}

impl<S: MessageSink> StreamingDecoder<S, SystemClock> {
    pub fn new(config: ModemConfig, sink: S) -> Result<Self> {
        Self::with_clock(config, sink, SystemClock::new())
    }
}

impl<S: MessageSink, C: Clock> StreamingDecoder<S, C> {
    pub fn with_clock(config: ModemConfig, sink: S, clock: C) -> Result<Self> {
        let detector = FrameDetector::new(&config)?;
        let buffer = RingBuffer::new(config.buffer_capacity)?;
        debug!(
            "Streaming decoder: {} samples/bit, {} sample buffer, {:?} interval",
            detector.samples_per_bit(),
            config.buffer_capacity,
            config.parse_interval
        );
        Ok(Self {
            detector,
            buffer: Mutex::new(buffer),
            gate: Mutex::new(GateState::default()),
            parse_interval: config.parse_interval,
            clock,
            sink,
            counters: Counters::default(),
        })
    }

    /// Append a chunk of audio and, when the gate allows it, run a detection
    /// pass over everything buffered.
    ///
    /// Never waits for a pass started by another caller. Returns whether this
    /// call delivered a message.
    pub fn feed_audio_data(&self, chunk: &[i8]) -> bool {
        lock(&self.buffer).write(chunk);
        self.counters
            .bytes_fed
            .fetch_add(chunk.len() as u64, Ordering::Relaxed);

        match self.begin_pass(true) {
            Some(guard) => self.run_pass(guard),
            None => false,
        }
    }

    /// Run a pass right away, ignoring the rate limit but not a pass already
    /// in flight. Returns whether a message was delivered.
    pub fn decode_now(&self) -> bool {
        match self.begin_pass(false) {
            Some(guard) => self.run_pass(guard),
            None => false,
        }
    }

    pub fn stats(&self) -> DecoderStats {
        self.counters.snapshot()
    }

    /// Samples currently held in the ring buffer
    pub fn buffered_len(&self) -> usize {
        lock(&self.buffer).len()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn begin_pass(&self, rate_limited: bool) -> Option<PassGuard<'_>> {
        let now = self.clock.now();
        let mut gate = lock(&self.gate);

        if gate.in_flight {
            trace!("Pass skipped: another pass in flight");
            Counters::bump(&self.counters.skipped_busy);
            return None;
        }
        if rate_limited {
            if let Some(last) = gate.last_attempt {
                if now.saturating_sub(last) < self.parse_interval {
                    trace!("Pass skipped: last one started {:?} ago", now.saturating_sub(last));
                    Counters::bump(&self.counters.skipped_rate_limited);
                    return None;
                }
            }
        }

        gate.in_flight = true;
        gate.last_attempt = Some(now);
        Counters::bump(&self.counters.attempts);
        Some(PassGuard { gate: &self.gate })
    }

    fn run_pass(&self, _guard: PassGuard<'_>) -> bool {
        let snapshot = lock(&self.buffer).peek_all();

        let frame = match self.detector.detect(&snapshot) {
            Detection::Frame(frame) => frame,
            Detection::NoStartMarker | Detection::NoEndMarker { .. } => return false,
        };
        if frame.text.is_empty() {
            trace!("Frame at {} decoded to empty text", frame.start);
            return false;
        }

        debug!("Delivering {} byte message", frame.text.len());
        self.sink.on_message(frame.text);
        Counters::bump(&self.counters.frames_decoded);
        lock(&self.buffer).reset();
        true
    }
}

/// Lock that survives a panic in another holder; the guarded state is valid
/// between every statement that touches it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
