//! Construction-time modem configuration
//!
//! Encoder and decoder must be built from the same values to interoperate;
//! nothing here changes after construction.

use crate::correlation::reference_table;
use crate::error::{ModemError, Result};
use crate::framing::{TextFilter, MARKER_BITS};
use crate::{
    DEFAULT_BAUD_RATE, DEFAULT_BUFFER_CAPACITY, DEFAULT_FREQ_ONE, DEFAULT_FREQ_ZERO,
    DEFAULT_MARKER_THRESHOLD, DEFAULT_PARSE_INTERVAL, DEFAULT_SAMPLE_RATE, MAX_BAUD_RATE,
    STRIDE_DIVISOR, TONE_AMPLITUDE,
};
use log::warn;
use std::time::Duration;

/// Modem parameters shared by encoder and decoder.
///
/// Correlation scores are not normalized, so `marker_threshold` is tied to
/// `samples_per_bit`: a clean tone scores about `127 * samples_per_bit / 2`,
/// and `validate` rejects bit lengths too short to ever reach the threshold.
///
/// Tones should complete a whole number of cycles per bit. Otherwise the
/// score depends on the carrier phase at each bit boundary and markers may
/// never be found; `validate` only warns about this, and
/// [`ModemConfig::has_whole_cycle_tones`] reports it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ModemConfig {
    /// Samples per second of the signed 8-bit stream
    pub sample_rate: u32,
    /// Bits per second, at most `MAX_BAUD_RATE`
    pub baud_rate: u32,
    /// Tone frequency (Hz) carrying a 0 bit
    pub freq_zero: f64,
    /// Tone frequency (Hz) carrying a 1 bit
    pub freq_one: f64,
    /// Ring buffer capacity in samples (one byte each)
    pub buffer_capacity: usize,
    /// Minimum correlation a marker bit needs on at least one tone
    pub marker_threshold: f64,
    /// Minimum spacing between the starts of two decode passes
    #[cfg_attr(
        feature = "serde",
        serde(rename = "parse_interval_ms", with = "duration_ms")
    )]
    pub parse_interval: Duration,
    /// Coarse start-marker search step in samples; derived when `None`
    pub search_stride: Option<usize>,
    pub text_filter: TextFilter,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            baud_rate: DEFAULT_BAUD_RATE,
            freq_zero: DEFAULT_FREQ_ZERO,
            freq_one: DEFAULT_FREQ_ONE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            marker_threshold: DEFAULT_MARKER_THRESHOLD,
            parse_interval: DEFAULT_PARSE_INTERVAL,
            search_stride: None,
            text_filter: TextFilter::default(),
        }
    }
}

impl ModemConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_tones(mut self, freq_zero: f64, freq_one: f64) -> Self {
        self.freq_zero = freq_zero;
        self.freq_one = freq_one;
        self
    }

    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    pub fn with_marker_threshold(mut self, marker_threshold: f64) -> Self {
        self.marker_threshold = marker_threshold;
        self
    }

    pub fn with_parse_interval(mut self, parse_interval: Duration) -> Self {
        self.parse_interval = parse_interval;
        self
    }

    pub fn with_search_stride(mut self, search_stride: usize) -> Self {
        self.search_stride = Some(search_stride);
        self
    }

    pub fn with_text_filter(mut self, text_filter: TextFilter) -> Self {
        self.text_filter = text_filter;
        self
    }

    /// `round(sample_rate / baud_rate)`
    pub fn samples_per_bit(&self) -> usize {
        if self.baud_rate == 0 {
            return 0;
        }
        (self.sample_rate as f64 / self.baud_rate as f64).round() as usize
    }

    /// Coarse search step: the configured stride, or `samples_per_bit / 20`
    /// (at least 1)
    pub fn search_stride(&self) -> usize {
        self.search_stride
            .unwrap_or(self.samples_per_bit() / STRIDE_DIVISOR)
            .max(1)
    }

    /// Samples covered by one marker
    pub fn marker_span(&self) -> usize {
        MARKER_BITS * self.samples_per_bit()
    }

    /// Samples produced by `encode` for a payload of `payload_bytes` bytes
    pub fn frame_len(&self, payload_bytes: usize) -> usize {
        (2 * MARKER_BITS + 8 * payload_bytes) * self.samples_per_bit()
    }

    /// Number of samples spanning `duration` at this sample rate
    pub fn samples_for(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * self.sample_rate as f64).round() as usize
    }

    /// Correlation of a clean, phase-aligned bit of `freq` against its own
    /// reference table
    pub fn matched_score(&self, freq: f64) -> f64 {
        reference_table(self.sample_rate, freq, self.samples_per_bit())
            .iter()
            .map(|&r| (r * TONE_AMPLITUDE).round() * r)
            .sum()
    }

    /// True when both tones fit a whole number of cycles in one bit
    pub fn has_whole_cycle_tones(&self) -> bool {
        let samples_per_bit = self.samples_per_bit() as f64;
        [self.freq_zero, self.freq_one].iter().all(|&freq| {
            let cycles = freq * samples_per_bit / self.sample_rate as f64;
            (cycles - cycles.round()).abs() <= 1e-6
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate must be positive"));
        }
        if self.baud_rate == 0 || self.baud_rate > MAX_BAUD_RATE {
            return Err(invalid(format!(
                "baud_rate must be between 1 and {}, got {}",
                MAX_BAUD_RATE, self.baud_rate
            )));
        }

        let samples_per_bit = self.samples_per_bit();
        if samples_per_bit < 2 {
            return Err(invalid(format!(
                "{} Hz at {} baud leaves {} samples per bit",
                self.sample_rate, self.baud_rate, samples_per_bit
            )));
        }

        let nyquist = self.sample_rate as f64 / 2.0;
        for (name, freq) in [("freq_zero", self.freq_zero), ("freq_one", self.freq_one)] {
            if !freq.is_finite() || freq <= 0.0 || freq >= nyquist {
                return Err(invalid(format!(
                    "{} must be in (0, {}) Hz, got {}",
                    name, nyquist, freq
                )));
            }
        }
        if self.freq_zero == self.freq_one {
            return Err(invalid("freq_zero and freq_one must differ"));
        }

        if self.buffer_capacity < self.marker_span() {
            return Err(invalid(format!(
                "buffer_capacity {} cannot hold one marker ({} samples)",
                self.buffer_capacity,
                self.marker_span()
            )));
        }

        if !self.marker_threshold.is_finite() || self.marker_threshold < 0.0 {
            return Err(invalid(format!(
                "marker_threshold must be a non-negative number, got {}",
                self.marker_threshold
            )));
        }

        if let Some(stride) = self.search_stride {
            if stride == 0 || stride >= samples_per_bit {
                return Err(invalid(format!(
                    "search_stride must be in 1..{}, got {}",
                    samples_per_bit, stride
                )));
            }
        }

        for (name, freq) in [("freq_zero", self.freq_zero), ("freq_one", self.freq_one)] {
            let peak = self.matched_score(freq);
            if peak < self.marker_threshold {
                return Err(invalid(format!(
                    "marker_threshold {} is unreachable: {} = {} Hz peaks at {:.1} with {} samples_per_bit",
                    self.marker_threshold, name, freq, peak, samples_per_bit
                )));
            }
        }

        if !self.has_whole_cycle_tones() {
            warn!(
                "{} Hz / {} Hz do not fit whole cycles in {} samples per bit; correlation will depend on carrier phase",
                self.freq_zero, self.freq_one, samples_per_bit
            );
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ModemError {
    ModemError::InvalidConfig(message.into())
}

#[cfg(feature = "serde")]
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
