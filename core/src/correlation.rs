//! Reference tones and the correlation primitive used by the detector
//!
//! Correlation is a raw dot product between a window of received samples and
//! a precomputed sine table. It is not normalized by window energy, so the
//! received amplitude moves both the scores and their distance from the fixed
//! marker threshold.

use crate::config::ModemConfig;
use std::f64::consts::PI;

/// Build one bit period of a unit sine at `freq`, starting at phase 0
pub fn reference_table(sample_rate: u32, freq: f64, len: usize) -> Vec<f64> {
    let period = sample_rate as f64 / freq;
    (0..len)
        .map(|i| (2.0 * PI * i as f64 / period).sin())
        .collect()
}

/// Dot product of `samples[from..to]` with the start of `table`.
///
/// `to` is clamped to the end of `samples` and `from` to `to`, so a window
/// running past the available audio just gets shorter.
pub fn correlate(samples: &[i8], table: &[f64], from: usize, to: usize) -> f64 {
    let to = to.min(samples.len());
    let from = from.min(to);
    samples[from..to]
        .iter()
        .zip(table)
        .map(|(&sample, &reference)| f64::from(sample) * reference)
        .sum()
}

/// Scores of one bit window against both tones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitScore {
    pub zero: f64,
    pub one: f64,
}

impl BitScore {
    /// Hard decision: 1 only when the one-tone strictly wins
    pub fn bit(&self) -> u8 {
        if self.one > self.zero {
            1
        } else {
            0
        }
    }

    /// Marker acceptance rule.
    ///
    /// Rejects when both scores are below `threshold`, or when the stronger
    /// tone disagrees with `expected`.
    pub fn matches(&self, expected: u8, threshold: f64) -> bool {
        if self.zero < threshold && self.one < threshold {
            return false;
        }
        match expected {
            0 => self.one <= self.zero,
            _ => self.zero <= self.one,
        }
    }

    pub fn strongest(&self) -> f64 {
        self.zero.max(self.one)
    }
}

/// Precomputed reference tables for the two tone frequencies
#[derive(Debug, Clone)]
pub struct ToneTables {
    zero: Vec<f64>,
    one: Vec<f64>,
    samples_per_bit: usize,
}

impl ToneTables {
    pub fn new(sample_rate: u32, freq_zero: f64, freq_one: f64, samples_per_bit: usize) -> Self {
        Self {
            zero: reference_table(sample_rate, freq_zero, samples_per_bit),
            one: reference_table(sample_rate, freq_one, samples_per_bit),
            samples_per_bit,
        }
    }

    pub fn from_config(config: &ModemConfig) -> Self {
        Self::new(
            config.sample_rate,
            config.freq_zero,
            config.freq_one,
            config.samples_per_bit(),
        )
    }

    pub fn samples_per_bit(&self) -> usize {
        self.samples_per_bit
    }

    /// Table for the tone that carries `bit`
    pub fn table(&self, bit: u8) -> &[f64] {
        if bit == 0 {
            &self.zero
        } else {
            &self.one
        }
    }

    /// Correlate the one-bit window starting at `from` against `bit`'s tone
    pub fn correlate_bit(&self, samples: &[i8], bit: u8, from: usize) -> f64 {
        correlate(samples, self.table(bit), from, from + self.samples_per_bit)
    }

    /// Score the one-bit window starting at `from` against both tones
    pub fn score(&self, samples: &[i8], from: usize) -> BitScore {
        BitScore {
            zero: self.correlate_bit(samples, 0, from),
            one: self.correlate_bit(samples, 1, from),
        }
    }
}
