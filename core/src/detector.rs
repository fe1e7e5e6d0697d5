use crate::config::ModemConfig;
use crate::correlation::ToneTables;
use crate::error::Result;
use crate::framing::{pack_bits, TextFilter, END_OF_DATA_MARKER, MARKER_BITS, START_OF_DATA_MARKER};
use log::{debug, trace};

/// A frame found in a block of samples
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// First sample of the phase-locked start marker
    pub start: usize,
    /// First sample of the payload
    pub data_start: usize,
    /// First sample of the end marker
    pub data_end: usize,
    /// One past the last sample of the end marker
    pub end: usize,
    pub bits: Vec<u8>,
    pub bytes: Vec<u8>,
    pub text: String,
}

/// Outcome of one detection pass
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    NoStartMarker,
    /// Start marker locked at `start`, end marker not (yet) present
    NoEndMarker { start: usize },
    Frame(DecodedFrame),
}

/// One-shot frame detector over a block of samples
///
/// Searches for the start marker on a coarse grid, refines the bit phase on
/// the marker's last bit, then steps one bit at a time to the end marker and
/// demodulates everything in between. Every window is clamped to the block,
/// so any input, however short or noisy, ends in a `Detection` rather than a
/// panic.
#[derive(Debug, Clone)]
pub struct FrameDetector {
    tables: ToneTables,
    samples_per_bit: usize,
    stride: usize,
    threshold: f64,
    text_filter: TextFilter,
}

impl FrameDetector {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tables: ToneTables::from_config(config),
            samples_per_bit: config.samples_per_bit(),
            stride: config.search_stride(),
            threshold: config.marker_threshold,
            text_filter: config.text_filter,
        })
    }

    pub fn samples_per_bit(&self) -> usize {
        self.samples_per_bit
    }

    fn marker_span(&self) -> usize {
        MARKER_BITS * self.samples_per_bit
    }

    /// Run a full pass: start marker, end marker, demodulation
    pub fn detect(&self, samples: &[i8]) -> Detection {
        let Some(data_start) = self.find_start_of_data(samples) else {
            return Detection::NoStartMarker;
        };
        let start = data_start.saturating_sub(self.marker_span());

        let Some(data_end) = self.find_end_of_data(samples, data_start) else {
            trace!("Start marker at {} but no end marker yet", start);
            return Detection::NoEndMarker { start };
        };

        let bits = self.demodulate(samples, data_start, data_end);
        let bytes = pack_bits(&bits);
        let text = self.text_filter.apply(&bytes);
        debug!(
            "Frame {}..{}: {} bits, {} bytes",
            start,
            data_end + self.marker_span(),
            bits.len(),
            bytes.len()
        );

        Detection::Frame(DecodedFrame {
            start,
            data_start,
            data_end,
            end: data_end + self.marker_span(),
            bits,
            bytes,
            text,
        })
    }

    /// Locate the start marker and return the sample index where the payload
    /// begins, phase-locked to the bit grid
    pub fn find_start_of_data(&self, samples: &[i8]) -> Option<usize> {
        let span = self.marker_span();
        if samples.len() < span {
            return None;
        }

        let candidate = (0..=samples.len() - span)
            .step_by(self.stride)
            .find(|&offset| self.marker_matches(samples, offset, &START_OF_DATA_MARKER))?;

        let last_bit = self.lock_last_marker_bit(samples, candidate);
        let data_start = last_bit + self.samples_per_bit;
        debug!(
            "Start marker candidate at {}, phase-locked payload start at {}",
            candidate, data_start
        );
        Some(data_start)
    }

    /// Refine the alignment of the start marker's final bit.
    ///
    /// Tries every sample offset in `[last - stride, last + samples_per_bit / 2)`
    /// and keeps the earliest one with the highest correlation for that bit's
    /// tone. The window stops short of the following bit.
    fn lock_last_marker_bit(&self, samples: &[i8], candidate: usize) -> usize {
        let expected = START_OF_DATA_MARKER[MARKER_BITS - 1];
        let last = candidate + (MARKER_BITS - 1) * self.samples_per_bit;
        let from = last.saturating_sub(self.stride);
        let to = last + self.samples_per_bit / 2;

        let mut best_offset = last;
        let mut best_score = f64::NEG_INFINITY;
        for offset in from..to {
            let score = self.tables.correlate_bit(samples, expected, offset);
            if score > best_score {
                best_score = score;
                best_offset = offset;
            }
        }

        trace!(
            "Last start-marker bit moved {} -> {} (correlation {:.1})",
            last,
            best_offset,
            best_score
        );
        best_offset
    }

    /// Step bit by bit from `data_start` until the end marker matches.
    ///
    /// Returns the index of the end marker's first sample.
    pub fn find_end_of_data(&self, samples: &[i8], data_start: usize) -> Option<usize> {
        let span = self.marker_span();
        let mut offset = data_start;
        while offset + span <= samples.len() {
            if self.marker_matches(samples, offset, &END_OF_DATA_MARKER) {
                debug!("End marker at {}", offset);
                return Some(offset);
            }
            offset += self.samples_per_bit;
        }
        None
    }

    /// Hard-decide every bit in `[data_start, data_end)`.
    ///
    /// No threshold here: the markers around the payload already vouched for
    /// the signal.
    pub fn demodulate(&self, samples: &[i8], data_start: usize, data_end: usize) -> Vec<u8> {
        let count = data_end.saturating_sub(data_start) / self.samples_per_bit;
        (0..count)
            .map(|i| {
                let from = data_start + i * self.samples_per_bit;
                let score = self.tables.score(samples, from);
                if score.strongest() < self.threshold {
                    trace!(
                        "Weak payload bit {} at {} (best {:.1})",
                        i,
                        from,
                        score.strongest()
                    );
                }
                score.bit()
            })
            .collect()
    }

    fn marker_matches(&self, samples: &[i8], offset: usize, marker: &[u8]) -> bool {
        marker.iter().enumerate().all(|(j, &expected)| {
            let from = offset + j * self.samples_per_bit;
            self.tables
                .score(samples, from)
                .matches(expected, self.threshold)
        })
    }
}
