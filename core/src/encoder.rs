use crate::config::ModemConfig;
use crate::error::Result;
use crate::framing::{bytes_to_bits, END_OF_DATA_MARKER, START_OF_DATA_MARKER};
use crate::TONE_AMPLITUDE;
use std::f64::consts::{PI, TAU};
use std::time::Duration;

/// Binary FSK tone encoder
///
/// Renders `START_OF_DATA_MARKER`, the payload bits (MSB first) and
/// `END_OF_DATA_MARKER` as signed 8-bit PCM, one `samples_per_bit` tone per
/// bit. The carrier phase runs on across bit boundaries so consecutive tones
/// join without a step in amplitude.
///
/// Holds only read-only configuration; `encode` takes `&self` and can be
/// called from several threads at once.
#[derive(Debug, Clone)]
pub struct BfskEncoder {
    config: ModemConfig,
    samples_per_bit: usize,
}

impl BfskEncoder {
    pub fn new(config: ModemConfig) -> Result<Self> {
        config.validate()?;
        let samples_per_bit = config.samples_per_bit();
        Ok(Self {
            config,
            samples_per_bit,
        })
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    pub fn samples_per_bit(&self) -> usize {
        self.samples_per_bit
    }

    /// Encode the UTF-8 bytes of `text` into one frame
    pub fn encode(&self, text: &str) -> Vec<i8> {
        self.encode_bytes(text.as_bytes())
    }

    /// Encode raw payload bytes into one frame.
    ///
    /// An empty payload still produces both markers.
    pub fn encode_bytes(&self, payload: &[u8]) -> Vec<i8> {
        let mut samples = Vec::with_capacity(self.config.frame_len(payload.len()));
        let mut synth = ToneSynth::new(&self.config);

        for &bit in START_OF_DATA_MARKER.iter() {
            synth.push_bit(bit, &mut samples);
        }
        for bit in bytes_to_bits(payload) {
            synth.push_bit(bit, &mut samples);
        }
        for &bit in END_OF_DATA_MARKER.iter() {
            synth.push_bit(bit, &mut samples);
        }

        samples
    }

    /// Encode `text` with silence before and after the frame, giving a keyed
    /// transmitter time to settle
    pub fn encode_padded(&self, text: &str, lead_in: Duration, tail: Duration) -> Vec<i8> {
        let lead_in = self.config.samples_for(lead_in);
        let tail = self.config.samples_for(tail);

        let mut samples = vec![0i8; lead_in];
        samples.extend(self.encode(text));
        samples.resize(samples.len() + tail, 0);
        samples
    }
}

/// Phase-continuous tone generator
struct ToneSynth {
    sample_rate: f64,
    samples_per_bit: usize,
    freq_zero: f64,
    freq_one: f64,
    phase: f64,
}

impl ToneSynth {
    fn new(config: &ModemConfig) -> Self {
        Self {
            sample_rate: config.sample_rate as f64,
            samples_per_bit: config.samples_per_bit(),
            freq_zero: config.freq_zero,
            freq_one: config.freq_one,
            phase: 0.0,
        }
    }

    fn push_bit(&mut self, bit: u8, out: &mut Vec<i8>) {
        let freq = if bit == 0 { self.freq_zero } else { self.freq_one };
        for i in 0..self.samples_per_bit {
            let t = i as f64 / self.sample_rate;
            let value = (2.0 * PI * freq * t + self.phase).sin() * TONE_AMPLITUDE;
            out.push(value.round() as i8);
        }
        let advance = 2.0 * PI * freq * (self.samples_per_bit as f64 / self.sample_rate);
        self.phase = (self.phase + advance).rem_euclid(TAU);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::MARKER_BITS;

    fn encoder() -> BfskEncoder {
        BfskEncoder::new(ModemConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(BfskEncoder::new(ModemConfig::default().with_baud_rate(0)).is_err());
    }

    #[test]
    fn test_frame_length_for_hi() {
        let samples = encoder().encode("HI");
        assert_eq!(samples.len(), (32 + 16 + 32) * 40);
        assert_eq!(samples.len(), 3200);
    }

    #[test]
    fn test_empty_payload_is_markers_only() {
        let samples = encoder().encode("");
        assert_eq!(samples.len(), 2 * MARKER_BITS * 40);
    }

    #[test]
    fn test_multibyte_payload_length_counts_bytes() {
        let text = "héllo ✓";
        let samples = encoder().encode(text);
        assert_eq!(samples.len(), (64 + 8 * text.len()) * 40);
    }

    #[test]
    fn test_samples_stay_within_amplitude() {
        let samples = encoder().encode("Amplitude check");
        let peak = samples.iter().map(|&s| (s as i16).abs()).max().unwrap();
        assert_eq!(peak, 127);
        assert!(samples.iter().all(|&s| s >= -127));
    }

    #[test]
    fn test_first_bit_is_one_tone() {
        // Start marker opens with a 1 bit: 2400 Hz, two cycles in 40 samples.
        let samples = encoder().encode("x");
        assert_eq!(samples[0], 0);
        assert_eq!(samples[5], 127);
        assert_eq!(samples[15], -127);
        assert_eq!(samples[25], 127);
        assert_eq!(samples[35], -127);
    }

    #[test]
    fn test_phase_continuity_at_bit_edges() {
        // Non-integer cycles per bit so the phase actually carries over.
        let config = ModemConfig::default().with_tones(1300.0, 2100.0);
        let encoder = BfskEncoder::new(config.clone()).unwrap();
        let samples = encoder.encode("phase");
        let spb = config.samples_per_bit();

        // Largest step between neighbouring samples inside any tone.
        let max_in_tone = 2.0 * PI * 2100.0 / 48000.0 * 127.0 + 1.0;
        for boundary in (spb..samples.len()).step_by(spb) {
            let step = (samples[boundary] as f64 - samples[boundary - 1] as f64).abs();
            assert!(
                step <= max_in_tone,
                "jump of {} at sample {} exceeds {}",
                step,
                boundary,
                max_in_tone
            );
        }
    }

    #[test]
    fn test_encode_padded_adds_silence() {
        let encoder = encoder();
        let frame = encoder.encode("pad");
        let padded =
            encoder.encode_padded("pad", Duration::from_millis(300), Duration::from_millis(700));
        assert_eq!(padded.len(), 14400 + frame.len() + 33600);
        assert!(padded[..14400].iter().all(|&s| s == 0));
        assert_eq!(&padded[14400..14400 + frame.len()], &frame[..]);
        assert!(padded[14400 + frame.len()..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = encoder().encode("Deterministic test");
        let b = encoder().encode("Deterministic test");
        assert_eq!(a, b);
    }
}
