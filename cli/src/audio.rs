//! Reading and writing audio files as signed 8-bit mono

use crate::CliError;
use hound::{SampleFormat, WavSpec};
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tonewire_core::pcm::{f32_to_i8, i16_to_i8, i8_to_f32, i8_to_i16, resample, stereo_to_mono};
use tonewire_core::Clock;
use tracing::{debug, info};

/// Write samples as a 16-bit PCM mono WAV
pub fn write_wav(path: &Path, samples: &[i8], sample_rate: u32) -> Result<(), CliError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let file = File::create(path)?;
    let mut writer = hound::WavWriter::new(file, spec)?;
    for &sample in samples {
        writer.write_sample(i8_to_i16(sample))?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read a WAV file and bring it to mono at `sample_rate`.
///
/// 16-bit mono at the right rate is narrowed sample by sample; everything
/// else goes through `f32`.
pub fn read_wav(path: &Path, sample_rate: u32) -> Result<Vec<i8>, CliError> {
    let file = File::open(path)?;
    let mut reader = hound::WavReader::new(file)?;
    let spec = reader.spec();
    info!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    if spec.channels > 2 {
        return Err(CliError::UnsupportedWav(format!(
            "{} channels",
            spec.channels
        )));
    }

    if spec.sample_format == SampleFormat::Int
        && spec.bits_per_sample == 16
        && spec.channels == 1
        && spec.sample_rate == sample_rate
    {
        let samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
        return Ok(samples?.into_iter().map(i16_to_i8).collect());
    }

    let floats: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8) => {
            let samples: Result<Vec<i8>, _> = reader.samples::<i8>().collect();
            samples?.into_iter().map(i8_to_f32).collect()
        }
        (SampleFormat::Int, 16) => {
            let samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
            samples?.into_iter().map(|s| f32::from(s) / 32768.0).collect()
        }
        (SampleFormat::Float, 32) => {
            let samples: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
            samples?
        }
        (format, bits) => {
            return Err(CliError::UnsupportedWav(format!(
                "{} bit {:?} samples",
                bits, format
            )));
        }
    };

    let mono = if spec.channels == 2 {
        debug!("Mixing stereo down to mono");
        stereo_to_mono(&floats)?
    } else {
        floats
    };
    let resampled = if spec.sample_rate != sample_rate {
        info!("Resampling {} Hz -> {} Hz", spec.sample_rate, sample_rate);
        resample(&mono, spec.sample_rate, sample_rate)?
    } else {
        mono
    };

    Ok(resampled.into_iter().map(f32_to_i8).collect())
}

/// Raw signed 8-bit mono, one byte per sample
pub fn read_raw(path: &Path) -> Result<Vec<i8>, CliError> {
    Ok(std::fs::read(path)?.into_iter().map(|b| b as i8).collect())
}

pub fn write_raw(path: &Path, samples: &[i8]) -> Result<(), CliError> {
    let bytes: Vec<u8> = samples.iter().map(|&s| s as u8).collect();
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Clock that reads the position in a recording being replayed
pub struct AudioClock {
    samples: AtomicU64,
    sample_rate: u32,
}

impl AudioClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: AtomicU64::new(0),
            sample_rate,
        }
    }

    pub fn advance(&self, samples: usize) {
        self.samples.fetch_add(samples as u64, Ordering::SeqCst);
    }
}

impl Clock for AudioClock {
    fn now(&self) -> Duration {
        let samples = self.samples.load(Ordering::SeqCst);
        Duration::from_secs_f64(samples as f64 / f64::from(self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_clock_follows_samples() {
        let clock = AudioClock::new(48000);
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(24000);
        assert_eq!(clock.now(), Duration::from_millis(500));
        clock.advance(48000);
        assert_eq!(clock.now(), Duration::from_millis(1500));
    }

    #[test]
    fn test_wav_round_trip_is_exact() {
        let path = std::env::temp_dir().join(format!("tonewire-audio-{}.wav", std::process::id()));
        let samples: Vec<i8> = (-128..=127).collect();
        write_wav(&path, &samples, 48000).unwrap();
        assert_eq!(read_wav(&path, 48000).unwrap(), samples);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_raw_round_trip() {
        let path = std::env::temp_dir().join(format!("tonewire-audio-{}.raw", std::process::id()));
        let samples = vec![0i8, 1, -1, 127, -128];
        write_raw(&path, &samples).unwrap();
        assert_eq!(read_raw(&path).unwrap(), samples);
        std::fs::remove_file(&path).ok();
    }
}
