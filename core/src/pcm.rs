//! Sample format conversion at the boundary with audio I/O
//!
//! The modem itself works on signed 8-bit mono. Recordings and sound cards
//! usually speak 16-bit integers or `f32`, often in stereo and at another
//! rate; these helpers bridge the two.

use crate::error::{ModemError, Result};

/// 16-bit sample to signed 8-bit by dropping the low byte
pub fn i16_to_i8(sample: i16) -> i8 {
    (sample >> 8) as i8
}

pub fn i8_to_i16(sample: i8) -> i16 {
    i16::from(sample) << 8
}

/// `[-1.0, 1.0]` float to signed 8-bit, clamping anything outside
pub fn f32_to_i8(sample: f32) -> i8 {
    (sample.clamp(-1.0, 1.0) * 127.0).round() as i8
}

pub fn i8_to_f32(sample: i8) -> f32 {
    (f32::from(sample) / 127.0).clamp(-1.0, 1.0)
}

/// Mix interleaved stereo `[L, R, L, R, ...]` down to mono by averaging
pub fn stereo_to_mono(samples: &[f32]) -> Result<Vec<f32>> {
    if samples.len() % 2 != 0 {
        return Err(ModemError::InvalidInputSize);
    }
    Ok(samples
        .chunks_exact(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect())
}

/// Resample with linear interpolation
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(ModemError::UnsupportedFormat(format!(
            "cannot resample {} Hz to {} Hz",
            from_rate, to_rate
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let new_length =
        (samples.len() as u64 * u64::from(to_rate)).div_ceil(u64::from(from_rate)) as usize;
    let last = samples.len() - 1;

    let resampled = (0..new_length)
        .map(|i| {
            let src = i as f64 / ratio;
            let floor = (src.floor() as usize).min(last);
            let fraction = (src - floor as f64) as f32;
            if floor < last {
                samples[floor] * (1.0 - fraction) + samples[floor + 1] * fraction
            } else {
                samples[last]
            }
        })
        .collect();
    Ok(resampled)
}
