//! Statistical and spectral analysis functions

use std::ops::Range;

/// Arithmetic mean (0.0 for an empty slice)
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance, two-pass
pub fn variance(data: &[f64]) -> f64 {
    mean_variance(data).1
}

pub fn mean_variance(data: &[f64]) -> (f64, f64) {
    if data.is_empty() {
        return (0.0, 0.0);
    }
    let m = mean(data);
    let var = data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / data.len() as f64;
    (m, var)
}

/// Compute RMS (Root Mean Square)
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Compute peak amplitude
pub fn peak_amplitude(samples: &[f64]) -> f64 {
    samples.iter().map(|s| s.abs()).fold(0.0f64, f64::max)
}

/// Range of `samples` between the first and last sample within `top_db` of
/// the peak
///
/// Codec priming, encoder padding and silence around a recording all sit
/// below this level. An all-zero input yields an empty range.
pub fn trim_range(samples: &[f64], top_db: f64) -> Range<usize> {
    let peak = peak_amplitude(samples);
    if peak <= 0.0 {
        return 0..0;
    }
    let threshold = peak * 10f64.powf(-top_db / 20.0);
    let loud = |s: &f64| s.abs() >= threshold;

    match (samples.iter().position(loud), samples.iter().rposition(loud)) {
        (Some(start), Some(end)) => start..end + 1,
        _ => 0..0,
    }
}

/// Convert amplitude to dB (relative to 1.0)
pub fn amplitude_to_db(amplitude: f64) -> f64 {
    if amplitude > 1e-10 {
        20.0 * amplitude.log10()
    } else {
        -200.0
    }
}

/// Convert power to dB with a lower clamp of `amin`
pub fn power_to_db(power: f64, amin: f64) -> f64 {
    10.0 * power.max(amin).log10()
}

/// Zero-crossing rate
pub fn zero_crossing_rate(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let crossings: usize = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();

    crossings as f64 / (samples.len() - 1) as f64
}

/// Compute spectral centroid (brightness measure)
pub fn spectral_centroid(magnitudes: &[f64], frequencies: &[f64]) -> f64 {
    let total: f64 = magnitudes.iter().sum();
    if total < 1e-10 {
        return 0.0;
    }

    let weighted_sum: f64 = magnitudes
        .iter()
        .zip(frequencies)
        .map(|(&m, &f)| f * m)
        .sum();

    weighted_sum / total
}

/// Compute spectral rolloff (frequency below which X% of energy is contained)
pub fn spectral_rolloff(magnitudes: &[f64], frequencies: &[f64], percentile: f64) -> f64 {
    let total_energy: f64 = magnitudes.iter().map(|m| m * m).sum();
    if total_energy < 1e-20 {
        return 0.0;
    }
    let threshold = total_energy * percentile;

    let mut cumulative = 0.0f64;

    for (&mag, &freq) in magnitudes.iter().zip(frequencies) {
        cumulative += mag * mag;
        if cumulative >= threshold {
            return freq;
        }
    }

    frequencies.last().copied().unwrap_or(0.0)
}

/// Compute spectral contrast (peak vs valley level, dB) per band
///
/// Magnitudes are clamped to `floor` first, so the contrast of a band never
/// exceeds the dynamic range between the floor and the loudest bin.
pub fn spectral_contrast(
    magnitudes: &[f64],
    bands: &[Range<usize>],
    quantile: f64,
    floor: f64,
) -> Vec<f64> {
    bands
        .iter()
        .map(|band| {
            let end = band.end.min(magnitudes.len());
            let start = band.start.min(end);
            let band_mags = &magnitudes[start..end];

            if band_mags.is_empty() {
                return 0.0;
            }

            let mut sorted: Vec<f64> = band_mags.iter().map(|&m| m.max(floor)).collect();
            sorted.sort_by(|a, b| a.total_cmp(b));

            let n = sorted.len();
            let take = ((quantile * n as f64).round() as usize).clamp(1, n);

            let peaks = sorted[n - take..].iter().sum::<f64>() / take as f64;
            let valleys = sorted[..take].iter().sum::<f64>() / take as f64;

            amplitude_to_db(peaks) - amplitude_to_db(valleys)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_range() {
        let mut samples = vec![0.0, 0.001, 0.02];
        samples.extend([0.5, -0.4, 0.3]);
        samples.extend([0.01, 0.0]);

        // 20 dB below a 0.5 peak is 0.05
        assert_eq!(trim_range(&samples, 20.0), 3..6);
        // 40 dB keeps the 0.02 and 0.01 tails
        assert_eq!(trim_range(&samples, 40.0), 2..7);
        assert_eq!(trim_range(&[0.0; 16], 20.0), 0..0);
    }

    #[test]
    fn test_rms() {
        let samples = vec![1.0, -1.0, 1.0, -1.0];
        assert!((rms(&samples) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_mean_variance() {
        let (m, v) = mean_variance(&[1.0, 2.0, 3.0, 4.0]);
        assert!((m - 2.5).abs() < 1e-12);
        assert!((v - 1.25).abs() < 1e-12);
        assert!(variance(&[0.3; 17]) < 1e-20);
        assert_eq!(mean_variance(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_zero_crossing_rate() {
        let alternating = vec![1.0, -1.0, 1.0, -1.0, 1.0];
        assert!((zero_crossing_rate(&alternating) - 1.0).abs() < 1e-12);
        assert_eq!(zero_crossing_rate(&[0.5, 0.4, 0.3]), 0.0);
    }

    #[test]
    fn test_centroid_of_single_bin() {
        let freqs = vec![0.0, 100.0, 200.0, 300.0];
        let mags = vec![0.0, 0.0, 2.0, 0.0];
        assert!((spectral_centroid(&mags, &freqs) - 200.0).abs() < 1e-9);
        assert_eq!(spectral_centroid(&[0.0; 4], &freqs), 0.0);
    }

    #[test]
    fn test_rolloff() {
        let freqs = vec![0.0, 100.0, 200.0, 300.0];
        let mags = vec![1.0, 1.0, 1.0, 1.0];
        // 85% of four equal bins is reached at the fourth
        assert!((spectral_rolloff(&mags, &freqs, 0.85) - 300.0).abs() < 1e-9);
        assert!((spectral_rolloff(&mags, &freqs, 0.5) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_contrast_flat_band_is_zero() {
        let mags = vec![1.0; 64];
        let contrast = spectral_contrast(&mags, &[0..32, 32..64], 0.02, 1e-6);
        assert_eq!(contrast, vec![0.0, 0.0]);
    }

    #[test]
    fn test_contrast_bounded_by_floor() {
        let mut mags = vec![0.0; 50];
        mags[10] = 1.0;
        let contrast = spectral_contrast(&mags, &[0..50, 50..50], 0.02, 1e-4);
        assert!((contrast[0] - 80.0).abs() < 1e-9);
        assert_eq!(contrast[1], 0.0);
    }
}
