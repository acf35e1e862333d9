//! Frequency-domain features
//!
//! Computes the one-sided amplitude spectrum of a dataset's power signal so
//! periodic consumption patterns can be compared across sources. Samples are
//! linearly resampled onto a uniform grid before the FFT because device logs
//! are irregularly spaced.

use crate::types::CanonicalDataset;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

/// One frequency bin of a power spectrum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumBin {
    pub frequency_hz: f64,
    /// Amplitude of the power oscillation at this frequency (W)
    pub amplitude_watts: f64,
}

/// One-sided amplitude spectrum of a power signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSpectrum {
    /// Sample rate of the uniform grid the FFT ran on
    pub sample_rate_hz: f64,
    /// Bins from DC up to Nyquist, ascending
    pub bins: Vec<SpectrumBin>,
}

impl PowerSpectrum {
    /// Bins inside an inclusive frequency range; open bounds when `None`
    pub fn band(&self, min_hz: Option<f64>, max_hz: Option<f64>) -> Vec<SpectrumBin> {
        self.bins
            .iter()
            .filter(|bin| min_hz.map_or(true, |min| bin.frequency_hz >= min))
            .filter(|bin| max_hz.map_or(true, |max| bin.frequency_hz <= max))
            .copied()
            .collect()
    }

    /// Strongest bin above DC
    pub fn dominant_frequency(&self) -> Option<SpectrumBin> {
        self.bins
            .iter()
            .skip(1)
            .copied()
            .max_by(|a, b| a.amplitude_watts.total_cmp(&b.amplitude_watts))
    }

    /// The `count` strongest bins within a range, strongest first
    pub fn peaks(&self, count: usize, min_hz: Option<f64>, max_hz: Option<f64>) -> Vec<SpectrumBin> {
        let mut bins: Vec<SpectrumBin> = self
            .band(min_hz, max_hz)
            .into_iter()
            .filter(|bin| bin.frequency_hz > 0.0)
            .collect();
        bins.sort_by(|a, b| b.amplitude_watts.total_cmp(&a.amplitude_watts));
        bins.truncate(count);
        bins
    }
}

/// Compute the power spectrum of a dataset.
///
/// Needs at least two samples, every timestamp resolved and non-decreasing,
/// every power value valid, and a non-zero time span.
pub fn power_spectrum(dataset: &CanonicalDataset) -> Option<PowerSpectrum> {
    let time_ms = dataset.all_timestamps_millis()?;
    let power = dataset.all_power_watts()?;
    let n = power.len();
    if n < 2 || !time_ms.windows(2).all(|w| w[0] <= w[1]) {
        return None;
    }

    let span_ms = time_ms[n - 1].checked_sub(time_ms[0])? as f64;
    if span_ms <= 0.0 {
        return None;
    }
    let sample_rate_hz = (n - 1) as f64 / (span_ms / 1000.0);

    let uniform = resample_linear(&time_ms, &power, n);
    let mean = uniform.iter().sum::<f64>() / n as f64;
    let mut buffer: Vec<Complex<f64>> = uniform
        .iter()
        .map(|&p| Complex {
            re: p - mean,
            im: 0.0,
        })
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let half = n / 2;
    let bins = buffer[..=half]
        .iter()
        .enumerate()
        .map(|(k, c)| {
            let mut amplitude = c.norm() / n as f64;
            // Fold negative frequencies, except DC and the Nyquist bin of even lengths
            if k > 0 && !(n % 2 == 0 && k == half) {
                amplitude *= 2.0;
            }
            SpectrumBin {
                frequency_hz: k as f64 * sample_rate_hz / n as f64,
                amplitude_watts: amplitude,
            }
        })
        .collect();

    Some(PowerSpectrum {
        sample_rate_hz,
        bins,
    })
}

/// Linearly resample `(t, y)` onto `len` evenly spaced points spanning `t`.
///
/// `t` must be non-decreasing with at least two points.
fn resample_linear(t: &[i64], y: &[f64], len: usize) -> Vec<f64> {
    let start = t[0] as f64;
    let step = (t[t.len() - 1] as f64 - start) / (len - 1) as f64;

    let mut j = 0;
    (0..len)
        .map(|i| {
            let x = start + i as f64 * step;
            while j + 2 < t.len() && (t[j + 1] as f64) <= x {
                j += 1;
            }
            let (t0, t1) = (t[j] as f64, t[j + 1] as f64);
            if t1 <= t0 {
                return y[j + 1];
            }
            let frac = ((x - t0) / (t1 - t0)).clamp(0.0, 1.0);
            y[j] + frac * (y[j + 1] - y[j])
        })
        .collect()
}
