//! Fourier feature builder

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resample::resample;
use crate::{AbstractVehicle, FeatureExtractionError, Signal};

/// Feature configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Fixed signal length L (samples before and coefficients after the DFT)
    pub signal_length: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { signal_length: 128 }
    }
}

/// Builds [`AbstractVehicle`]s from trajectories
///
/// The transform is planned once for L. `build` takes `&self` and keeps no
/// state between calls, so one builder can serve many threads.
pub struct FourierFeatureBuilder {
    /// Fixed signal length
    length: usize,
    /// Forward DFT of size `length`
    fft: Arc<dyn Fft<f64>>,
}

impl FourierFeatureBuilder {
    /// Create a builder for the configured signal length
    pub fn new(config: &FeatureConfig) -> Result<Self, FeatureExtractionError> {
        if config.signal_length == 0 {
            return Err(FeatureExtractionError::InvalidLength);
        }
        let mut planner = FftPlanner::new();
        Ok(Self {
            length: config.signal_length,
            fft: planner.plan_fft_forward(config.signal_length),
        })
    }

    /// Fixed output length L
    pub fn signal_length(&self) -> usize {
        self.length
    }

    /// Convert one trajectory into its frequency-domain representation
    pub fn build(&self, id: u64, xs: &[f64], ys: &[f64]) -> Result<AbstractVehicle, FeatureExtractionError> {
        if xs.len() != ys.len() {
            return Err(FeatureExtractionError::LengthMismatch {
                id,
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        if xs.is_empty() {
            return Err(FeatureExtractionError::EmptyTrajectory { id });
        }
        if let Some(index) = xs
            .iter()
            .zip(ys)
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(FeatureExtractionError::NonFinite { id, index });
        }

        let x_sig = self.magnitude_spectrum(&resample(xs, self.length));
        let y_sig = self.magnitude_spectrum(&resample(ys, self.length));

        debug!(
            "Vehicle {}: {} samples -> {} coefficients per axis",
            id,
            xs.len(),
            self.length
        );

        Ok(AbstractVehicle::new(id, Signal::new(x_sig, y_sig)))
    }

    /// Unnormalised magnitude `|X[k]|` for every bin
    fn magnitude_spectrum(&self, series: &[f64]) -> Vec<f64> {
        let mut buffer: Vec<Complex<f64>> = series
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .collect();

        self.fft.process(&mut buffer);

        buffer.iter().map(|c| c.norm()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(length: usize) -> FourierFeatureBuilder {
        FourierFeatureBuilder::new(&FeatureConfig { signal_length: length }).unwrap()
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            FourierFeatureBuilder::new(&FeatureConfig { signal_length: 0 }),
            Err(FeatureExtractionError::InvalidLength)
        ));
    }

    #[test]
    fn test_empty_trajectory() {
        let b = builder(16);
        assert_eq!(
            b.build(3, &[], &[]).unwrap_err(),
            FeatureExtractionError::EmptyTrajectory { id: 3 }
        );
    }

    #[test]
    fn test_length_mismatch() {
        let b = builder(16);
        assert_eq!(
            b.build(1, &[1.0, 2.0], &[1.0]).unwrap_err(),
            FeatureExtractionError::LengthMismatch { id: 1, xs: 2, ys: 1 }
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let b = builder(16);
        assert!(matches!(
            b.build(1, &[1.0, f64::NAN], &[1.0, 2.0]),
            Err(FeatureExtractionError::NonFinite { id: 1, index: 1 })
        ));
    }

    #[test]
    fn test_fixed_length_output() {
        let b = builder(32);
        for n in [1, 5, 32, 100] {
            let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let v = b.build(0, &xs, &xs).unwrap();
            assert_eq!(v.signal().x_sig().len(), 32);
            assert_eq!(v.signal().y_sig().len(), 32);
        }
    }

    #[test]
    fn test_constant_series_is_dc_only() {
        let b = builder(8);
        let v = b.build(0, &[2.0; 8], &[0.0; 8]).unwrap();
        assert!((v.signal().x_sig()[0] - 16.0).abs() < 1e-9);
        assert!(v.signal().x_sig()[1..].iter().all(|m| m.abs() < 1e-9));
        assert!(v.signal().y_sig().iter().all(|m| m.abs() < 1e-9));
    }

    #[test]
    fn test_sine_peak_bin() {
        let b = builder(64);
        let xs: Vec<f64> = (0..64)
            .map(|i| (2.0 * std::f64::consts::PI * 4.0 * i as f64 / 64.0).sin())
            .collect();
        let v = b.build(0, &xs, &xs).unwrap();
        let sig = v.signal().x_sig();
        let peak = (0..32).max_by(|&a, &b| sig[a].total_cmp(&sig[b])).unwrap();
        assert_eq!(peak, 4);
    }

    #[test]
    fn test_deterministic_bit_identical() {
        let xs: Vec<f64> = (0..37).map(|i| (i as f64 * 0.37).cos() * 50.0 + 200.0).collect();
        let ys: Vec<f64> = (0..37).map(|i| i as f64 * 1.5).collect();

        let a = builder(64).build(9, &xs, &ys).unwrap();
        let b = builder(64).build(9, &xs, &ys).unwrap();

        let bits = |v: &[f64]| v.iter().map(|f| f.to_bits()).collect::<Vec<u64>>();
        assert_eq!(bits(a.signal().x_sig()), bits(b.signal().x_sig()));
        assert_eq!(bits(a.signal().y_sig()), bits(b.signal().y_sig()));
    }

    #[test]
    fn test_builder_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FourierFeatureBuilder>();
    }
}
