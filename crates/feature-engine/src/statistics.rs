//! Trajectory summary statistics

use serde::{Deserialize, Serialize};

/// Descriptive statistics of one coordinate series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Number of samples
    pub count: usize,
    /// Mean value
    pub mean: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Mean absolute change between consecutive samples
    pub rate_of_change: f64,
}

impl SeriesSummary {
    /// Compute summary statistics from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;

        let mean = values.iter().sum::<f64>() / n;

        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let rate_of_change = if values.len() >= 2 {
            let total_change: f64 = values.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
            total_change / (values.len() - 1) as f64
        } else {
            0.0
        };

        Self {
            count: values.len(),
            mean,
            std_dev,
            min,
            max,
            rate_of_change,
        }
    }

    /// Distance between the extreme values
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_computation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = SeriesSummary::compute(&values);
        assert!((stats.mean - 3.0).abs() < 0.001);
        assert_eq!(stats.count, 5);
    }

    #[test]
    fn test_std_dev_computation() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = SeriesSummary::compute(&values);
        assert!((stats.std_dev - 2.0).abs() < 0.1);
        assert_eq!(stats.range(), 7.0);
    }

    #[test]
    fn test_rate_of_change() {
        let stats = SeriesSummary::compute(&[0.0, 10.0, 5.0]);
        assert!((stats.rate_of_change - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_values() {
        let stats = SeriesSummary::compute(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.count, 0);
    }
}
