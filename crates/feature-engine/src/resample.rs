//! Fixed-length resampling
//!
//! - longer input: uniform decimation, output `i` is input `floor(i * n / L)`
//! - shorter input: the last sample is repeated up to `L`
//! - input of length `L`: returned unchanged

/// Resample `values` to exactly `length` samples
pub fn resample(values: &[f64], length: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 || length == 0 {
        return vec![0.0; length];
    }

    if n >= length {
        (0..length).map(|i| values[i * n / length]).collect()
    } else {
        let last = values[n - 1];
        values
            .iter()
            .copied()
            .chain(std::iter::repeat(last).take(length - n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identity_at_length() {
        let values = vec![3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(resample(&values, 5), values);
    }

    #[test]
    fn test_decimation() {
        let values: Vec<f64> = (0..10).map(|v| v as f64).collect();
        assert_eq!(resample(&values, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(resample(&values, 3), vec![0.0, 3.0, 6.0]);
    }

    #[test]
    fn test_edge_padding() {
        assert_eq!(resample(&[1.0, 2.0], 5), vec![1.0, 2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_single_sample() {
        assert_eq!(resample(&[7.0], 3), vec![7.0, 7.0, 7.0]);
    }

    proptest! {
        #[test]
        fn prop_output_length_fixed(
            values in proptest::collection::vec(-1000.0f64..1000.0, 1..300),
            length in 1usize..256,
        ) {
            let out = resample(&values, length);
            prop_assert_eq!(out.len(), length);
            // Every output sample is an input sample
            for v in &out {
                prop_assert!(values.contains(v));
            }
            prop_assert_eq!(out[0], values[0]);
        }
    }
}
