use crate::spectro_pipeline::common::error::{Result, SpectroError};

/// Column count every spectrum is brought to before cross-device comparison.
pub const DEFAULT_CANONICAL_LENGTH: usize = 2048;

/// Linearly resamples `values` to `target` samples.
///
/// Output index `i` maps to source position `i * (n - 1) / (target - 1)` and is
/// interpolated between the two nearest source samples, so the first and last
/// samples are preserved and monotonic input stays monotonic.
pub fn resample(values: &[f64], target: usize) -> Result<Vec<f64>> {
    if target < 2 {
        return Err(SpectroError::InvalidParameter(format!(
            "resample target length must be at least 2, got {target}"
        )));
    }
    let n = values.len();
    match n {
        0 => {
            return Err(SpectroError::InsufficientData(
                "cannot resample an empty spectrum".to_string(),
            ));
        }
        1 => return Ok(vec![values[0]; target]),
        _ if n == target => return Ok(values.to_vec()),
        _ => {}
    }

    let scale = (n - 1) as f64 / (target - 1) as f64;
    let out = (0..target)
        .map(|i| {
            let pos = i as f64 * scale;
            let lo = (pos.floor() as usize).min(n - 1);
            let hi = (lo + 1).min(n - 1);
            let frac = pos - lo as f64;
            values[lo] + (values[hi] - values[lo]) * frac
        })
        .collect();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_when_lengths_match() {
        let values = vec![5.0, 1.0, 9.0, 2.5];
        assert_eq!(resample(&values, 4).unwrap(), values);
    }

    #[test]
    fn test_upsample_interpolates_linearly() {
        let out = resample(&[0.0, 10.0, 20.0], 5).unwrap();
        for (got, want) in out.iter().zip([0.0, 5.0, 10.0, 15.0, 20.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_downsample_keeps_endpoints() {
        let values: Vec<f64> = (0..1000).map(|i| (i as f64).sqrt()).collect();
        let out = resample(&values, 7).unwrap();
        assert_relative_eq!(out[0], values[0]);
        assert_relative_eq!(out[6], values[999], epsilon = 1e-12);
    }

    #[test]
    fn test_monotonic_input_stays_monotonic() {
        let increasing: Vec<f64> = (0..37).map(|i| (i as f64).powf(1.7)).collect();
        let decreasing: Vec<f64> = increasing.iter().rev().copied().collect();
        for target in [2, 5, 36, 37, 38, 100, 2048] {
            let up = resample(&increasing, target).unwrap();
            assert!(up.windows(2).all(|w| w[0] <= w[1]), "target {target}");
            let down = resample(&decreasing, target).unwrap();
            assert!(down.windows(2).all(|w| w[0] >= w[1]), "target {target}");
        }
    }

    #[test]
    fn test_invalid_targets_and_inputs() {
        assert!(matches!(resample(&[1.0, 2.0], 1), Err(SpectroError::InvalidParameter(_))));
        assert!(matches!(resample(&[], 8), Err(SpectroError::InsufficientData(_))));
        assert_eq!(resample(&[3.0], 3).unwrap(), vec![3.0, 3.0, 3.0]);
    }
}
