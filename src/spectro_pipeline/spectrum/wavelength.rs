use serde::{Deserialize, Serialize};

use crate::spectro_pipeline::common::error::{Result, SpectroError};

/// Quadratic pixel-column to wavelength (nm) polynomial from a device profile.
///
/// `columns` is the spectrum width the coefficients were fitted against; any
/// resampled spectrum needs a mapping from [`PixelToWavelength::rescaled`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelToWavelength {
    pub a0: f64,
    pub a1: f64,
    #[serde(default)]
    pub a2: f64,
    pub columns: usize,
}

impl PixelToWavelength {
    pub fn linear(a0: f64, a1: f64, columns: usize) -> Self {
        Self { a0, a1, a2: 0.0, columns }
    }

    pub fn quadratic(a0: f64, a1: f64, a2: f64, columns: usize) -> Self {
        Self { a0, a1, a2, columns }
    }

    #[inline]
    pub fn wavelength(&self, column: f64) -> f64 {
        self.a0 + self.a1 * column + self.a2 * column * column
    }

    /// Mapping for the same sensor after resampling to `columns` samples.
    ///
    /// New column `q` sits at old column `q * s` with `s = (orig - 1) / (new - 1)`.
    pub fn rescaled(&self, columns: usize) -> Result<Self> {
        if columns < 2 || self.columns < 2 {
            return Err(SpectroError::InvalidParameter(format!(
                "cannot rescale wavelength mapping from {} to {} columns",
                self.columns, columns
            )));
        }
        let s = (self.columns - 1) as f64 / (columns - 1) as f64;
        Ok(Self {
            a0: self.a0,
            a1: self.a1 * s,
            a2: self.a2 * s * s,
            columns,
        })
    }

    /// Columns whose mapped wavelength lies in `[center - half_window, center + half_window]`.
    pub fn columns_in_window(&self, center_nm: f64, half_window_nm: f64) -> Vec<usize> {
        let lo = center_nm - half_window_nm;
        let hi = center_nm + half_window_nm;
        (0..self.columns)
            .filter(|&c| {
                let nm = self.wavelength(c as f64);
                nm >= lo && nm <= hi
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rescaled_mapping_preserves_endpoints() {
        let map = PixelToWavelength::quadratic(380.0, 0.31, 2.0e-5, 1280);
        let resampled = map.rescaled(2048).unwrap();
        assert_relative_eq!(resampled.wavelength(0.0), map.wavelength(0.0));
        assert_relative_eq!(resampled.wavelength(2047.0), map.wavelength(1279.0), epsilon = 1e-9);
        assert_relative_eq!(resampled.wavelength(1023.5), map.wavelength(639.5), epsilon = 1e-9);
    }

    #[test]
    fn test_window_columns() {
        let map = PixelToWavelength::linear(400.0, 1.0, 300);
        let cols = map.columns_in_window(500.0, 2.0);
        assert_eq!(cols, vec![98, 99, 100, 101, 102]);
        assert!(map.columns_in_window(900.0, 5.0).is_empty());
    }

    #[test]
    fn test_rescale_rejects_tiny_targets() {
        let map = PixelToWavelength::linear(400.0, 1.0, 300);
        assert!(map.rescaled(1).is_err());
    }
}
