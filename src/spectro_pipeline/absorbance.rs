//! Absorbance statistics
//!
//! Turns dark, reference and sample bursts into per-replicate absorbance at
//! the target wavelength, then aggregates them.

use tracing::debug;

use crate::spectro_pipeline::common::error::{Result, SpectroError};
use crate::spectro_pipeline::common::stats::{mean, sample_std_dev};
use crate::spectro_pipeline::config::{AnalysisParams, IntegrationMode};
use crate::spectro_pipeline::spectrum::{PixelToWavelength, SpectralMatrix};

/// Smallest sample/reference ratio used, so opaque samples stay finite (A <= 6).
const MIN_TRANSMITTANCE: f64 = 1e-6;

/// Absorbance of one standard or unknown over its replicates.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsorbanceStats {
    /// One absorbance per reference/sample frame pair
    pub replicates: Vec<f64>,
    pub a_mean: f64,
    /// Sample standard deviation of `replicates` (0 for a single replicate)
    pub a_sd: f64,
    /// Relative spread (max - min) / mean of the integrated reference intensities
    pub reference_drift: f64,
    /// Number of columns inside the integration window
    pub window_columns: usize,
}

pub struct AbsorbanceEngine {
    mapping: PixelToWavelength,
    target_nm: f64,
    half_window_nm: f64,
    mode: IntegrationMode,
}

impl AbsorbanceEngine {
    pub fn new(
        mapping: PixelToWavelength,
        target_nm: f64,
        half_window_nm: f64,
        mode: IntegrationMode,
    ) -> Self {
        Self { mapping, target_nm, half_window_nm, mode }
    }

    pub fn from_params(params: &AnalysisParams, mapping: PixelToWavelength) -> Self {
        Self::new(mapping, params.target_wavelength_nm, params.half_window_nm, params.integration)
    }

    pub fn mapping(&self) -> &PixelToWavelength {
        &self.mapping
    }

    /// Computes `A = -log10(S / R)` per replicate after subtracting the mean
    /// dark spectrum from both reference and sample.
    pub fn compute(
        &self,
        dark: &SpectralMatrix,
        reference: &SpectralMatrix,
        sample: &SpectralMatrix,
    ) -> Result<AbsorbanceStats> {
        let columns = self.mapping.columns;
        for (name, matrix) in [("dark", dark), ("reference", reference), ("sample", sample)] {
            if matrix.columns() != columns {
                return Err(SpectroError::InvalidParameter(format!(
                    "{name} spectra have {} columns, wavelength mapping expects {columns}",
                    matrix.columns()
                )));
            }
            if matrix.is_empty() {
                return Err(SpectroError::InsufficientData(format!("no {name} spectra")));
            }
        }

        let window = self.mapping.columns_in_window(self.target_nm, self.half_window_nm);
        if window.is_empty() {
            return Err(SpectroError::InvalidParameter(format!(
                "no column maps into {:.1} ± {:.1} nm",
                self.target_nm, self.half_window_nm
            )));
        }

        let dark_mean = dark.mean_row();
        let pairs = reference.rows().min(sample.rows());
        let mut replicates = Vec::with_capacity(pairs);
        let mut reference_levels = Vec::with_capacity(pairs);

        for i in 0..pairs {
            let r = self.integrate(reference.row(i), &dark_mean, &window);
            let s = self.integrate(sample.row(i), &dark_mean, &window);
            if r <= 0.0 {
                return Err(SpectroError::InsufficientSignal(format!(
                    "reference replicate {i} has no light above dark level in the window"
                )));
            }
            let transmittance = (s / r).max(MIN_TRANSMITTANCE);
            replicates.push(-transmittance.log10());
            reference_levels.push(r);
        }

        let a_mean = mean(&replicates);
        let a_sd = sample_std_dev(&replicates);
        let reference_drift = relative_range(&reference_levels);

        debug!(
            replicates = pairs,
            window_columns = window.len(),
            a_mean,
            a_sd,
            reference_drift,
            "Absorbance computed"
        );

        Ok(AbsorbanceStats {
            replicates,
            a_mean,
            a_sd,
            reference_drift,
            window_columns: window.len(),
        })
    }

    fn integrate(&self, row: &[f64], dark: &[f64], window: &[usize]) -> f64 {
        let total: f64 = window.iter().map(|&c| row[c] - dark[c]).sum();
        match self.mode {
            IntegrationMode::Sum => total,
            IntegrationMode::Average => total / window.len() as f64,
        }
    }
}

fn relative_range(values: &[f64]) -> f64 {
    let m = mean(values);
    if values.len() < 2 || m <= 0.0 {
        return 0.0;
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    (max - min) / m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat(columns: usize, rows: &[f64]) -> SpectralMatrix {
        SpectralMatrix::from_rows(columns, rows.iter().map(|&v| vec![v; columns])).unwrap()
    }

    fn engine(mode: IntegrationMode) -> AbsorbanceEngine {
        // Columns 0..10 map to 500..510 nm
        AbsorbanceEngine::new(PixelToWavelength::linear(500.0, 1.0, 11), 505.0, 2.0, mode)
    }

    #[test]
    fn test_dark_corrected_absorbance() {
        let dark = flat(11, &[10.0, 10.0]);
        let reference = flat(11, &[110.0, 110.0]);
        let sample = flat(11, &[20.0, 20.0]);

        let stats = engine(IntegrationMode::Sum).compute(&dark, &reference, &sample).unwrap();

        assert_eq!(stats.window_columns, 5);
        assert_eq!(stats.replicates.len(), 2);
        assert_relative_eq!(stats.a_mean, 1.0, epsilon = 1e-12);
        assert_relative_eq!(stats.a_sd, 0.0);
        assert_relative_eq!(stats.reference_drift, 0.0);
    }

    #[test]
    fn test_sum_and_average_agree_on_absorbance() {
        let dark = flat(11, &[0.0]);
        let reference = flat(11, &[200.0, 190.0, 210.0]);
        let sample = flat(11, &[100.0, 90.0, 110.0]);

        let sum = engine(IntegrationMode::Sum).compute(&dark, &reference, &sample).unwrap();
        let avg = engine(IntegrationMode::Average).compute(&dark, &reference, &sample).unwrap();

        assert_relative_eq!(sum.a_mean, avg.a_mean, epsilon = 1e-12);
        assert!(sum.a_sd > 0.0);
        assert_relative_eq!(sum.reference_drift, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_replicates_paired_by_shorter_burst() {
        let dark = flat(11, &[0.0]);
        let reference = flat(11, &[100.0, 100.0, 100.0]);
        let sample = flat(11, &[50.0]);

        let stats = engine(IntegrationMode::Average).compute(&dark, &reference, &sample).unwrap();
        assert_eq!(stats.replicates.len(), 1);
        assert_relative_eq!(stats.a_mean, 2f64.log10(), epsilon = 1e-12);
    }

    #[test]
    fn test_opaque_sample_stays_finite() {
        let dark = flat(11, &[10.0]);
        let stats = engine(IntegrationMode::Sum)
            .compute(&dark, &flat(11, &[100.0]), &flat(11, &[5.0]))
            .unwrap();
        assert_relative_eq!(stats.a_mean, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dark_reference_rejected() {
        let dark = flat(11, &[50.0]);
        let result = engine(IntegrationMode::Sum).compute(&dark, &flat(11, &[40.0]), &flat(11, &[30.0]));
        assert!(matches!(result, Err(SpectroError::InsufficientSignal(_))));
    }

    #[test]
    fn test_window_outside_mapping_rejected() {
        let engine = AbsorbanceEngine::new(
            PixelToWavelength::linear(500.0, 1.0, 11),
            700.0,
            5.0,
            IntegrationMode::Sum,
        );
        let m = flat(11, &[1.0]);
        assert!(matches!(engine.compute(&m, &m, &m), Err(SpectroError::InvalidParameter(_))));
    }

    #[test]
    fn test_column_mismatch_rejected() {
        let result = engine(IntegrationMode::Sum).compute(&flat(11, &[0.0]), &flat(12, &[1.0]), &flat(11, &[1.0]));
        assert!(matches!(result, Err(SpectroError::InvalidParameter(_))));
    }
}
