//! Concentration estimation
//!
//! Inverts an accepted calibration curve for an unknown sample and attaches
//! the precision figures and quality flags reported to the user.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::spectro_pipeline::absorbance::AbsorbanceStats;
use crate::spectro_pipeline::calibration::CalibrationCurve;
use crate::spectro_pipeline::common::error::{Result, SpectroError};
use crate::spectro_pipeline::common::stats::{count_mad_outliers, t_critical_95};

/// Slopes below this magnitude make the inversion numerically meaningless.
const MIN_INVERTIBLE_SLOPE: f64 = 1e-9;

/// Modified z-score above which a replicate absorbance is an outlier.
const REPLICATE_OUTLIER_Z: f64 = 3.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityFlags {
    pub saturation: bool,
    pub drift: bool,
    pub in_range: bool,
    #[serde(rename = "outliers")]
    pub outlier_count: usize,
}

impl QualityFlags {
    pub fn has_warnings(&self) -> bool {
        self.saturation || self.drift || !self.in_range || self.outlier_count > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

/// Calibration figures echoed in every result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSummary {
    pub m: f64,
    pub b: f64,
    #[serde(rename = "R2")]
    pub r2: f64,
    #[serde(rename = "SEE")]
    pub see: f64,
    #[serde(rename = "LOD")]
    pub lod: Option<f64>,
    #[serde(rename = "LOQ")]
    pub loq: Option<f64>,
}

impl From<&CalibrationCurve> for CalibrationSummary {
    fn from(curve: &CalibrationCurve) -> Self {
        Self {
            m: curve.m,
            b: curve.b,
            r2: curve.r2,
            see: curve.see,
            lod: curve.lod,
            loq: curve.loq,
        }
    }
}

/// Estimated concentration of one sample measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationResult {
    #[serde(rename = "C")]
    pub concentration: f64,
    #[serde(rename = "CI95")]
    pub ci95: ConfidenceInterval,
    #[serde(rename = "A_mean")]
    pub a_mean: f64,
    #[serde(rename = "A_sd")]
    pub a_sd: f64,
    /// Coefficient of variation of the replicate absorbances, in percent
    #[serde(rename = "CV")]
    pub cv: Option<f64>,
    pub calib: CalibrationSummary,
    #[serde(rename = "QA")]
    pub quality: QualityFlags,
}

pub struct ConcentrationEstimator {
    curve: CalibrationCurve,
    drift_tolerance: f64,
}

impl ConcentrationEstimator {
    pub fn new(curve: CalibrationCurve, drift_tolerance: f64) -> Self {
        Self { curve, drift_tolerance }
    }

    pub fn curve(&self) -> &CalibrationCurve {
        &self.curve
    }

    /// `C = (A - b) / m`, refusing slopes indistinguishable from zero.
    pub fn invert(&self, absorbance: f64) -> Result<f64> {
        let m = self.curve.m;
        if !m.is_finite() || m.abs() < MIN_INVERTIBLE_SLOPE {
            return Err(SpectroError::UnstableInversion(m));
        }
        Ok((absorbance - self.curve.b) / m)
    }

    /// Estimates the concentration behind `stats`.
    ///
    /// The 95% interval propagates the replicate spread and the slope and
    /// intercept errors to first order:
    /// `σ_C² = (A_sd² + s_b² + C² s_m²) / m²`.
    pub fn estimate(&self, stats: &AbsorbanceStats, saturation: bool) -> Result<ConcentrationResult> {
        let concentration = self.invert(stats.a_mean)?;
        let curve = &self.curve;

        let variance = (stats.a_sd.powi(2)
            + curve.s_b.powi(2)
            + concentration.powi(2) * curve.s_m.powi(2))
            / curve.m.powi(2);
        let half_width = t_critical_95(curve.dof) * variance.sqrt();

        let cv = if stats.a_mean.abs() > f64::EPSILON {
            Some(100.0 * stats.a_sd / stats.a_mean.abs())
        } else {
            None
        };

        let quality = QualityFlags {
            saturation,
            drift: stats.reference_drift > self.drift_tolerance,
            in_range: curve.range.contains(concentration),
            outlier_count: count_mad_outliers(&stats.replicates, REPLICATE_OUTLIER_Z) + curve.outliers,
        };

        info!(
            curve = %curve.name,
            concentration,
            half_width,
            in_range = quality.in_range,
            "Concentration estimated"
        );

        Ok(ConcentrationResult {
            concentration,
            ci95: ConfidenceInterval {
                low: concentration - half_width,
                high: concentration + half_width,
            },
            a_mean: stats.a_mean,
            a_sd: stats.a_sd,
            cv,
            calib: CalibrationSummary::from(curve),
            quality,
        })
    }
}
