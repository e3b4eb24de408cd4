use tracing::debug;

use crate::spectro_pipeline::calibration::curve::{CalibrationCurve, ConcentrationRange};
use crate::spectro_pipeline::common::error::{Result, SpectroError};

/// Standardized residual above which a calibration point counts as an outlier.
const RESIDUAL_OUTLIER_SIGMA: f64 = 2.5;

/// One standard: known concentration and its measured absorbance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub concentration: f64,
    pub a_mean: f64,
    pub a_sd: f64,
}

impl CalibrationPoint {
    pub fn new(concentration: f64, a_mean: f64, a_sd: f64) -> Self {
        Self { concentration, a_mean, a_sd }
    }
}

/// Fits `A = m * C + b`.
///
/// Uses weights `1 / a_sd²` when every point has a positive `a_sd`, ordinary
/// least squares otherwise. Standard errors are scaled by the residual
/// variance, so they are zero for an exact fit and for two points.
pub fn fit_calibration(name: impl Into<String>, points: &[CalibrationPoint]) -> Result<CalibrationCurve> {
    let n = points.len();
    if n < 2 {
        return Err(SpectroError::InsufficientData(format!(
            "a calibration line needs at least 2 standards, got {n}"
        )));
    }
    if points
        .iter()
        .any(|p| !p.concentration.is_finite() || !p.a_mean.is_finite())
    {
        return Err(SpectroError::InvalidParameter(
            "calibration points must be finite".to_string(),
        ));
    }

    let weighted = points.iter().all(|p| p.a_sd.is_finite() && p.a_sd > 0.0);
    let weights: Vec<f64> = points
        .iter()
        .map(|p| if weighted { 1.0 / (p.a_sd * p.a_sd) } else { 1.0 })
        .collect();

    let (mut sw, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (p, &w) in points.iter().zip(&weights) {
        sw += w;
        sx += w * p.concentration;
        sy += w * p.a_mean;
        sxx += w * p.concentration * p.concentration;
        sxy += w * p.concentration * p.a_mean;
    }

    let delta = sw * sxx - sx * sx;
    if delta.abs() <= f64::EPSILON * sw * sxx.max(1.0) {
        return Err(SpectroError::InsufficientData(
            "standards must span at least two distinct concentrations".to_string(),
        ));
    }

    let m = (sw * sxy - sx * sy) / delta;
    let b = (sxx * sy - sx * sxy) / delta;

    let residuals: Vec<f64> = points
        .iter()
        .map(|p| p.a_mean - (m * p.concentration + b))
        .collect();
    let mean_y = sy / sw;
    let ss_res_w: f64 = residuals.iter().zip(&weights).map(|(r, w)| w * r * r).sum();
    let ss_tot_w: f64 = points
        .iter()
        .zip(&weights)
        .map(|(p, w)| w * (p.a_mean - mean_y).powi(2))
        .sum();
    let r2 = if ss_tot_w > 0.0 {
        1.0 - ss_res_w / ss_tot_w
    } else if ss_res_w == 0.0 {
        1.0
    } else {
        0.0
    };

    let dof = n - 2;
    let (see, s_m, s_b) = if dof > 0 {
        let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
        let variance = ss_res_w / dof as f64;
        (
            (ss_res / dof as f64).sqrt(),
            (variance * sw / delta).sqrt(),
            (variance * sxx / delta).sqrt(),
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    let (lod, loq) = if m.abs() > 0.0 {
        (Some(3.0 * s_b / m.abs()), Some(10.0 * s_b / m.abs()))
    } else {
        (None, None)
    };

    let outliers = if see > 0.0 {
        residuals
            .iter()
            .filter(|r| (*r / see).abs() > RESIDUAL_OUTLIER_SIGMA)
            .count()
    } else {
        0
    };

    let range = ConcentrationRange {
        min: points.iter().map(|p| p.concentration).fold(f64::INFINITY, f64::min),
        max: points.iter().map(|p| p.concentration).fold(f64::NEG_INFINITY, f64::max),
    };

    debug!(m, b, r2, see, s_m, s_b, weighted, "Calibration line fitted");

    Ok(CalibrationCurve {
        name: name.into(),
        m,
        b,
        r2,
        see,
        s_m,
        s_b,
        dof,
        range,
        lod,
        loq,
        weighted,
        outliers,
    })
}
