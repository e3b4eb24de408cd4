use std::fmt;

use tracing::{info, warn};

use crate::spectro_pipeline::calibration::curve::CalibrationCurve;
use crate::spectro_pipeline::common::stats::t_critical_95;
use crate::spectro_pipeline::config::ValidationPolicy;

/// Slopes below this magnitude are treated as a flat response.
pub(crate) const MIN_SLOPE: f64 = 1e-9;

/// Reason a fitted curve falls short of the acceptance policy.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationIssue {
    TooFewStandards { found: usize, required: usize },
    LowRSquared { r2: f64, required: f64 },
    SlopeNotSignificant { slope: f64, std_error: f64 },
}

impl fmt::Display for CalibrationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationIssue::TooFewStandards { found, required } => write!(
                f,
                "only {found} standards measured, at least {required} are required"
            ),
            CalibrationIssue::LowRSquared { r2, required } => write!(
                f,
                "R² of {r2:.4} is below the required {required:.4}"
            ),
            CalibrationIssue::SlopeNotSignificant { slope, std_error } => write!(
                f,
                "slope {slope:.4e} (±{std_error:.2e}) is indistinguishable from zero"
            ),
        }
    }
}

/// Fitted curve plus everything the acceptance policy found wrong with it.
#[derive(Debug, Clone)]
pub struct CalibrationReport {
    pub curve: CalibrationCurve,
    pub standards: usize,
    pub issues: Vec<CalibrationIssue>,
}

impl CalibrationReport {
    pub fn is_accepted(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

/// Checks a fitted curve against `policy`. Never fails: problems are
/// returned as issues next to the curve and the caller decides.
pub fn validate_curve(
    curve: CalibrationCurve,
    standards: usize,
    policy: &ValidationPolicy,
) -> CalibrationReport {
    let mut issues = Vec::new();

    if standards < policy.min_standards {
        issues.push(CalibrationIssue::TooFewStandards {
            found: standards,
            required: policy.min_standards,
        });
    }
    if !(curve.r2 >= policy.min_r2) {
        issues.push(CalibrationIssue::LowRSquared {
            r2: curve.r2,
            required: policy.min_r2,
        });
    }
    let significance = t_critical_95(curve.dof) * curve.s_m;
    if !curve.m.is_finite() || curve.m.abs() < MIN_SLOPE || (curve.dof > 0 && curve.m.abs() <= significance) {
        issues.push(CalibrationIssue::SlopeNotSignificant {
            slope: curve.m,
            std_error: curve.s_m,
        });
    }

    if issues.is_empty() {
        info!(
            curve = %curve.name,
            m = curve.m,
            b = curve.b,
            r2 = curve.r2,
            "Calibration accepted"
        );
    } else {
        for issue in &issues {
            warn!(curve = %curve.name, "Calibration issue: {}", issue);
        }
    }

    CalibrationReport { curve, standards, issues }
}
