//! Calibration curve module
//!
//! Beer-Lambert calibration: weighted line fit over standards, acceptance
//! checks, and the reusable curve artifact.

mod curve;
mod fit;
mod validate;

pub use curve::{CalibrationCurve, ConcentrationRange};
pub use fit::{CalibrationPoint, fit_calibration};
pub use validate::{CalibrationIssue, CalibrationReport, validate_curve};
