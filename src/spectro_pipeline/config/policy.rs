//! Quality policies
//!
//! The exposure fractions and the saturation ceiling are heuristics tuned on
//! 8-bit phone sensors; they are kept here so each sensor can override them.

use serde::{Deserialize, Serialize};

use crate::spectro_pipeline::stage::StageKind;

/// Acceptable stage mean as a fraction of the frame's full scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureBounds {
    pub min_fraction: f64,
    pub max_fraction: f64,
}

impl ExposureBounds {
    pub fn new(min_fraction: f64, max_fraction: f64) -> Self {
        Self { min_fraction, max_fraction }
    }

    pub fn contains(&self, fraction: f64) -> bool {
        fraction >= self.min_fraction && fraction <= self.max_fraction
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposurePolicy {
    /// Fraction of full scale at which a sample counts as clipped
    pub saturation_fraction: f64,
    /// Absolute ceiling applied on top of the fraction (8-bit safe)
    pub saturation_cap: Option<f64>,
    /// Dark stages must stay below this fraction of full scale
    pub dark_max_fraction: f64,
    pub lit_min_fraction: f64,
    pub lit_max_fraction: f64,
}

impl Default for ExposurePolicy {
    fn default() -> Self {
        Self {
            saturation_fraction: 0.98,
            saturation_cap: Some(252.0),
            dark_max_fraction: 0.12,
            lit_min_fraction: 0.12,
            lit_max_fraction: 0.90,
        }
    }
}

impl ExposurePolicy {
    /// Clipping threshold for a frame whose samples top out at `max_value`.
    pub fn saturation_ceiling(&self, max_value: f64) -> f64 {
        let ceiling = max_value * self.saturation_fraction;
        match self.saturation_cap {
            Some(cap) => ceiling.min(cap),
            None => ceiling,
        }
    }

    /// Expected mean-intensity bounds for a stage kind.
    pub fn bounds_for(&self, kind: StageKind) -> ExposureBounds {
        match kind {
            StageKind::Dark => ExposureBounds::new(0.0, self.dark_max_fraction),
            _ => ExposureBounds::new(self.lit_min_fraction, self.lit_max_fraction),
        }
    }
}

/// Acceptance rules for a fitted calibration curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub min_standards: usize,
    pub min_r2: f64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_standards: 3,
            min_r2: 0.99,
        }
    }
}
