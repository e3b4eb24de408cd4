use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::spectro_pipeline::common::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationRange {
    pub min: f64,
    pub max: f64,
}

impl ConcentrationRange {
    pub fn contains(&self, concentration: f64) -> bool {
        concentration >= self.min && concentration <= self.max
    }
}

/// Fitted line `A = m * C + b` with its uncertainty. Immutable once fitted
/// and reusable across sessions under its `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCurve {
    pub name: String,
    pub m: f64,
    pub b: f64,
    #[serde(rename = "R2")]
    pub r2: f64,
    /// Standard error of the estimate
    #[serde(rename = "SEE")]
    pub see: f64,
    pub s_m: f64,
    pub s_b: f64,
    /// Residual degrees of freedom (points - 2)
    pub dof: usize,
    pub range: ConcentrationRange,
    /// Limit of detection, `3 s_b / |m|`; `None` for a zero slope
    #[serde(rename = "LOD")]
    pub lod: Option<f64>,
    #[serde(rename = "LOQ")]
    pub loq: Option<f64>,
    /// Fitted with inverse-variance weights
    pub weighted: bool,
    /// Calibration points whose standardized residual looked anomalous
    #[serde(default)]
    pub outliers: usize,
}

impl CalibrationCurve {
    pub fn absorbance_at(&self, concentration: f64) -> f64 {
        self.m * concentration + self.b
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn curve() -> CalibrationCurve {
        CalibrationCurve {
            name: "nitrite-520".to_string(),
            m: 1.25,
            b: 0.03,
            r2: 0.998,
            see: 0.004,
            s_m: 0.02,
            s_b: 0.002,
            dof: 3,
            range: ConcentrationRange { min: 0.05, max: 0.8 },
            lod: Some(0.0048),
            loq: Some(0.016),
            weighted: true,
            outliers: 0,
        }
    }

    #[test]
    fn test_artifact_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");

        let original = curve();
        original.save_json(&path).unwrap();
        let loaded = CalibrationCurve::load_json(&path).unwrap();

        assert_eq!(loaded.name, original.name);
        assert_relative_eq!(loaded.m, original.m);
        assert_relative_eq!(loaded.b, original.b);
        assert_relative_eq!(loaded.r2, original.r2);
        assert_eq!(loaded.dof, 3);
        assert!(loaded.weighted);
        assert_relative_eq!(loaded.lod.unwrap(), 0.0048);
        assert_relative_eq!(loaded.absorbance_at(0.4), 0.53, epsilon = 1e-12);
    }

    #[test]
    fn test_artifact_field_names() {
        let json = serde_json::to_value(curve()).unwrap();
        for key in ["name", "m", "b", "R2", "SEE", "s_m", "s_b", "range", "LOD", "LOQ"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }

        let mut undefined = curve();
        undefined.lod = None;
        let json = serde_json::to_string(&undefined).unwrap();
        let back: CalibrationCurve = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lod, None);
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = curve().range;
        assert!(range.contains(0.05));
        assert!(range.contains(0.8));
        assert!(!range.contains(0.81));
    }
}
