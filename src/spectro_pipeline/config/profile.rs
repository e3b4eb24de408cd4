//! Device profile
//!
//! Everything that is specific to one phone + spectrometer attachment: where
//! the spectrum sits on the sensor, the manual camera settings, and the
//! wavelength calibration of the columns.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::spectro_pipeline::capture::CameraMetadata;
use crate::spectro_pipeline::common::error::{Result, SpectroError};
use crate::spectro_pipeline::frame::Roi;
use crate::spectro_pipeline::spectrum::PixelToWavelength;

/// User-facing badge for the wavelength calibration fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    #[serde(default)]
    pub roi: Option<Roi>,
    #[serde(default)]
    pub camera: CameraMetadata,
    pub wavelength: PixelToWavelength,
    /// RMSE of the wavelength polynomial fit, in nm
    #[serde(default)]
    pub wavelength_rmse_nm: Option<f64>,
}

impl DeviceProfile {
    pub fn new(name: impl Into<String>, wavelength: PixelToWavelength) -> Self {
        Self {
            name: name.into(),
            roi: None,
            camera: CameraMetadata::default(),
            wavelength,
            wavelength_rmse_nm: None,
        }
    }

    pub fn with_roi(mut self, roi: Roi) -> Self {
        self.roi = Some(roi);
        self
    }

    pub fn with_camera(mut self, camera: CameraMetadata) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_rmse(mut self, rmse_nm: f64) -> Self {
        self.wavelength_rmse_nm = Some(rmse_nm);
        self
    }

    pub fn calibration_quality(&self) -> CalibrationQuality {
        match self.wavelength_rmse_nm {
            Some(rmse) if rmse < 1.0 => CalibrationQuality::Excellent,
            Some(rmse) if rmse < 2.0 => CalibrationQuality::Good,
            Some(rmse) if rmse < 5.0 => CalibrationQuality::Fair,
            Some(_) => CalibrationQuality::Poor,
            None => CalibrationQuality::Unknown,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let profile: Self = serde_json::from_str(&content)?;
        let map = &profile.wavelength;
        if map.columns < 2 || ![map.a0, map.a1, map.a2].iter().all(|c| c.is_finite()) {
            return Err(SpectroError::ConfigError(format!(
                "{}: wavelength mapping needs finite coefficients over at least 2 columns",
                path.display()
            )));
        }
        Ok(profile)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_badge() {
        let profile = DeviceProfile::new("pixel-7", PixelToWavelength::linear(380.0, 0.2, 1600));
        assert_eq!(profile.calibration_quality(), CalibrationQuality::Unknown);
        assert_eq!(profile.clone().with_rmse(0.4).calibration_quality(), CalibrationQuality::Excellent);
        assert_eq!(profile.clone().with_rmse(1.5).calibration_quality(), CalibrationQuality::Good);
        assert_eq!(profile.clone().with_rmse(3.0).calibration_quality(), CalibrationQuality::Fair);
        assert_eq!(profile.with_rmse(9.0).calibration_quality(), CalibrationQuality::Poor);
    }

    #[test]
    fn test_profile_json_accepts_width_height_roi() {
        let json = r#"{
            "name": "bench-rig",
            "roi": {"x": 10, "y": 200, "width": 1200, "height": 40},
            "camera": {"iso": 50, "shutter_ms": 12.5},
            "wavelength": {"a0": 390.0, "a1": 0.25, "columns": 1200},
            "wavelength_rmse_nm": 0.8
        }"#;
        let profile: DeviceProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.roi, Some(Roi::new(10.0, 200.0, 1200.0, 40.0)));
        assert_eq!(profile.camera.iso, Some(50));
        assert_eq!(profile.camera.white_balance, None);
        assert_eq!(profile.wavelength.a2, 0.0);
    }

    #[test]
    fn test_profile_file_roundtrip_and_bad_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");

        let profile = DeviceProfile::new("pixel-7", PixelToWavelength::quadratic(380.0, 0.2, 1e-5, 1600))
            .with_roi(Roi::new(0.0, 300.0, 1600.0, 20.0))
            .with_rmse(1.2);
        profile.to_json_file(&path).unwrap();
        assert_eq!(DeviceProfile::from_json_file(&path).unwrap(), profile);

        std::fs::write(&path, r#"{"name": "broken", "wavelength": {"a0": 380.0, "a1": 0.2, "columns": 1}}"#)
            .unwrap();
        assert!(matches!(
            DeviceProfile::from_json_file(&path),
            Err(SpectroError::ConfigError(_))
        ));
    }
}
