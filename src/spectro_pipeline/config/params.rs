//! Analysis run parameters

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::spectro_pipeline::common::error::{Result, SpectroError};
use crate::spectro_pipeline::config::policy::{ExposureBounds, ExposurePolicy, ValidationPolicy};
use crate::spectro_pipeline::spectrum::DEFAULT_CANONICAL_LENGTH;
use crate::spectro_pipeline::stage::Stage;

/// How intensities inside the wavelength window are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMode {
    Sum,
    Average,
}

/// A calibration standard of known concentration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardSpec {
    pub concentration: f64,
}

/// Parameters of one analysis run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Wavelength the absorbance is read at, in nm
    pub target_wavelength_nm: f64,
    /// Half width of the integration window, in nm
    pub half_window_nm: f64,
    pub frames_per_burst: usize,
    /// Standards in acquisition order
    pub standards: Vec<StandardSpec>,
    /// Resample every spectrum to `canonical_length` before analysis
    pub resample: bool,
    pub canonical_length: usize,
    pub integration: IntegrationMode,
    /// Fail a stage on the first saturated frame (otherwise flag and continue)
    pub abort_on_saturation: bool,
    pub exposure: ExposurePolicy,
    /// Per-stage-name overrides of the expected exposure bounds
    pub exposure_guards: HashMap<String, ExposureBounds>,
    pub validation: ValidationPolicy,
    /// Relative spread of reference intensities above which drift is flagged
    pub drift_tolerance: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            target_wavelength_nm: 520.0,
            half_window_nm: 5.0,
            frames_per_burst: 10,
            standards: Vec::new(),
            resample: true,
            canonical_length: DEFAULT_CANONICAL_LENGTH,
            integration: IntegrationMode::Average,
            abort_on_saturation: true,
            exposure: ExposurePolicy::default(),
            exposure_guards: HashMap::new(),
            validation: ValidationPolicy::default(),
            drift_tolerance: 0.05,
        }
    }
}

impl AnalysisParams {
    pub fn builder() -> AnalysisParamsBuilder {
        AnalysisParamsBuilder::default()
    }

    /// Exposure bounds for `stage`: an explicit guard for its name wins over
    /// the policy default for its kind.
    pub fn exposure_bounds(&self, stage: &Stage) -> ExposureBounds {
        self.exposure_guards
            .get(&stage.name)
            .copied()
            .unwrap_or_else(|| self.exposure.bounds_for(stage.kind))
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |what: &str| -> Result<()> {
            Err(SpectroError::InvalidParameter(what.to_string()))
        };
        if !(self.target_wavelength_nm.is_finite() && self.target_wavelength_nm > 0.0) {
            return invalid("target wavelength must be a positive number of nm");
        }
        if !(self.half_window_nm.is_finite() && self.half_window_nm >= 0.0) {
            return invalid("integration half-window must be non-negative");
        }
        if self.frames_per_burst == 0 {
            return invalid("frames per burst must be at least 1");
        }
        if self.resample && self.canonical_length < 2 {
            return invalid("canonical length must be at least 2");
        }
        if self
            .standards
            .iter()
            .any(|s| !s.concentration.is_finite() || s.concentration < 0.0)
        {
            return invalid("standard concentrations must be finite and non-negative");
        }
        Ok(())
    }

    /// Load parameters from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&content)?;
        params
            .validate()
            .map_err(|e| SpectroError::ConfigError(format!("{}: {e}", path.display())))?;
        Ok(params)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Builder for AnalysisParams
#[derive(Default)]
pub struct AnalysisParamsBuilder {
    target_wavelength_nm: Option<f64>,
    half_window_nm: Option<f64>,
    frames_per_burst: Option<usize>,
    standards: Option<Vec<StandardSpec>>,
    resample: Option<bool>,
    canonical_length: Option<usize>,
    integration: Option<IntegrationMode>,
    abort_on_saturation: Option<bool>,
    exposure: Option<ExposurePolicy>,
    exposure_guards: HashMap<String, ExposureBounds>,
    validation: Option<ValidationPolicy>,
    drift_tolerance: Option<f64>,
}

impl AnalysisParamsBuilder {
    pub fn target_wavelength_nm(mut self, nm: f64) -> Self {
        self.target_wavelength_nm = Some(nm);
        self
    }

    pub fn half_window_nm(mut self, nm: f64) -> Self {
        self.half_window_nm = Some(nm);
        self
    }

    pub fn frames_per_burst(mut self, frames: usize) -> Self {
        self.frames_per_burst = Some(frames);
        self
    }

    pub fn standards(mut self, concentrations: &[f64]) -> Self {
        self.standards = Some(
            concentrations
                .iter()
                .map(|&concentration| StandardSpec { concentration })
                .collect(),
        );
        self
    }

    pub fn resample(mut self, enable: bool) -> Self {
        self.resample = Some(enable);
        self
    }

    pub fn canonical_length(mut self, length: usize) -> Self {
        self.canonical_length = Some(length);
        self
    }

    pub fn integration(mut self, mode: IntegrationMode) -> Self {
        self.integration = Some(mode);
        self
    }

    pub fn abort_on_saturation(mut self, abort: bool) -> Self {
        self.abort_on_saturation = Some(abort);
        self
    }

    pub fn exposure(mut self, policy: ExposurePolicy) -> Self {
        self.exposure = Some(policy);
        self
    }

    pub fn exposure_guard(mut self, stage: impl Into<String>, bounds: ExposureBounds) -> Self {
        self.exposure_guards.insert(stage.into(), bounds);
        self
    }

    pub fn validation(mut self, policy: ValidationPolicy) -> Self {
        self.validation = Some(policy);
        self
    }

    pub fn drift_tolerance(mut self, tolerance: f64) -> Self {
        self.drift_tolerance = Some(tolerance);
        self
    }

    pub fn build(self) -> AnalysisParams {
        let default = AnalysisParams::default();
        AnalysisParams {
            target_wavelength_nm: self.target_wavelength_nm.unwrap_or(default.target_wavelength_nm),
            half_window_nm: self.half_window_nm.unwrap_or(default.half_window_nm),
            frames_per_burst: self.frames_per_burst.unwrap_or(default.frames_per_burst),
            standards: self.standards.unwrap_or(default.standards),
            resample: self.resample.unwrap_or(default.resample),
            canonical_length: self.canonical_length.unwrap_or(default.canonical_length),
            integration: self.integration.unwrap_or(default.integration),
            abort_on_saturation: self.abort_on_saturation.unwrap_or(default.abort_on_saturation),
            exposure: self.exposure.unwrap_or(default.exposure),
            exposure_guards: self.exposure_guards,
            validation: self.validation.unwrap_or(default.validation),
            drift_tolerance: self.drift_tolerance.unwrap_or(default.drift_tolerance),
        }
    }
}
