//! Analysis workflow
//!
//! Runs a full measurement session: the standards in request order, the
//! calibration fit, and finally the unknown sample. Every step propagates its
//! errors unchanged so the caller decides whether to retry or re-measure.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::spectro_pipeline::{
    absorbance::{AbsorbanceEngine, AbsorbanceStats},
    acquisition::{StageAcquisition, StageOutcome},
    calibration::{CalibrationCurve, CalibrationPoint, CalibrationReport, fit_calibration, validate_curve},
    capture::{CaptureAdapter, SimulatorConfig},
    common::error::{Result, SpectroError},
    config::{AnalysisParams, DeviceProfile},
    estimate::{ConcentrationEstimator, ConcentrationResult},
    spectrum::{PixelToWavelength, SpectralMatrix},
    stage::{Stage, StageKind},
};

/// The four bursts acquired for a standard or for the unknown, reduced and,
/// when enabled, resampled to the canonical length.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub dark: SpectralMatrix,
    pub white: SpectralMatrix,
    pub reference: SpectralMatrix,
    pub sample: SpectralMatrix,
    /// Some frame was saturated (only possible with `abort_on_saturation` off)
    pub saturated: bool,
    /// Frames outside their stage's exposure bounds, summed over the stages
    pub out_of_range: usize,
}

/// A known concentration together with its acquired spectra.
#[derive(Debug, Clone)]
pub struct Standard {
    pub concentration: f64,
    pub measurement: Measurement,
}

/// Outcome of [`AnalysisWorkflow::run`]; serializes to the result contract
/// plus the calibration issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub result: ConcentrationResult,
    pub curve: String,
    pub issues: Vec<String>,
    pub simulated: bool,
}

pub struct AnalysisWorkflow {
    acquisition: StageAcquisition,
    engine: AbsorbanceEngine,
    standards: Vec<Standard>,
}

impl AnalysisWorkflow {
    pub fn new(adapter: CaptureAdapter, params: AnalysisParams, profile: DeviceProfile) -> Result<Self> {
        params.validate()?;
        let mapping = working_mapping(&params, &profile.wavelength)?;
        let engine = AbsorbanceEngine::from_params(&params, mapping);

        info!(
            profile = %profile.name,
            backend = adapter.backend_name(),
            simulated = adapter.is_simulated(),
            quality = ?profile.calibration_quality(),
            columns = mapping.columns,
            "Analysis workflow ready"
        );

        Ok(Self {
            acquisition: StageAcquisition::new(adapter, params, profile),
            engine,
            standards: Vec::new(),
        })
    }

    /// Workflow on the synthetic backend.
    pub fn simulated(params: AnalysisParams, profile: DeviceProfile) -> Result<Self> {
        Self::new(CaptureAdapter::simulated(SimulatorConfig::default()), params, profile)
    }

    pub fn params(&self) -> &AnalysisParams {
        self.acquisition.params()
    }

    pub fn standards(&self) -> &[Standard] {
        &self.standards
    }

    pub fn is_simulated(&self) -> bool {
        self.acquisition.adapter().is_simulated()
    }

    /// Acquires the dark, white, reference and sample stages of the standard
    /// at `index` and keeps it for the next calibration.
    #[instrument(skip(self))]
    pub fn measure_standard(&mut self, index: usize, concentration: f64) -> Result<&Standard> {
        if !concentration.is_finite() || concentration < 0.0 {
            return Err(SpectroError::InvalidParameter(format!(
                "standard concentration {concentration} must be finite and non-negative"
            )));
        }
        let measurement = self.measure(|kind| Stage::standard(index, concentration, kind))?;
        self.standards.push(Standard { concentration, measurement });
        info!(index, concentration, total = self.standards.len(), "Standard measured");

        let last = self.standards.len() - 1;
        Ok(&self.standards[last])
    }

    /// Acquires the four stages of the unknown sample.
    #[instrument(skip(self))]
    pub fn measure_unknown(&mut self) -> Result<Measurement> {
        self.measure(Stage::of_kind)
    }

    pub fn absorbance(&self, measurement: &Measurement) -> Result<AbsorbanceStats> {
        self.engine
            .compute(&measurement.dark, &measurement.reference, &measurement.sample)
    }

    /// Fits and validates a curve over the standards measured so far.
    ///
    /// A curve failing validation is still returned; its issues are listed in
    /// the report.
    #[instrument(skip(self))]
    pub fn build_calibration(&self, name: &str) -> Result<CalibrationReport> {
        let points = self
            .standards
            .iter()
            .map(|standard| {
                let stats = self.absorbance(&standard.measurement)?;
                Ok(CalibrationPoint::new(standard.concentration, stats.a_mean, stats.a_sd))
            })
            .collect::<Result<Vec<_>>>()?;

        let curve = fit_calibration(name, &points)?;
        Ok(validate_curve(curve, points.len(), &self.params().validation))
    }

    /// Measures the unknown and inverts `curve` for it.
    #[instrument(skip(self, curve), fields(curve = %curve.name))]
    pub fn estimate(&mut self, curve: &CalibrationCurve) -> Result<ConcentrationResult> {
        let measurement = self.measure_unknown()?;
        self.estimate_measurement(curve, &measurement)
    }

    pub fn estimate_measurement(
        &self,
        curve: &CalibrationCurve,
        measurement: &Measurement,
    ) -> Result<ConcentrationResult> {
        let stats = self.absorbance(measurement)?;
        ConcentrationEstimator::new(curve.clone(), self.params().drift_tolerance)
            .estimate(&stats, measurement.saturated)
    }

    /// Measures every configured standard, fits the curve named `name`, and
    /// estimates the unknown.
    #[instrument(skip(self))]
    pub fn run(&mut self, name: &str) -> Result<AnalysisReport> {
        let concentrations: Vec<f64> = self
            .params()
            .standards
            .iter()
            .map(|standard| standard.concentration)
            .collect();
        if concentrations.is_empty() {
            return Err(SpectroError::InsufficientData(
                "no standards configured for calibration".to_string(),
            ));
        }

        self.standards.clear();
        for (index, concentration) in concentrations.into_iter().enumerate() {
            self.measure_standard(index, concentration)?;
        }

        let report = self.build_calibration(name)?;
        if !report.is_accepted() {
            warn!(
                curve = name,
                issues = report.issues.len(),
                "Using calibration despite validation issues"
            );
        }

        let mut result = self.estimate(&report.curve)?;
        result.quality.saturation |= self
            .standards
            .iter()
            .any(|standard| standard.measurement.saturated);

        info!(
            curve = name,
            concentration = result.concentration,
            low = result.ci95.low,
            high = result.ci95.high,
            warnings = result.quality.has_warnings(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            result,
            curve: report.curve.name.clone(),
            issues: report.messages(),
            simulated: self.is_simulated(),
        })
    }

    fn measure(&mut self, stage_for: impl Fn(StageKind) -> Stage) -> Result<Measurement> {
        let mut matrices = Vec::with_capacity(StageKind::QUARTET.len());
        let mut saturated = false;
        let mut out_of_range = 0;

        for kind in StageKind::QUARTET {
            let outcome = self.acquisition.acquire(&stage_for(kind))?;
            saturated |= outcome.is_saturated();
            out_of_range += outcome.out_of_range.len();
            matrices.push(self.prepare(outcome)?);
        }

        let mut matrices = matrices.into_iter();
        let mut next = || {
            matrices
                .next()
                .ok_or_else(|| SpectroError::InsufficientData("missing stage spectra".to_string()))
        };
        Ok(Measurement {
            dark: next()?,
            white: next()?,
            reference: next()?,
            sample: next()?,
            saturated,
            out_of_range,
        })
    }

    /// Checks the spectrum width against the device's wavelength mapping and
    /// resamples to the canonical length when enabled.
    fn prepare(&self, outcome: StageOutcome) -> Result<SpectralMatrix> {
        let expected = self.acquisition.profile().wavelength.columns;
        if outcome.matrix.columns() != expected {
            return Err(SpectroError::InvalidParameter(format!(
                "stage '{}' spectra are {} columns wide, wavelength mapping covers {expected}",
                outcome.stage,
                outcome.matrix.columns()
            )));
        }

        let params = self.params();
        if !params.resample {
            return Ok(outcome.matrix);
        }
        let _span = tracing::debug_span!("resample", to = params.canonical_length).entered();
        outcome.matrix.resampled(params.canonical_length)
    }
}

fn working_mapping(params: &AnalysisParams, mapping: &PixelToWavelength) -> Result<PixelToWavelength> {
    if params.resample {
        mapping.rescaled(params.canonical_length)
    } else {
        Ok(*mapping)
    }
}
