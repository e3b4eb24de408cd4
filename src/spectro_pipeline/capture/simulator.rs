//! Synthetic capture backend used when no camera is present.

use std::f64::consts::PI;
use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::spectro_pipeline::common::error::Result;
use crate::spectro_pipeline::capture::backend::{BurstRequest, CaptureBackend};
use crate::spectro_pipeline::capture::payload::{FramePayload, RawCapture};
use crate::spectro_pipeline::frame::Roi;
use crate::spectro_pipeline::stage::{Stage, StageKind};

/// Sensor offset present in every synthetic stage.
const DARK_LEVEL: f64 = 4.0;
const REFERENCE_BASELINE: f64 = 120.0;
const WHITE_BASELINE: f64 = 260.0;

const DARK_NOISE: f64 = 0.8;
const REFERENCE_NOISE: f64 = 2.0;
const WHITE_NOISE: f64 = 3.0;

/// Flat floor of the lamp spectrum relative to its peak.
const SPECTRUM_FLOOR: f64 = 0.35;

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub seed: u64,
    /// Spectrum width when the request carries no ROI
    pub default_columns: usize,
    /// Frame height without a ROI; each lit pixel carries `1 / rows` of its
    /// column's level
    pub rows: usize,
    /// Peak position as a fraction of the width
    pub peak_position: f64,
    /// Gaussian sigma as a fraction of the width
    pub peak_width: f64,
    /// Absorbance per concentration unit for simulated standards
    pub absorptivity: f64,
    /// Absorbance of the sample matrix at zero concentration
    pub blank_absorbance: f64,
    /// Concentration used for sample stages that do not name one
    pub unknown_concentration: f64,
    pub frame_delay: Option<Duration>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            default_columns: 640,
            rows: 2,
            peak_position: 0.5,
            peak_width: 0.18,
            absorptivity: 0.8,
            blank_absorbance: 0.02,
            unknown_concentration: 0.25,
            frame_delay: None,
        }
    }
}

/// Where the spectrum lands in a synthetic frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    columns: usize,
    rows: usize,
}

/// Backend producing plausible 8-bit spectra for any stage name.
///
/// Frames are full sensor frames: with a ROI they extend to `x + w` by
/// `y + h` and the spectrum fills exactly the ROI, so the acquisition stage
/// crops them the same way it crops real camera frames.
pub struct SpectrumSimulator {
    config: SimulatorConfig,
    rng: StdRng,
}

impl SpectrumSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    /// Noise-free column spectrum for `stage` at `columns` samples.
    pub fn column_spectrum(&self, stage: &Stage, columns: usize) -> Vec<f64> {
        let center = self.config.peak_position * columns as f64;
        let sigma = (self.config.peak_width * columns as f64).max(1.0);
        let transmittance = match stage.kind {
            StageKind::Sample => {
                let c = stage
                    .concentration()
                    .unwrap_or(self.config.unknown_concentration);
                10f64.powf(-(self.config.absorptivity * c + self.config.blank_absorbance))
            }
            _ => 1.0,
        };
        let baseline = match stage.kind {
            StageKind::Dark => 0.0,
            StageKind::White => WHITE_BASELINE,
            StageKind::Reference | StageKind::Sample => REFERENCE_BASELINE,
        };

        (0..columns)
            .map(|x| {
                let z = (x as f64 - center) / sigma;
                let shape = SPECTRUM_FLOOR + (1.0 - SPECTRUM_FLOOR) * (-0.5 * z * z).exp();
                DARK_LEVEL + baseline * shape * transmittance
            })
            .collect()
    }

    fn placement(&self, roi: Option<Roi>) -> Placement {
        let Some(roi) = roi else {
            let rows = self.config.rows.max(1);
            return Placement {
                width: self.config.default_columns,
                height: rows,
                x: 0,
                y: 0,
                columns: self.config.default_columns,
                rows,
            };
        };

        let x = pixel_offset(roi.x);
        let y = pixel_offset(roi.y);
        let columns = pixel_span(roi.w).unwrap_or(self.config.default_columns);
        let rows = pixel_span(roi.h).unwrap_or(1);
        Placement {
            width: x + columns,
            height: y + rows,
            x,
            y,
            columns,
            rows,
        }
    }

    fn noise_for(kind: StageKind) -> f64 {
        match kind {
            StageKind::Dark => DARK_NOISE,
            StageKind::White => WHITE_NOISE,
            StageKind::Reference | StageKind::Sample => REFERENCE_NOISE,
        }
    }

    fn gaussian(&mut self, sigma: f64) -> f64 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);
        sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl Default for SpectrumSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl CaptureBackend for SpectrumSimulator {
    fn name(&self) -> &str {
        "simulator"
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn capture_burst(&mut self, request: &BurstRequest) -> Result<RawCapture> {
        let stage = Stage::new(request.stage.clone());
        let place = self.placement(request.roi);
        let spectrum = self.column_spectrum(&stage, place.columns);
        let noise = Self::noise_for(stage.kind);
        let share = self.config.rows.max(1) as f64;
        let background = to_pixel(DARK_LEVEL / share);

        debug!(
            stage = %stage,
            width = place.width,
            height = place.height,
            roi_x = place.x,
            roi_y = place.y,
            frames = request.frame_count,
            "Synthesizing burst"
        );

        let mut frames = Vec::with_capacity(request.frame_count);
        for _ in 0..request.frame_count {
            if let Some(delay) = self.config.frame_delay {
                std::thread::sleep(delay);
            }
            let mut pixels = vec![background; place.width * place.height];
            for (column, &level) in spectrum.iter().enumerate() {
                let column_value = level + self.gaussian(noise);
                for row in 0..place.rows {
                    let value = column_value / share + self.gaussian(noise * 0.1);
                    pixels[(place.y + row) * place.width + place.x + column] = to_pixel(value);
                }
            }
            frames.push(FramePayload::Bytes(pixels));
        }

        Ok(RawCapture::new(place.width, place.height, frames))
    }
}

fn to_pixel(value: f64) -> u8 {
    value.round().clamp(0.0, u8::MAX as f64) as u8
}

/// ROI start rounded to a pixel; negative or non-finite starts map to 0.
fn pixel_offset(value: f64) -> usize {
    if value.is_finite() && value > 0.0 { value.round() as usize } else { 0 }
}

/// ROI extent rounded to pixels, if it covers at least one.
fn pixel_span(value: f64) -> Option<usize> {
    let value = value.round();
    (value.is_finite() && value >= 1.0).then_some(value as usize)
}
