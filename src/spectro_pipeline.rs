//! Spectrophotometry pipeline module
//!
//! This module follows a measurement from the camera to a concentration,
//! with separate modules for capture, stage acquisition, spectral processing,
//! absorbance, calibration and estimation.

pub mod common;
pub mod frame;
pub mod stage;
pub mod capture;
pub mod acquisition;
pub mod spectrum;
pub mod absorbance;
pub mod calibration;
pub mod estimate;
pub mod config;
pub mod workflow;

pub use common::{
    Result,
    SpectroError,
};

pub use capture::{
    CaptureAdapter,
    CaptureBackend,
    SimulatorConfig,
};

pub use config::{
    AnalysisParams,
    AnalysisParamsBuilder,
    DeviceProfile,
};

pub use calibration::{
    CalibrationCurve,
    CalibrationReport,
};

pub use estimate::ConcentrationResult;

pub use workflow::{
    AnalysisReport,
    AnalysisWorkflow,
};
