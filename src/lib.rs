//! Acquisition and calibration engine for smartphone UV-Vis spectrophotometry.
//!
//! Raw camera bursts are reduced to spectra, converted to absorbance, fitted
//! against known standards and inverted to estimate unknown concentrations.

pub mod logger;
pub mod spectro_pipeline;
