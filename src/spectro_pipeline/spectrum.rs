//! Spectral vectors and matrices
//!
//! One-dimensional spectra extracted from frames, their burst container, the
//! canonical-length resampler, and the pixel-to-wavelength mapping.

mod matrix;
mod resample;
mod wavelength;

pub use matrix::SpectralMatrix;
pub use resample::{resample, DEFAULT_CANONICAL_LENGTH};
pub use wavelength::PixelToWavelength;
