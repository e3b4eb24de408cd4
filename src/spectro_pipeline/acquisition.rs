//! Stage acquisition module
//!
//! Captures one burst per stage, checks every frame for clipping and exposure,
//! and reduces frames to column spectra.

mod stats;
mod pipeline;


pub use stats::{RoiStats, scan_frame};
pub use pipeline::{StageAcquisition, StageOutcome};
