//! Analysis configuration module
//!
//! Run parameters, tunable quality policies, and the per-device profile.

pub mod params;
pub mod policy;
pub mod profile;

pub use params::{AnalysisParams, AnalysisParamsBuilder, IntegrationMode, StandardSpec};
pub use policy::{ExposureBounds, ExposurePolicy, ValidationPolicy};
pub use profile::{CalibrationQuality, DeviceProfile};
