use serde::{Deserialize, Serialize};

use crate::spectro_pipeline::common::error::Result;
use crate::spectro_pipeline::capture::payload::RawCapture;
use crate::spectro_pipeline::frame::Roi;

/// Backend identifiers the adapter accepts during discovery.
pub const RECOGNIZED_BACKENDS: &[&str] = &[
    "spectro-camera",
    "camera2-burst",
    "avfoundation-burst",
    "vision-camera",
    "simulator",
];

/// Manual camera settings applied before a burst, usually from a device profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraMetadata {
    #[serde(default)]
    pub iso: Option<u32>,
    #[serde(default)]
    pub shutter_ms: Option<f64>,
    /// White balance color temperature in kelvin
    #[serde(default)]
    pub white_balance: Option<u32>,
}

/// Optional camera controls a backend implements.
///
/// Read once when the adapter is built; controls left `false` are never called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendCapabilities {
    pub exposure_lock: bool,
    pub iso_lock: bool,
    pub white_balance_lock: bool,
    pub manual_iso: bool,
    pub shutter_control: bool,
    pub manual_white_balance: bool,
}

impl BackendCapabilities {
    pub fn any_lock(&self) -> bool {
        self.exposure_lock || self.iso_lock || self.white_balance_lock
    }
}

/// Parameters of one burst capture.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstRequest {
    pub stage: String,
    pub frame_count: usize,
    pub roi: Option<Roi>,
    pub metadata: CameraMetadata,
}

/// Platform camera able to capture bursts of raw frames.
///
/// Only `capture_burst` is mandatory. Lock, unlock and setter methods default
/// to no-ops and are only invoked when [`BackendCapabilities`] advertises them.
pub trait CaptureBackend {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    /// Whether frames are synthesized rather than read from a sensor.
    fn is_simulated(&self) -> bool {
        false
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::default()
    }

    fn capture_burst(&mut self, request: &BurstRequest) -> Result<RawCapture>;

    fn lock_exposure(&mut self) -> Result<()> {
        Ok(())
    }

    fn unlock_exposure(&mut self) -> Result<()> {
        Ok(())
    }

    fn lock_iso(&mut self) -> Result<()> {
        Ok(())
    }

    fn unlock_iso(&mut self) -> Result<()> {
        Ok(())
    }

    fn lock_white_balance(&mut self) -> Result<()> {
        Ok(())
    }

    fn unlock_white_balance(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_iso(&mut self, _iso: u32) -> Result<()> {
        Ok(())
    }

    fn set_shutter_ms(&mut self, _shutter_ms: f64) -> Result<()> {
        Ok(())
    }

    fn set_white_balance(&mut self, _kelvin: u32) -> Result<()> {
        Ok(())
    }
}
