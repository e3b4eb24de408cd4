//! Camera capture module
//!
//! This module abstracts the platform camera behind [`CaptureBackend`], decodes
//! whatever shape a backend returns into uniform frames, and provides a
//! synthetic backend for running the pipeline without hardware.

mod backend;
mod payload;
mod simulator;
mod adapter;

pub use backend::{
    BackendCapabilities, BurstRequest, CameraMetadata, CaptureBackend, RECOGNIZED_BACKENDS,
};
pub use payload::{CapturedBurst, FramePayload, RawCapture};
pub use simulator::{SimulatorConfig, SpectrumSimulator};
pub use adapter::{CameraLockGuard, CaptureAdapter};

#[cfg(test)]
mod tests;
