use tracing::{debug, info, instrument, warn};

use crate::spectro_pipeline::common::error::Result;
use crate::spectro_pipeline::capture::backend::{
    BackendCapabilities, BurstRequest, CameraMetadata, CaptureBackend, RECOGNIZED_BACKENDS,
};
use crate::spectro_pipeline::capture::payload::{CapturedBurst, RawCapture};
use crate::spectro_pipeline::capture::simulator::{SimulatorConfig, SpectrumSimulator};
use crate::spectro_pipeline::frame::Roi;
use crate::spectro_pipeline::stage::Stage;

/// Owns the capture backend resolved at construction and captures bursts
/// with the camera's automatic controls locked.
pub struct CaptureAdapter {
    backend: Box<dyn CaptureBackend>,
    capabilities: BackendCapabilities,
    simulated: bool,
}

impl CaptureAdapter {
    /// Uses an explicitly injected backend. Bursts are flagged as simulated
    /// when the backend says it synthesizes its frames.
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        let capabilities = backend.capabilities();
        let simulated = backend.is_simulated();
        info!(
            backend = backend.name(),
            simulated,
            ?capabilities,
            "Capture backend resolved"
        );
        Self { backend, capabilities, simulated }
    }

    /// Uses the synthetic backend; every burst is flagged as simulated.
    pub fn simulated(config: SimulatorConfig) -> Self {
        Self::new(Box::new(SpectrumSimulator::new(config)))
    }

    /// Picks the first recognized, available candidate, or falls back to the
    /// simulator with a warning.
    pub fn discover(candidates: Vec<Box<dyn CaptureBackend>>) -> Self {
        let found = candidates.into_iter().find(|candidate| {
            let recognized = RECOGNIZED_BACKENDS.iter().any(|known| *known == candidate.name());
            if !recognized {
                debug!("Ignoring unrecognized capture backend '{}'", candidate.name());
            }
            recognized && candidate.is_available()
        });

        match found {
            Some(backend) => Self::new(backend),
            None => {
                warn!("No camera backend available, falling back to simulated spectra");
                Self::simulated(SimulatorConfig::default())
            }
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    /// Captures `frame_count` frames for `stage` and decodes them.
    ///
    /// Locks are taken before the burst and released when the guard drops,
    /// which also happens when the backend or the decoder fails.
    #[instrument(skip(self, stage, roi, metadata), fields(stage = %stage, backend = self.backend.name()))]
    pub fn capture(
        &mut self,
        stage: &Stage,
        frame_count: usize,
        roi: Option<Roi>,
        metadata: &CameraMetadata,
    ) -> Result<CapturedBurst> {
        let request = BurstRequest {
            stage: stage.name.clone(),
            frame_count,
            roi,
            metadata: metadata.clone(),
        };

        let raw = {
            let mut guard = CameraLockGuard::acquire(self.backend.as_mut(), self.capabilities, metadata);
            if self.capabilities.any_lock() && !guard.holds_any() {
                warn!("No camera lock could be taken, exposure may drift during the burst");
            }
            guard.capture_burst(&request)?
        };

        raw.decode(self.simulated)
    }
}

/// Camera locks held for the duration of one burst.
///
/// Every lock that was successfully taken is released on drop, in reverse
/// order. Lock and unlock failures are logged and otherwise ignored.
pub struct CameraLockGuard<'a> {
    backend: &'a mut dyn CaptureBackend,
    exposure: bool,
    iso: bool,
    white_balance: bool,
}

impl<'a> CameraLockGuard<'a> {
    pub fn acquire(
        backend: &'a mut dyn CaptureBackend,
        capabilities: BackendCapabilities,
        metadata: &CameraMetadata,
    ) -> Self {
        let mut guard = Self {
            backend,
            exposure: false,
            iso: false,
            white_balance: false,
        };

        if capabilities.exposure_lock {
            guard.exposure = log_failure("lock exposure", guard.backend.lock_exposure());
        }
        if capabilities.iso_lock {
            guard.iso = log_failure("lock ISO", guard.backend.lock_iso());
        }
        if capabilities.white_balance_lock {
            guard.white_balance = log_failure("lock white balance", guard.backend.lock_white_balance());
        }

        if let (true, Some(iso)) = (capabilities.manual_iso, metadata.iso) {
            log_failure("set ISO", guard.backend.set_iso(iso));
        }
        if let (true, Some(shutter_ms)) = (capabilities.shutter_control, metadata.shutter_ms) {
            log_failure("set shutter", guard.backend.set_shutter_ms(shutter_ms));
        }
        if let (true, Some(kelvin)) = (capabilities.manual_white_balance, metadata.white_balance) {
            log_failure("set white balance", guard.backend.set_white_balance(kelvin));
        }

        guard
    }

    /// Whether at least one lock is held until drop.
    pub fn holds_any(&self) -> bool {
        self.exposure || self.iso || self.white_balance
    }

    pub fn capture_burst(&mut self, request: &BurstRequest) -> Result<RawCapture> {
        self.backend.capture_burst(request)
    }
}

impl Drop for CameraLockGuard<'_> {
    fn drop(&mut self) {
        if self.white_balance {
            log_failure("unlock white balance", self.backend.unlock_white_balance());
        }
        if self.iso {
            log_failure("unlock ISO", self.backend.unlock_iso());
        }
        if self.exposure {
            log_failure("unlock exposure", self.backend.unlock_exposure());
        }
    }
}

fn log_failure(action: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("Camera control '{}' failed: {}", action, e);
            false
        }
    }
}
