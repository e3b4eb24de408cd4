use std::sync::{Arc, Mutex};

use crate::spectro_pipeline::common::error::{Result, SpectroError};
use crate::spectro_pipeline::capture::{
    BackendCapabilities, BurstRequest, CameraLockGuard, CameraMetadata, CaptureAdapter,
    CaptureBackend, FramePayload, RawCapture, SpectrumSimulator,
};
use crate::spectro_pipeline::stage::Stage;

struct MockBackend {
    name: &'static str,
    available: bool,
    capabilities: BackendCapabilities,
    fail_capture: bool,
    fail_iso_lock: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    fn new(calls: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: "spectro-camera",
            available: true,
            capabilities: BackendCapabilities {
                exposure_lock: true,
                iso_lock: true,
                white_balance_lock: true,
                manual_iso: true,
                shutter_control: false,
                manual_white_balance: true,
            },
            fail_capture: false,
            fail_iso_lock: false,
            calls,
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl CaptureBackend for MockBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    fn capture_burst(&mut self, request: &BurstRequest) -> Result<RawCapture> {
        self.record(format!("capture:{}:{}", request.stage, request.frame_count));
        if self.fail_capture {
            return Err(SpectroError::CaptureError("Mock capture error".to_string()));
        }
        let frames = (0..request.frame_count)
            .map(|_| FramePayload::Bytes(vec![40; 8]))
            .collect();
        Ok(RawCapture::new(4, 2, frames))
    }

    fn lock_exposure(&mut self) -> Result<()> {
        self.record("lock_exposure");
        Ok(())
    }

    fn unlock_exposure(&mut self) -> Result<()> {
        self.record("unlock_exposure");
        Ok(())
    }

    fn lock_iso(&mut self) -> Result<()> {
        self.record("lock_iso");
        if self.fail_iso_lock {
            return Err(SpectroError::CaptureError("ISO lock refused".to_string()));
        }
        Ok(())
    }

    fn unlock_iso(&mut self) -> Result<()> {
        self.record("unlock_iso");
        Ok(())
    }

    fn lock_white_balance(&mut self) -> Result<()> {
        self.record("lock_white_balance");
        Ok(())
    }

    fn unlock_white_balance(&mut self) -> Result<()> {
        self.record("unlock_white_balance");
        Ok(())
    }

    fn set_iso(&mut self, iso: u32) -> Result<()> {
        self.record(format!("set_iso:{iso}"));
        Ok(())
    }

    fn set_shutter_ms(&mut self, shutter_ms: f64) -> Result<()> {
        self.record(format!("set_shutter:{shutter_ms}"));
        Ok(())
    }

    fn set_white_balance(&mut self, kelvin: u32) -> Result<()> {
        self.record(format!("set_white_balance:{kelvin}"));
        Ok(())
    }
}

fn metadata() -> CameraMetadata {
    CameraMetadata {
        iso: Some(100),
        shutter_ms: Some(8.0),
        white_balance: Some(5500),
    }
}

#[test]
fn test_capture_locks_and_releases_in_order() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut adapter = CaptureAdapter::new(Box::new(MockBackend::new(calls.clone())));

    let burst = adapter
        .capture(&Stage::new("reference"), 3, None, &metadata())
        .unwrap();

    assert_eq!(burst.frames.len(), 3);
    assert!(!burst.simulated);
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "lock_exposure",
            "lock_iso",
            "lock_white_balance",
            "set_iso:100",
            "set_white_balance:5500",
            "capture:reference:3",
            "unlock_white_balance",
            "unlock_iso",
            "unlock_exposure",
        ]
    );
}

#[test]
fn test_locks_released_when_capture_fails() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut backend = MockBackend::new(calls.clone());
    backend.fail_capture = true;
    let mut adapter = CaptureAdapter::new(Box::new(backend));

    let result = adapter.capture(&Stage::new("sample"), 2, None, &CameraMetadata::default());

    assert!(matches!(result, Err(SpectroError::CaptureError(_))));
    let calls = calls.lock().unwrap();
    assert!(calls.contains(&"unlock_exposure".to_string()));
    assert!(calls.contains(&"unlock_iso".to_string()));
    assert!(calls.contains(&"unlock_white_balance".to_string()));
    assert_eq!(calls.last().map(String::as_str), Some("unlock_exposure"));
}

#[test]
fn test_failed_lock_is_not_released() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut backend = MockBackend::new(calls.clone());
    backend.fail_iso_lock = true;
    let mut adapter = CaptureAdapter::new(Box::new(backend));

    adapter
        .capture(&Stage::new("dark_noise"), 1, None, &CameraMetadata::default())
        .unwrap();

    let calls = calls.lock().unwrap();
    assert!(calls.contains(&"lock_iso".to_string()));
    assert!(!calls.contains(&"unlock_iso".to_string()));
    assert!(calls.contains(&"unlock_exposure".to_string()));
}

#[test]
fn test_unsupported_controls_are_skipped() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut backend = MockBackend::new(calls.clone());
    backend.capabilities = BackendCapabilities::default();
    let mut adapter = CaptureAdapter::new(Box::new(backend));

    adapter
        .capture(&Stage::new("white_noise"), 1, None, &metadata())
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["capture:white_noise:1"]);
}

#[test]
fn test_discover_falls_back_to_simulator() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut offline = MockBackend::new(calls.clone());
    offline.available = false;
    let mut foreign = MockBackend::new(calls.clone());
    foreign.name = "some-other-plugin";

    let mut adapter = CaptureAdapter::discover(vec![
        Box::new(offline) as Box<dyn CaptureBackend>,
        Box::new(foreign),
    ]);

    assert!(adapter.is_simulated());
    assert_eq!(adapter.backend_name(), "simulator");
    let burst = adapter
        .capture(&Stage::new("dark_noise"), 2, None, &CameraMetadata::default())
        .unwrap();
    assert!(burst.simulated);
    assert_eq!(burst.frames.len(), 2);
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_discover_prefers_available_recognized_backend() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let adapter = CaptureAdapter::discover(vec![
        Box::new(MockBackend::new(calls)) as Box<dyn CaptureBackend>,
    ]);
    assert!(!adapter.is_simulated());
    assert_eq!(adapter.backend_name(), "spectro-camera");
    assert!(adapter.capabilities().any_lock());
}

#[test]
fn test_discovered_simulator_is_flagged() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut offline = MockBackend::new(calls);
    offline.available = false;

    let mut adapter = CaptureAdapter::discover(vec![
        Box::new(offline) as Box<dyn CaptureBackend>,
        Box::new(SpectrumSimulator::default()),
    ]);

    assert_eq!(adapter.backend_name(), "simulator");
    assert!(adapter.is_simulated());
    let burst = adapter
        .capture(&Stage::new("reference"), 1, None, &CameraMetadata::default())
        .unwrap();
    assert!(burst.simulated);
}

#[test]
fn test_injected_simulator_is_flagged() {
    let adapter = CaptureAdapter::new(Box::new(SpectrumSimulator::default()));
    assert!(adapter.is_simulated());

    let calls = Arc::new(Mutex::new(Vec::new()));
    let camera = CaptureAdapter::new(Box::new(MockBackend::new(calls)));
    assert!(!camera.is_simulated());
}

#[test]
fn test_lock_guard_reports_held_locks() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut backend = MockBackend::new(calls.clone());
    let capabilities = backend.capabilities;
    {
        let guard = CameraLockGuard::acquire(&mut backend, capabilities, &CameraMetadata::default());
        assert!(guard.holds_any());
    }
    assert_eq!(calls.lock().unwrap().last().map(String::as_str), Some("unlock_exposure"));

    let mut unlocked = MockBackend::new(calls.clone());
    unlocked.capabilities = BackendCapabilities::default();
    let guard = CameraLockGuard::acquire(&mut unlocked, BackendCapabilities::default(), &metadata());
    assert!(!guard.holds_any());
}

#[test]
fn test_guard_without_any_lock_still_captures() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut backend = MockBackend::new(calls.clone());
    backend.capabilities = BackendCapabilities {
        iso_lock: true,
        ..BackendCapabilities::default()
    };
    backend.fail_iso_lock = true;
    let mut adapter = CaptureAdapter::new(Box::new(backend));

    let burst = adapter
        .capture(&Stage::new("sample"), 2, None, &CameraMetadata::default())
        .unwrap();

    assert_eq!(burst.frames.len(), 2);
    assert_eq!(*calls.lock().unwrap(), vec!["lock_iso", "capture:sample:2"]);
}
