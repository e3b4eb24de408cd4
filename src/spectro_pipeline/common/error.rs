use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectroError {
    #[error("Capture backend failed: {0}")]
    CaptureError(String),

    #[error("Malformed capture result: {0}")]
    MalformedCapture(String),

    #[error("Saturation detected in stage '{stage}' at frames {frames:?}")]
    Saturation { stage: String, frames: Vec<usize> },

    #[error("Invalid frame dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Insufficient signal: {0}")]
    InsufficientSignal(String),

    #[error("Unstable inversion: slope {0:e} is indistinguishable from zero")]
    UnstableInversion(f64),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SpectroError {
    /// Errors the user can clear by re-acquiring the stage (moving the
    /// cuvette, dimming the source, checking the camera).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SpectroError::Saturation { .. }
                | SpectroError::CaptureError(_)
                | SpectroError::InsufficientSignal(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SpectroError>;
