//! Capture result decoding
//!
//! Backends hand frames back in several encodings. Each encoding is one
//! [`FramePayload`] variant with its own decoder; a burst is decoded once into
//! a [`CapturedBurst`] of typed [`Frame`]s.

use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;
use tracing::debug;

use crate::spectro_pipeline::common::error::{Result, SpectroError};
use crate::spectro_pipeline::frame::{Frame, FrameBuffer};

/// Field names a nested frame object may carry its samples under.
const NESTED_FIELDS: [&str; 3] = ["pixels", "data", "buffer"];

/// One frame as returned by a backend, before decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    Bytes(Vec<u8>),
    Words(Vec<u16>),
    Floats(Vec<f32>),
    /// Untyped numeric array, typically from a JSON bridge
    Numbers(Vec<f64>),
    /// Base64 encoded 8-bit samples, optionally as a `data:` URL
    Base64(String),
    /// Samples wrapped in an object that may carry its own dimensions
    Nested {
        width: Option<usize>,
        height: Option<usize>,
        payload: Box<FramePayload>,
    },
}

/// Burst as returned by a backend. Dimensions may be absent at this level when
/// every frame carries them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCapture {
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub frames: Vec<FramePayload>,
}

/// Decoded burst with uniform frames.
#[derive(Debug, Clone)]
pub struct CapturedBurst {
    pub width: usize,
    pub height: usize,
    pub frames: Vec<Frame>,
    /// Frames came from the synthetic backend rather than a camera
    pub simulated: bool,
}

impl FramePayload {
    fn dimensions(&self) -> (Option<usize>, Option<usize>) {
        match self {
            FramePayload::Nested { width, height, payload } => {
                let (inner_w, inner_h) = payload.dimensions();
                (width.or(inner_w), height.or(inner_h))
            }
            _ => (None, None),
        }
    }

    fn into_buffer(self) -> Result<FrameBuffer> {
        match self {
            FramePayload::Bytes(values) => Ok(FrameBuffer::U8(values)),
            FramePayload::Words(values) => Ok(FrameBuffer::U16(values)),
            FramePayload::Floats(values) => Ok(FrameBuffer::F32(values)),
            FramePayload::Numbers(values) => Ok(decode_numbers(values)),
            FramePayload::Base64(encoded) => decode_base64(&encoded).map(FrameBuffer::U8),
            FramePayload::Nested { payload, .. } => payload.into_buffer(),
        }
    }

    /// Parses one frame from bridge JSON: an array of numbers, a base64
    /// string, or an object holding one of those under `pixels`, `data` or
    /// `buffer` next to optional `width`/`height`.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|v| {
                    v.as_f64().ok_or_else(|| {
                        SpectroError::MalformedCapture(format!("non-numeric sample {v}"))
                    })
                })
                .collect::<Result<Vec<f64>>>()
                .map(FramePayload::Numbers),
            Value::String(encoded) => Ok(FramePayload::Base64(encoded.clone())),
            Value::Object(map) => {
                let inner = NESTED_FIELDS
                    .iter()
                    .find_map(|field| map.get(*field))
                    .ok_or_else(|| {
                        SpectroError::MalformedCapture(
                            "frame object has no pixels/data/buffer field".to_string(),
                        )
                    })?;
                Ok(FramePayload::Nested {
                    width: json_dimension(map.get("width")),
                    height: json_dimension(map.get("height")),
                    payload: Box::new(Self::from_json(inner)?),
                })
            }
            other => Err(SpectroError::MalformedCapture(format!(
                "unsupported frame encoding: {other}"
            ))),
        }
    }
}

impl RawCapture {
    pub fn new(width: usize, height: usize, frames: Vec<FramePayload>) -> Self {
        Self { width: Some(width), height: Some(height), frames }
    }

    /// Parses a capture result from bridge JSON, either `{width, height,
    /// frames: [...]}` or a bare array of frames.
    pub fn from_json(value: &Value) -> Result<Self> {
        let (width, height, frames) = match value {
            Value::Array(frames) => (None, None, frames),
            Value::Object(map) => {
                let frames = map.get("frames").and_then(Value::as_array).ok_or_else(|| {
                    SpectroError::MalformedCapture("capture result has no frames".to_string())
                })?;
                (json_dimension(map.get("width")), json_dimension(map.get("height")), frames)
            }
            _ => {
                return Err(SpectroError::MalformedCapture(
                    "capture result is neither an object nor an array".to_string(),
                ));
            }
        };
        let frames = frames
            .iter()
            .map(FramePayload::from_json)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { width, height, frames })
    }

    /// Decodes every frame. Fails when there are no frames, when dimensions
    /// cannot be determined, or when a frame holds fewer samples than pixels.
    pub fn decode(self, simulated: bool) -> Result<CapturedBurst> {
        if self.frames.is_empty() {
            return Err(SpectroError::MalformedCapture("no frames in capture result".to_string()));
        }

        let (first_w, first_h) = self.frames[0].dimensions();
        let (width, height) = match (self.width.or(first_w), self.height.or(first_h)) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            (w, h) => {
                return Err(SpectroError::MalformedCapture(format!(
                    "cannot determine frame dimensions (width={w:?}, height={h:?})"
                )));
            }
        };

        let mut frames = Vec::with_capacity(self.frames.len());
        for (index, payload) in self.frames.into_iter().enumerate() {
            let (frame_w, frame_h) = payload.dimensions();
            let (frame_w, frame_h) = (frame_w.unwrap_or(width), frame_h.unwrap_or(height));
            let buffer = payload.into_buffer()?;
            if buffer.len() < frame_w * frame_h {
                return Err(SpectroError::MalformedCapture(format!(
                    "frame {index} holds {} samples, expected at least {}",
                    buffer.len(),
                    frame_w * frame_h
                )));
            }
            frames.push(Frame::new(frame_w, frame_h, buffer));
        }

        debug!("Decoded burst: {} frames of {}x{}", frames.len(), width, height);
        Ok(CapturedBurst { width, height, frames, simulated })
    }
}

fn json_dimension(value: Option<&Value>) -> Option<usize> {
    value.and_then(Value::as_u64).map(|v| v as usize)
}

/// Integer samples become the narrowest integer buffer that holds them;
/// anything fractional is kept as normalized floats.
fn decode_numbers(values: Vec<f64>) -> FrameBuffer {
    let integral = values.iter().all(|v| v.is_finite() && v.fract() == 0.0 && *v >= 0.0);
    let max = values.iter().copied().fold(0.0, f64::max);
    if integral && max <= u8::MAX as f64 {
        FrameBuffer::U8(values.into_iter().map(|v| v as u8).collect())
    } else if integral && max <= u16::MAX as f64 {
        FrameBuffer::U16(values.into_iter().map(|v| v as u16).collect())
    } else {
        FrameBuffer::F32(values.into_iter().map(|v| v as f32).collect())
    }
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    let body = match encoded.split_once(";base64,") {
        Some((_, body)) => body,
        None => encoded,
    };
    general_purpose::STANDARD
        .decode(body.trim())
        .map_err(|e| SpectroError::MalformedCapture(format!("invalid base64 frame: {e}")))
}
