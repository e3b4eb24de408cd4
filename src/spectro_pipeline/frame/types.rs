//! Raw frame data types

/// Pixel storage as delivered by the capture backend.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBuffer {
    /// 8-bit samples, either mono or interleaved RGBA
    U8(Vec<u8>),
    /// 16-bit mono samples
    U16(Vec<u16>),
    /// Normalized float samples (0.0 - 1.0)
    F32(Vec<f32>),
}

impl FrameBuffer {
    pub fn len(&self) -> usize {
        match self {
            FrameBuffer::U8(values) => values.len(),
            FrameBuffer::U16(values) => values.len(),
            FrameBuffer::F32(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at a flat sample index, widened to `f64`.
    #[inline]
    pub fn value(&self, index: usize) -> f64 {
        match self {
            FrameBuffer::U8(values) => values[index] as f64,
            FrameBuffer::U16(values) => values[index] as f64,
            FrameBuffer::F32(values) => values[index] as f64,
        }
    }
}

/// One captured camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Width of the frame in pixels
    pub width: usize,
    /// Height of the frame in pixels
    pub height: usize,
    /// Pixel samples, row-major
    pub buffer: FrameBuffer,
}

impl Frame {
    pub fn new(width: usize, height: usize, buffer: FrameBuffer) -> Self {
        Self { width, height, buffer }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}
