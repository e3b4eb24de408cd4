use crate::spectro_pipeline::frame::types::{Frame, FrameBuffer};

/// How samples are packed in a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelEncoding {
    Mono8,
    Mono16,
    MonoF32,
    /// Four interleaved channels (RGBA)
    Rgba,
}

/// Read-only description of a frame's pixel layout.
///
/// Inferred once per burst from the first frame and shared by every frame in
/// that burst. Unknown buffers fall back to the 8-bit mono interpretation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLayout {
    pub encoding: PixelEncoding,
    /// Samples between two horizontally adjacent pixels
    pub pixel_stride: usize,
    /// Samples between two vertically adjacent pixels
    pub row_stride: usize,
    pub channels: usize,
    pub bit_depth: u32,
    /// Largest representable sample value
    pub max_value: f64,
}

const RGBA_CHANNELS: usize = 4;

impl FrameLayout {
    pub fn infer(frame: &Frame) -> Self {
        let pixels = frame.pixel_count();
        let (bit_depth, max_value, mono) = match &frame.buffer {
            FrameBuffer::U8(_) => (8, u8::MAX as f64, PixelEncoding::Mono8),
            FrameBuffer::U16(_) => (16, u16::MAX as f64, PixelEncoding::Mono16),
            FrameBuffer::F32(_) => (32, 1.0, PixelEncoding::MonoF32),
        };

        if pixels > 0 && frame.buffer.len() == pixels * RGBA_CHANNELS {
            return Self {
                encoding: PixelEncoding::Rgba,
                pixel_stride: RGBA_CHANNELS,
                row_stride: frame.width * RGBA_CHANNELS,
                channels: RGBA_CHANNELS,
                bit_depth,
                max_value,
            };
        }

        Self {
            encoding: mono,
            pixel_stride: 1,
            row_stride: frame.width,
            channels: 1,
            bit_depth,
            max_value,
        }
    }

    /// Intensity of pixel `(x, y)`: the sample itself for mono frames, the RGB
    /// mean for RGBA frames (alpha ignored).
    #[inline]
    pub fn intensity(&self, frame: &Frame, x: usize, y: usize) -> f64 {
        let base = y * self.row_stride + x * self.pixel_stride;
        match self.encoding {
            PixelEncoding::Rgba => {
                (frame.buffer.value(base)
                    + frame.buffer.value(base + 1)
                    + frame.buffer.value(base + 2))
                    / 3.0
            }
            _ => frame.buffer.value(base),
        }
    }

    /// Brightest channel of pixel `(x, y)`, which is what clips first.
    #[inline]
    pub fn peak(&self, frame: &Frame, x: usize, y: usize) -> f64 {
        let base = y * self.row_stride + x * self.pixel_stride;
        match self.encoding {
            PixelEncoding::Rgba => frame
                .buffer
                .value(base)
                .max(frame.buffer.value(base + 1))
                .max(frame.buffer.value(base + 2)),
            _ => frame.buffer.value(base),
        }
    }

    /// Number of samples a frame of this layout must hold.
    pub fn expected_len(&self, width: usize, height: usize) -> usize {
        width * height * self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_rgba_from_length() {
        let frame = Frame::new(4, 2, FrameBuffer::U8(vec![0; 4 * 2 * 4]));
        let layout = FrameLayout::infer(&frame);
        assert_eq!(layout.encoding, PixelEncoding::Rgba);
        assert_eq!(layout.channels, 4);
        assert_eq!(layout.bit_depth, 8);
        assert_eq!(layout.row_stride, 16);
        assert_eq!(layout.max_value, 255.0);
    }

    #[test]
    fn test_infer_mono_by_element_type() {
        let mono8 = FrameLayout::infer(&Frame::new(3, 3, FrameBuffer::U8(vec![0; 9])));
        let mono16 = FrameLayout::infer(&Frame::new(3, 3, FrameBuffer::U16(vec![0; 9])));
        let float = FrameLayout::infer(&Frame::new(3, 3, FrameBuffer::F32(vec![0.0; 9])));

        assert_eq!(mono8.encoding, PixelEncoding::Mono8);
        assert_eq!(mono16.encoding, PixelEncoding::Mono16);
        assert_eq!(mono16.max_value, 65535.0);
        assert_eq!(float.encoding, PixelEncoding::MonoF32);
        assert_eq!(float.max_value, 1.0);
    }

    #[test]
    fn test_empty_frame_defaults_to_mono8() {
        let layout = FrameLayout::infer(&Frame::new(0, 0, FrameBuffer::U8(Vec::new())));
        assert_eq!(layout.encoding, PixelEncoding::Mono8);
        assert_eq!(layout.bit_depth, 8);
    }

    #[test]
    fn test_rgba_intensity_and_peak() {
        let frame = Frame::new(1, 1, FrameBuffer::U8(vec![30, 60, 90, 255]));
        let layout = FrameLayout::infer(&frame);
        assert_eq!(layout.intensity(&frame, 0, 0), 60.0);
        assert_eq!(layout.peak(&frame, 0, 0), 90.0);
    }
}
