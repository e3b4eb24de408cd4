use crate::spectro_pipeline::frame::{Frame, FrameLayout, Roi};

/// Intensity statistics of a frame inside its ROI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Brightest single channel value (equals `max` for mono frames)
    pub peak: f64,
}

/// Single pass over the ROI returning its statistics and the column spectrum.
///
/// The spectrum sums (not averages) every ROI row per column. The ROI must
/// already be normalized against the frame.
pub fn scan_frame(frame: &Frame, layout: &FrameLayout, roi: &Roi) -> (RoiStats, Vec<f64>) {
    let (x0, y0) = (roi.x(), roi.y());
    let (w, h) = (roi.width(), roi.height());

    let mut columns = vec![0.0; w];
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut peak = f64::NEG_INFINITY;
    let mut total = 0.0;

    for y in y0..y0 + h {
        for (col, x) in (x0..x0 + w).enumerate() {
            let value = layout.intensity(frame, x, y);
            min = min.min(value);
            max = max.max(value);
            peak = peak.max(layout.peak(frame, x, y));
            total += value;
            columns[col] += value;
        }
    }

    let count = (w * h).max(1) as f64;
    let stats = if w * h == 0 {
        RoiStats { min: 0.0, max: 0.0, mean: 0.0, peak: 0.0 }
    } else {
        RoiStats { min, max, mean: total / count, peak }
    };
    (stats, columns)
}
