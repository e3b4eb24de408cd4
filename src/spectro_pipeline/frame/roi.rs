use serde::{Deserialize, Serialize};

/// Region of interest in pixel coordinates.
///
/// Fields are signed so that raw requests from a device profile can be
/// represented before [`normalize_roi`] clamps them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: f64,
    pub y: f64,
    #[serde(alias = "width")]
    pub w: f64,
    #[serde(alias = "height")]
    pub h: f64,
}

impl Roi {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    pub fn x(&self) -> usize {
        self.x as usize
    }

    pub fn y(&self) -> usize {
        self.y as usize
    }

    pub fn width(&self) -> usize {
        self.w as usize
    }

    pub fn height(&self) -> usize {
        self.h as usize
    }
}

/// Clamps a requested ROI to the bounds of a `width` x `height` frame.
///
/// Without a request the whole frame is used. The result always satisfies
/// `x + w <= width` and `y + h <= height` with `w, h >= 1` for non-empty frames.
pub fn normalize_roi(requested: Option<Roi>, width: usize, height: usize) -> Roi {
    let Some(roi) = requested else {
        return Roi::full(width, height);
    };

    let (x, w) = clamp_span(roi.x, roi.w, width);
    let (y, h) = clamp_span(roi.y, roi.h, height);
    Roi::new(x as f64, y as f64, w as f64, h as f64)
}

fn clamp_span(start: f64, len: f64, dimension: usize) -> (usize, usize) {
    if dimension == 0 {
        return (0, 0);
    }
    let start = finite_round(start).clamp(0.0, (dimension - 1) as f64) as usize;
    let len = finite_round(len).clamp(1.0, (dimension - start) as f64) as usize;
    (start, len)
}

fn finite_round(value: f64) -> f64 {
    if value.is_finite() { value.round() } else { 0.0 }
}
