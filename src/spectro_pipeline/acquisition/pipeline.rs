use tracing::{debug, info, instrument, warn};

use crate::spectro_pipeline::{
    acquisition::stats::{RoiStats, scan_frame},
    capture::{CaptureAdapter, CapturedBurst},
    common::error::{Result, SpectroError},
    config::{AnalysisParams, DeviceProfile},
    frame::{FrameLayout, Roi, normalize_roi},
    spectrum::SpectralMatrix,
    stage::Stage,
};

/// Result of acquiring one stage.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: Stage,
    pub layout: FrameLayout,
    pub roi: Roi,
    /// One column spectrum per processed frame, ROI width wide
    pub matrix: SpectralMatrix,
    pub frame_stats: Vec<RoiStats>,
    /// Frames whose mean fell outside the stage's exposure bounds
    pub out_of_range: Vec<usize>,
    /// Saturated frames; only non-empty when saturation does not abort
    pub saturated: Vec<usize>,
    pub simulated: bool,
}

impl StageOutcome {
    pub fn is_saturated(&self) -> bool {
        !self.saturated.is_empty()
    }
}

/// Drives the capture adapter one stage at a time.
pub struct StageAcquisition {
    adapter: CaptureAdapter,
    params: AnalysisParams,
    profile: DeviceProfile,
}

impl StageAcquisition {
    pub fn new(adapter: CaptureAdapter, params: AnalysisParams, profile: DeviceProfile) -> Self {
        Self { adapter, params, profile }
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn adapter(&self) -> &CaptureAdapter {
        &self.adapter
    }

    /// Captures a burst for `stage` and reduces it to spectra.
    #[instrument(skip(self, stage), fields(stage = %stage))]
    pub fn acquire(&mut self, stage: &Stage) -> Result<StageOutcome> {
        let burst = {
            let _span = tracing::info_span!("capture_burst", frames = self.params.frames_per_burst).entered();
            self.adapter.capture(
                stage,
                self.params.frames_per_burst,
                self.profile.roi,
                &self.profile.camera,
            )?
        };
        self.process_burst(stage, burst)
    }

    /// Checks and reduces an already captured burst.
    ///
    /// Saturation of any frame fails the stage at that frame unless the run
    /// disables `abort_on_saturation`. Out-of-range exposure only warns.
    pub fn process_burst(&self, stage: &Stage, burst: CapturedBurst) -> Result<StageOutcome> {
        let Some(first) = burst.frames.first() else {
            return Err(SpectroError::MalformedCapture(format!(
                "stage '{}' returned no frames",
                stage
            )));
        };
        if burst.width == 0 || burst.height == 0 {
            return Err(SpectroError::InvalidDimensions(burst.width, burst.height));
        }

        let layout = FrameLayout::infer(first);
        let roi = normalize_roi(self.profile.roi, burst.width, burst.height);
        let ceiling = self.params.exposure.saturation_ceiling(layout.max_value);
        let bounds = self.params.exposure_bounds(stage);

        debug!(
            ?layout,
            roi_x = roi.x(),
            roi_y = roi.y(),
            roi_w = roi.width(),
            roi_h = roi.height(),
            ceiling,
            "Processing burst"
        );

        let frame_count = burst.frames.len().min(self.params.frames_per_burst);
        let mut matrix = SpectralMatrix::with_capacity(roi.width(), frame_count);
        let mut frame_stats = Vec::with_capacity(frame_count);
        let mut out_of_range = Vec::new();
        let mut saturated = Vec::new();

        for (index, frame) in burst.frames.iter().take(frame_count).enumerate() {
            if frame.width != burst.width || frame.height != burst.height {
                return Err(SpectroError::MalformedCapture(format!(
                    "frame {index} is {}x{}, burst is {}x{}",
                    frame.width, frame.height, burst.width, burst.height
                )));
            }
            if frame.buffer.len() < layout.expected_len(frame.width, frame.height) {
                return Err(SpectroError::MalformedCapture(format!(
                    "frame {index} holds {} samples, layout needs {}",
                    frame.buffer.len(),
                    layout.expected_len(frame.width, frame.height)
                )));
            }

            let (stats, spectrum) = scan_frame(frame, &layout, &roi);

            if stats.peak >= ceiling {
                if self.params.abort_on_saturation {
                    warn!(
                        frame = index,
                        peak = stats.peak,
                        ceiling,
                        "Saturated frame, aborting stage"
                    );
                    return Err(SpectroError::Saturation {
                        stage: stage.name.clone(),
                        frames: vec![index],
                    });
                }
                saturated.push(index);
            }

            if !bounds.contains(stats.mean / layout.max_value) {
                out_of_range.push(index);
            }

            matrix.push_row(&spectrum)?;
            frame_stats.push(stats);
        }

        if !saturated.is_empty() {
            warn!(
                stage = %stage,
                frames = ?saturated,
                "Saturated frames kept because abort_on_saturation is disabled"
            );
        }
        if !out_of_range.is_empty() {
            warn!(
                stage = %stage,
                frames = ?out_of_range,
                bit_depth = layout.bit_depth,
                min_fraction = bounds.min_fraction,
                max_fraction = bounds.max_fraction,
                "Exposure out of expected range"
            );
        }

        info!(
            stage = %stage,
            frames = matrix.rows(),
            columns = matrix.columns(),
            simulated = burst.simulated,
            "Stage acquired"
        );

        Ok(StageOutcome {
            stage: stage.clone(),
            layout,
            roi,
            matrix,
            frame_stats,
            out_of_range,
            saturated,
            simulated: burst.simulated,
        })
    }
}
