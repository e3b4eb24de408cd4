use std::path::Path;

use anyhow::Context;
use spectrocam_rs::logger;
use spectrocam_rs::spectro_pipeline::{
    AnalysisParams, AnalysisWorkflow, CaptureAdapter, DeviceProfile,
    frame::Roi,
    spectrum::PixelToWavelength,
};

use tracing::{error, info};

/// Usage: `spectrocam [params.json] [profile.json]`
///
/// Without arguments a four-standard session runs with the default simulated
/// device. No platform camera is linked into this binary, so capture always
/// falls back to the simulator.
fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting spectrocam...");

    let mut args = std::env::args().skip(1);

    let params = match args.next() {
        Some(path) => AnalysisParams::from_json_file(Path::new(&path))
            .with_context(|| format!("loading analysis parameters from {path}"))?,
        None => AnalysisParams::builder()
            .target_wavelength_nm(520.0)
            .half_window_nm(5.0)
            .frames_per_burst(10)
            .standards(&[0.1, 0.2, 0.4, 0.8])
            .build(),
    };

    let profile = match args.next() {
        Some(path) => DeviceProfile::from_json_file(Path::new(&path))
            .with_context(|| format!("loading device profile from {path}"))?,
        None => DeviceProfile::new("simulated", PixelToWavelength::linear(400.0, 0.3125, 640))
            .with_roi(Roi::new(0.0, 0.0, 640.0, 2.0)),
    };

    info!(
        "Target: {} nm ± {} nm, {} standards, {} frames per burst",
        params.target_wavelength_nm,
        params.half_window_nm,
        params.standards.len(),
        params.frames_per_burst
    );

    let adapter = CaptureAdapter::discover(Vec::new());
    let mut workflow = AnalysisWorkflow::new(adapter, params, profile)?;

    match workflow.run("session") {
        Ok(report) => {
            info!(
                "C = {:.4} (95% CI {:.4} .. {:.4})",
                report.result.concentration, report.result.ci95.low, report.result.ci95.high
            );
            for issue in &report.issues {
                info!("Calibration issue: {}", issue);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Err(e) if e.is_recoverable() => error!("Analysis failed, re-acquire and retry: {}", e),
        Err(e) => error!("Analysis failed: {}", e),
    }

    Ok(())
}
