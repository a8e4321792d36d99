use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::core::CalibrationConfig;
use crate::vision::{annotate, FrameAnalysis, FramePipeline, FrameReport};
use crate::RunError;

const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tiff"];

/// Decode an image file into an RGB frame.
pub fn load_frame(path: impl AsRef<Path>) -> Result<RgbImage, RunError> {
    Ok(image::open(path)?.to_rgb8())
}

/// Run the full pipeline on one in-memory frame.
pub fn measure_image(frame: &RgbImage, cfg: &CalibrationConfig) -> FrameAnalysis {
    FramePipeline::new(cfg).process(frame)
}

/// Load `path` and run the full pipeline on it.
pub fn measure_file(
    path: impl AsRef<Path>,
    cfg: &CalibrationConfig,
) -> Result<(RgbImage, FrameAnalysis), RunError> {
    let frame = load_frame(path)?;
    let analysis = measure_image(&frame, cfg);
    Ok((frame, analysis))
}

pub fn write_report(path: impl AsRef<Path>, report: &FrameReport) -> Result<(), RunError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report).map_err(std::io::Error::from)?;
    Ok(())
}

/// Render and save the overlay; the format follows the file extension.
pub fn write_overlay(
    path: impl AsRef<Path>,
    frame: &RgbImage,
    analysis: &FrameAnalysis,
) -> Result<(), RunError> {
    annotate(frame, analysis).save(path)?;
    Ok(())
}

/// Expand directories into their image files (sorted by name); plain files
/// pass through in the order given.
pub fn list_frames(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, RunError> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_frame_file(p))
                .collect();
            files.sort();
            out.extend(files);
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
