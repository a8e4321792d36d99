//! Table, marker sheet, axis and ball detection for cuebot.
//!
//! Every detector is a pure function of the frame, a color range and the mask
//! produced by the stage before it, returning `Option` (or an empty list) when
//! nothing is found. [`FramePipeline`] chains them for one frame and feeds the
//! results into the measurement calculator.
//!
//! ```no_run
//! use cuebot_core::CalibrationConfig;
//! use cuebot_vision::FramePipeline;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = CalibrationConfig::load_json("cuebot.json")?;
//! let frame = image::open("frame.png")?.to_rgb8();
//! let analysis = FramePipeline::new(&cfg).process(&frame);
//! for m in &analysis.measurements {
//!     println!("{:.1} cm at {:.1} deg", m.distance_cm, m.angle_deg);
//! }
//! # Ok(())
//! # }
//! ```

pub mod annotate;
pub mod axis;
pub mod ball;
pub mod marker;
pub mod measure;
pub mod pipeline;
pub mod primitives;
pub mod table;

pub use annotate::annotate;
pub use axis::{calibrate_axes, locate_spot};
pub use ball::{localize_balls, DEFAULT_MIN_BALL_AREA};
pub use marker::{detect_marker_frame, MarkerRegion};
pub use measure::{measure_ball, measure_balls};
pub use pipeline::{FrameAnalysis, FramePipeline, FrameReport, Stage};
pub use primitives::{detect_regions, Circle, Region};
pub use table::{detect_table_boundary, TableBoundary};
