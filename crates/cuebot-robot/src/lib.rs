//! Actuation side of cuebot: turn held ball measurements into stepper
//! commands and deliver them to the robot's controller.
//!
//! - [`command`]: rotation/translation step formulas.
//! - [`dispatcher`]: the [`CommandSink`] seam and its HTTP implementation.
//! - [`controller`]: the held measurement set plus hold, polar, cartesian and
//!   strike actions.
//!
//! Delivery is fire-and-forget: a failed request is logged at `warn` and
//! dropped.

pub mod command;
pub mod controller;
pub mod dispatcher;

pub use command::{plan_polar, rotation_steps, translation_steps, PolarPlan};
pub use controller::DispatchController;
pub use dispatcher::{CommandSink, DispatchError, HttpDispatcher};
