//! Measurement to motor-step translation.
//!
//! The robot turns in place by driving all three wheels the same way, then
//! drives forward with the X and Z wheels running in opposite directions.

use std::f64::consts::TAU;

use cuebot_core::{BallMeasurement, MotionCommand, PhysicalConstants};
use serde::{Deserialize, Serialize};

/// Wheel steps that turn the robot by `angle_deg`.
///
/// Positive angles (toward the X axis) produce negative step counts.
pub fn rotation_steps(angle_deg: f32, physical: &PhysicalConstants) -> i64 {
    let path_m = (angle_deg as f64 / 360.0) * TAU * physical.radius_robot_m;
    let wheel_circumference_m = TAU * physical.wheel_radius_m;
    let steps = path_m / wheel_circumference_m * physical.steps_per_rotation as f64;
    -(steps.round() as i64)
}

/// Wheel steps that advance the robot by `distance_m`, less `bias_steps`.
pub fn translation_steps(distance_m: f64, physical: &PhysicalConstants, bias_steps: i64) -> i64 {
    let steps = distance_m / physical.distance_per_step_m * physical.steps_per_rotation as f64;
    steps.round() as i64 - bias_steps
}

/// Rotate-then-advance pair for one ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolarPlan {
    pub rotate: MotionCommand,
    pub advance: MotionCommand,
}

pub fn plan_polar(m: &BallMeasurement, physical: &PhysicalConstants, bias_steps: i64) -> PolarPlan {
    let speed = physical.motor_speed;
    let rotate = MotionCommand::uniform(rotation_steps(m.angle_deg, physical), speed);
    let t = translation_steps(m.distance_m(), physical, bias_steps);
    let advance = MotionCommand {
        steps_x: t,
        speed_x: speed,
        steps_y: 0,
        speed_y: speed,
        steps_z: -t,
        speed_z: speed,
    };
    PolarPlan { rotate, advance }
}
