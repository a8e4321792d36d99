use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use cuebot_core::{BallMeasurement, DispatchParams, MotionCommand, PhysicalConstants, StrikeCommand};
use cuebot_robot::{plan_polar, CommandSink, DispatchController, DispatchError};
use nalgebra::Point2;
use tokio::time::Instant;

#[derive(Default)]
struct RecordingSink {
    moves: Mutex<Vec<(Instant, MotionCommand)>>,
    strikes: Mutex<Vec<StrikeCommand>>,
    offline: bool,
}

impl RecordingSink {
    fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }

    fn moves(&self) -> Vec<(Instant, MotionCommand)> {
        self.moves.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        self.moves.lock().unwrap().len() + self.strikes.lock().unwrap().len()
    }
}

impl CommandSink for RecordingSink {
    fn send_move(
        &self,
        cmd: MotionCommand,
    ) -> impl Future<Output = Result<String, DispatchError>> + Send {
        self.moves.lock().unwrap().push((Instant::now(), cmd));
        let offline = self.offline;
        async move {
            if offline {
                Err(DispatchError::Endpoint("unreachable".into()))
            } else {
                Ok("OK\n".to_string())
            }
        }
    }

    fn send_strike(
        &self,
        cmd: StrikeCommand,
    ) -> impl Future<Output = Result<String, DispatchError>> + Send {
        self.strikes.lock().unwrap().push(cmd);
        async { Ok("struck".to_string()) }
    }
}

fn measurement(distance_cm: f32, angle_deg: f32) -> BallMeasurement {
    let (s, c) = angle_deg.to_radians().sin_cos();
    BallMeasurement {
        center_px: Point2::new(100.0, 100.0),
        radius_px: 10.0,
        distance_cm,
        angle_deg,
        x_cm: distance_cm * s,
        y_cm: distance_cm * c,
    }
}

fn controller(sink: RecordingSink) -> DispatchController<RecordingSink> {
    DispatchController::new(sink, PhysicalConstants::default(), DispatchParams::default())
}

#[tokio::test(start_paused = true)]
async fn nothing_held_means_no_requests() {
    let ctl = controller(RecordingSink::default());
    assert!(ctl.dispatch_polar().await.is_none());

    assert_eq!(ctl.hold(&[]), 0);
    assert!(ctl.dispatch_polar().await.is_none());
    assert!(ctl.dispatch_cartesian().is_empty());
    assert_eq!(ctl.sink().calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn translation_follows_rotation_after_the_delay() {
    let ctl = controller(RecordingSink::default());
    ctl.hold(&[measurement(35.0, 90.0)]);

    let start = Instant::now();
    let deferred = ctl.dispatch_polar().await.expect("deferred phase");
    let moves = ctl.sink().moves();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].1, MotionCommand::uniform(-2032, 2200));

    deferred.await.expect("join");
    let moves = ctl.sink().moves();
    assert_eq!(moves.len(), 2);
    let advance = moves[1].1;
    assert_eq!((advance.steps_x, advance.steps_y, advance.steps_z), (2517, 0, -2517));
    assert!(moves[1].0 - start >= Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn several_held_balls_actuate_only_the_last_one() {
    let ctl = controller(RecordingSink::default());
    let near = measurement(20.0, 45.0);
    let far = measurement(50.0, -30.0);
    ctl.hold(&[near, far]);

    let start = Instant::now();
    ctl.dispatch_polar().await.expect("deferred").await.expect("join");
    let moves = ctl.sink().moves();
    assert_eq!(moves.len(), 2);

    let plan = plan_polar(&far, &PhysicalConstants::default(), 100);
    assert_eq!(moves[0].1, plan.rotate);
    assert_eq!(moves[1].1, plan.advance);
    assert_eq!(plan.rotate, MotionCommand::uniform(677, 2200));
    assert_eq!(
        (plan.advance.steps_x, plan.advance.steps_y, plan.advance.steps_z),
        (3638, 0, -3638)
    );
    assert_eq!(moves[0].0, start);
    assert!(moves[1].0 - start >= Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn new_hold_discards_pending_translation() {
    let ctl = controller(RecordingSink::default());
    ctl.hold(&[measurement(35.0, 90.0)]);
    let deferred = ctl.dispatch_polar().await.expect("deferred");

    tokio::time::sleep(Duration::from_millis(500)).await;
    ctl.hold(&[measurement(10.0, 0.0)]);

    deferred.await.expect("join");
    // Rotated but not advanced.
    let moves = ctl.sink().moves();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].1, MotionCommand::uniform(-2032, 2200));
}

#[tokio::test(start_paused = true)]
async fn second_dispatch_supersedes_the_first() {
    let ctl = controller(RecordingSink::default());
    ctl.hold(&[measurement(35.0, 90.0)]);
    let first = ctl.dispatch_polar().await.expect("first");
    let second = ctl.dispatch_polar().await.expect("second");
    first.await.expect("join");
    second.await.expect("join");
    // Two rotations, one translation.
    assert_eq!(ctl.sink().moves().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn transport_failures_are_dropped() {
    let ctl = controller(RecordingSink::offline());
    ctl.hold(&[measurement(35.0, 90.0)]);
    ctl.dispatch_polar().await.expect("deferred").await.expect("join");
    // Both phases were attempted exactly once; nothing retried.
    assert_eq!(ctl.sink().moves().len(), 2);
}

#[tokio::test]
async fn cartesian_only_reports_and_strike_sends() {
    let ctl = controller(RecordingSink::default());
    ctl.hold(&[measurement(10.0, 90.0)]);
    let xy = ctl.dispatch_cartesian();
    assert_eq!(xy.len(), 1);
    assert_abs_diff_eq!(xy[0].0, 10.0, epsilon = 1e-4);
    assert_abs_diff_eq!(xy[0].1, 0.0, epsilon = 1e-4);
    assert!(ctl.sink().moves().is_empty());

    assert!(ctl.strike(300).await);
    assert_eq!(
        *ctl.sink().strikes.lock().unwrap(),
        vec![StrikeCommand { charge_duration_ms: 300 }]
    );
}
