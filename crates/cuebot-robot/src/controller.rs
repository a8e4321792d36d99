//! Held measurement set and the hold / dispatch actions.
//!
//! A polar dispatch drives toward one target: the last held measurement. Its
//! rotation goes out right away and the matching translation follows after a
//! fixed delay. Every held angle is relative to the pose at hold time, so only
//! one target can be reached per dispatch. Each hold or polar dispatch bumps a
//! generation counter; the deferred translation re-reads the counter after its
//! delay and discards itself if anything newer happened in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use cuebot_core::{BallMeasurement, DispatchParams, MotionCommand, PhysicalConstants, StrikeCommand};
use tokio::task::JoinHandle;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::command::{plan_polar, PolarPlan};
use crate::dispatcher::CommandSink;

pub struct DispatchController<S> {
    sink: Arc<S>,
    physical: PhysicalConstants,
    params: DispatchParams,
    held: Mutex<Option<Arc<[BallMeasurement]>>>,
    generation: Arc<AtomicU64>,
}

impl<S: CommandSink> DispatchController<S> {
    pub fn new(sink: S, physical: PhysicalConstants, params: DispatchParams) -> Self {
        Self {
            sink: Arc::new(sink),
            physical,
            params,
            held: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Replace the held set with `measurements`. Returns the held count.
    ///
    /// A hold also supersedes any translation still waiting on its delay, so a
    /// re-hold inside that window leaves the robot rotated but not advanced.
    pub fn hold(&self, measurements: &[BallMeasurement]) -> usize {
        let snapshot: Arc<[BallMeasurement]> = Arc::from(measurements);
        *self.held.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        self.bump();
        log::info!("holding {} measurement(s)", measurements.len());
        measurements.len()
    }

    /// Current held set; empty before the first hold.
    pub fn held(&self) -> Arc<[BallMeasurement]> {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Rotate toward the last held ball now and schedule the advance.
    ///
    /// Every held measurement is logged. Returns the deferred task, or `None`
    /// when nothing is held (no request is made in that case).
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub async fn dispatch_polar(&self) -> Option<JoinHandle<()>> {
        let held = self.held();
        let mut target: Option<PolarPlan> = None;
        for m in held.iter() {
            let plan = plan_polar(m, &self.physical, self.params.translation_bias_steps);
            log::info!(
                "distance {:.1} cm, angle {:.1} deg: rotation steps {}, translation steps {}",
                m.distance_cm,
                m.angle_deg,
                plan.rotate.steps_x,
                plan.advance.steps_x
            );
            target = Some(plan);
        }
        let Some(PolarPlan { rotate, advance }) = target else {
            log::info!("polar dispatch skipped: nothing held");
            return None;
        };
        let generation = self.bump();
        deliver_move(self.sink.as_ref(), rotate).await;

        let sink = Arc::clone(&self.sink);
        let counter = Arc::clone(&self.generation);
        let delay = Duration::from_millis(self.params.phase_two_delay_ms);
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if counter.load(Ordering::SeqCst) != generation {
                log::debug!("discarding superseded translation (generation {generation})");
                return;
            }
            deliver_move(sink.as_ref(), advance).await;
        }))
    }

    /// Report the held Cartesian offsets. No command is sent.
    pub fn dispatch_cartesian(&self) -> Vec<(f32, f32)> {
        let held = self.held();
        if held.is_empty() {
            log::info!("cartesian dispatch skipped: nothing held");
        }
        held.iter()
            .map(|m| {
                log::info!("X: {:.2} cm, Y: {:.2} cm", m.x_cm, m.y_cm);
                (m.x_cm, m.y_cm)
            })
            .collect()
    }

    /// Fire the striker. Returns whether the device acknowledged.
    pub async fn strike(&self, charge_duration_ms: u32) -> bool {
        let cmd = StrikeCommand { charge_duration_ms };
        match self.sink.send_strike(cmd).await {
            Ok(ack) => {
                log::info!("strike ack: {}", ack.trim());
                true
            }
            Err(e) => {
                log::warn!("strike dropped: {e}");
                false
            }
        }
    }

    fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

async fn deliver_move<S: CommandSink>(sink: &S, cmd: MotionCommand) -> bool {
    match sink.send_move(cmd).await {
        Ok(ack) => {
            log::info!("move ack: {}", ack.trim());
            true
        }
        Err(e) => {
            log::warn!("move dropped ({cmd:?}): {e}");
            false
        }
    }
}
