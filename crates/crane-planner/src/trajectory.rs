//! Joint-space [`Trajectory`].

use crane_types::{ActuatorStates, MotionLimits};
use tracing::debug;

use crate::cubic::{AxisSample, SyncedCubics};
use crate::Profile;

/// Synchronised cubic move of all five actuators.
///
/// Length axes (`d1`, `l6`) are timed with the linear limits, rotational
/// axes with the angular ones.  Each axis starts with the velocity carried
/// by `start` and comes to rest at `goal`.
#[derive(Debug, Clone)]
pub struct Trajectory {
    start: ActuatorStates,
    goal: ActuatorStates,
    cubics: SyncedCubics<{ ActuatorStates::AXES }>,
}

impl Trajectory {
    pub fn new(start: ActuatorStates, goal: ActuatorStates, limits: &MotionLimits) -> Self {
        let linear = (limits.max_vel, limits.max_acc);
        let angular = (limits.max_ang_vel, limits.max_ang_acc);
        let cubics = SyncedCubics::new(
            start.positions(),
            start.velocities(),
            goal.positions(),
            [linear, angular, angular, angular, linear],
        );
        debug!(duration = cubics.duration(), "joint trajectory planned");
        Self {
            start,
            goal,
            cubics,
        }
    }

    pub fn start(&self) -> &ActuatorStates {
        &self.start
    }

    /// Largest per-axis minimum move time.  Unaffected by
    /// [`set_duration`][Self::set_duration].
    pub fn min_move_time(&self) -> f64 {
        self.cubics.min_duration()
    }

    /// Stretch (or compress) the move to `duration` seconds, e.g. to finish
    /// together with an origin move.
    pub fn set_duration(&mut self, duration: f64) {
        debug!(min = self.cubics.min_duration(), duration, "joint trajectory stretched");
        self.cubics.set_duration(duration);
    }
}

impl Profile for Trajectory {
    type Sample = ActuatorStates;

    fn duration(&self) -> f64 {
        self.cubics.duration()
    }

    fn evaluate(&self, t: f64) -> Option<ActuatorStates> {
        let samples = self.cubics.sample(t)?;
        Some(ActuatorStates::from_axes(
            samples.map(|s: AxisSample| s.position),
            samples.map(|s| s.velocity),
            samples.map(|s| s.acceleration),
        ))
    }

    fn goal(&self) -> ActuatorStates {
        self.goal.at_rest()
    }
}
