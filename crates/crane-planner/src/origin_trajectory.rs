//! Base-frame [`OriginTrajectory`].

use crane_types::{MotionLimits, Origin};
use tracing::debug;

use crate::cubic::SyncedCubics;
use crate::Profile;

/// Synchronised rest-to-rest cubic move of the base origin.
///
/// `x`, `y` and `z` share the linear limits, `phi` uses the angular ones.
#[derive(Debug, Clone)]
pub struct OriginTrajectory {
    start: Origin,
    goal: Origin,
    cubics: SyncedCubics<4>,
}

impl OriginTrajectory {
    pub fn new(start: Origin, goal: Origin, limits: &MotionLimits) -> Self {
        let linear = (limits.max_vel, limits.max_acc);
        let angular = (limits.max_ang_vel, limits.max_ang_acc);
        let cubics = SyncedCubics::new(
            start.axes(),
            [0.0; 4],
            goal.axes(),
            [linear, linear, linear, angular],
        );
        debug!(duration = cubics.duration(), ?goal, "origin trajectory planned");
        Self {
            start,
            goal,
            cubics,
        }
    }

    pub fn start(&self) -> &Origin {
        &self.start
    }
}

impl Profile for OriginTrajectory {
    type Sample = Origin;

    fn duration(&self) -> f64 {
        self.cubics.duration()
    }

    fn evaluate(&self, t: f64) -> Option<Origin> {
        let samples = self.cubics.sample(t)?;
        Some(Origin::from_axes(samples.map(|s| s.position)))
    }

    fn goal(&self) -> Origin {
        self.goal
    }
}
