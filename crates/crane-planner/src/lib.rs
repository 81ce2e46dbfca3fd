//! `crane-planner` – minimum-time cubic motion profiles for the crane.
//!
//! Every axis of a move is blended with one cubic polynomial.  All axes of a
//! move share a single duration, the largest of their independent minimum
//! move times, so they arrive together.
//!
//! * [`Trajectory`] – joint-space move between two [`ActuatorStates`].
//! * [`OriginTrajectory`] – base move between two [`Origin`]s.
//!
//! Both can be evaluated at an arbitrary elapsed time (real-time streaming)
//! or stepped with a fixed increment through [`Steps`] (offline series).
//!
//! # Example
//!
//! ```rust
//! use crane_planner::{Profile, Trajectory};
//! use crane_types::{ActuatorStates, MotionLimits};
//!
//! let start = ActuatorStates::home();
//! let goal = ActuatorStates::new(0.5, 1.0, 0.0, 0.0, 0.1);
//! let traj = Trajectory::new(start, goal, &MotionLimits::robot_default());
//!
//! assert_eq!(traj.evaluate(0.0).unwrap().d1, 0.7);
//! assert!(traj.evaluate(traj.duration()).is_none());
//!
//! let series = traj.steps(0.1).collect_series();
//! assert_eq!(series.last().unwrap().positions(), goal.positions());
//! ```
//!
//! [`ActuatorStates`]: crane_types::ActuatorStates
//! [`Origin`]: crane_types::Origin

pub mod cubic;
pub mod origin_trajectory;
pub mod trajectory;

pub use cubic::{minimum_move_time, AxisSample, Cubic, SyncedCubics};
pub use origin_trajectory::OriginTrajectory;
pub use trajectory::Trajectory;

/// Step used by offline series generation when none is given.
pub const DEFAULT_STEP: f64 = 0.1;

/// A time-parameterised motion that is exhausted once `t >= duration()`.
pub trait Profile {
    type Sample: Copy;

    /// Synchronised duration of the move in seconds.
    fn duration(&self) -> f64;

    /// Sample at elapsed time `t`, or `None` once the move is over.
    fn evaluate(&self, t: f64) -> Option<Self::Sample>;

    /// The goal, at rest.
    fn goal(&self) -> Self::Sample;

    /// Step through the profile with a fixed increment `dt`, starting at 0.
    fn steps(&self, dt: f64) -> Steps<'_, Self>
    where
        Self: Sized,
    {
        Steps::new(self, dt)
    }
}

/// Incremental stepping over a [`Profile`] with an internal clock.
///
/// Yields `(t, sample)` pairs with `t = 0, dt, 2·dt, …` until the profile is
/// exhausted.
#[derive(Debug, Clone)]
pub struct Steps<'a, P: Profile> {
    profile: &'a P,
    dt: f64,
    index: u64,
}

impl<'a, P: Profile> Steps<'a, P> {
    fn new(profile: &'a P, dt: f64) -> Self {
        let dt = if dt > 0.0 { dt } else { DEFAULT_STEP };
        Self {
            profile,
            dt,
            index: 0,
        }
    }

    /// Collect every remaining sample followed by the goal.
    pub fn collect_series(self) -> Vec<P::Sample> {
        let goal = self.profile.goal();
        let mut series: Vec<P::Sample> = self.map(|(_, s)| s).collect();
        series.push(goal);
        series
    }
}

impl<P: Profile> Iterator for Steps<'_, P> {
    type Item = (f64, P::Sample);

    fn next(&mut self) -> Option<Self::Item> {
        let t = self.index as f64 * self.dt;
        let sample = self.profile.evaluate(t)?;
        self.index += 1;
        Some((t, sample))
    }
}
