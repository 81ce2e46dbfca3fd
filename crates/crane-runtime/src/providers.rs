//! The three step providers behind the stream commands.
//!
//! All three are built from a robot whose `t0` pair holds the resting
//! configuration and whose `t1` pair holds the commanded goal.

use crane_control::{ControlSimulator, SimulatorSettings};
use crane_kinematics::RobotCrane;
use crane_planner::{OriginTrajectory, Profile, Trajectory};
use crane_types::{CraneError, MotionLimits};

use crate::streamer::{Step, StepProvider};

// ────────────────────────────────────────────────────────────────────────────
// JointMotion
// ────────────────────────────────────────────────────────────────────────────

/// Joint-space move with a fixed base.
#[derive(Debug, Clone)]
pub struct JointMotion {
    trajectory: Trajectory,
}

impl JointMotion {
    pub fn new(trajectory: Trajectory) -> Self {
        Self { trajectory }
    }

    /// Move from `act_states_t0` to `act_states_t1` within the robot's own
    /// motion limits.
    pub fn for_robot(robot: &RobotCrane) -> Self {
        Self::new(Trajectory::new(
            *robot.act_states_t0(),
            *robot.act_states_t1(),
            robot.motion_limits(),
        ))
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
}

impl StepProvider for JointMotion {
    fn duration(&self) -> f64 {
        self.trajectory.duration()
    }

    fn next_step(&mut self, _robot: &mut RobotCrane, t: f64) -> Result<Option<Step>, CraneError> {
        Ok(self.trajectory.evaluate(t).map(|states| Step {
            origin: None,
            states,
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OriginMotion
// ────────────────────────────────────────────────────────────────────────────

/// Joint-space move stretched over a base move, so both finish together.
#[derive(Debug, Clone)]
pub struct OriginMotion {
    origin: OriginTrajectory,
    joints: Trajectory,
}

impl OriginMotion {
    /// Move the base from `origin_t0` to `origin_t1` within `origin_limits`
    /// while the joints travel from `act_states_t0` to `act_states_t1`.
    pub fn for_robot(robot: &RobotCrane, origin_limits: &MotionLimits) -> Self {
        let origin = OriginTrajectory::new(*robot.origin_t0(), *robot.origin_t1(), origin_limits);
        let mut joints = Trajectory::new(
            *robot.act_states_t0(),
            *robot.act_states_t1(),
            robot.motion_limits(),
        );
        joints.set_duration(origin.duration());
        Self { origin, joints }
    }

    pub fn origin_trajectory(&self) -> &OriginTrajectory {
        &self.origin
    }

    pub fn joint_trajectory(&self) -> &Trajectory {
        &self.joints
    }
}

impl StepProvider for OriginMotion {
    fn duration(&self) -> f64 {
        self.origin.duration()
    }

    fn next_step(&mut self, _robot: &mut RobotCrane, t: f64) -> Result<Option<Step>, CraneError> {
        let Some(origin) = self.origin.evaluate(t) else {
            return Ok(None);
        };
        Ok(self.joints.evaluate(t).map(|states| Step {
            origin: Some(origin),
            states,
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ControlledMotion
// ────────────────────────────────────────────────────────────────────────────

/// Base move with the end effector held in place by the control simulator.
#[derive(Debug, Clone)]
pub struct ControlledMotion {
    simulator: ControlSimulator,
}

impl ControlledMotion {
    /// Rewinds `robot` to its resting configuration; see
    /// [`ControlSimulator::new`].
    pub fn for_robot(robot: &mut RobotCrane, settings: SimulatorSettings) -> Result<Self, CraneError> {
        Ok(Self {
            simulator: ControlSimulator::new(robot, settings)?,
        })
    }

    pub fn simulator(&self) -> &ControlSimulator {
        &self.simulator
    }
}

impl StepProvider for ControlledMotion {
    fn duration(&self) -> f64 {
        self.simulator.duration()
    }

    /// The simulator commits the origin and state together, so the returned
    /// step repeats what `robot` already holds.
    fn next_step(&mut self, robot: &mut RobotCrane, t: f64) -> Result<Option<Step>, CraneError> {
        Ok(self.simulator.next_step(robot, t)?.map(|states| Step {
            origin: Some(*robot.origin_t1()),
            states,
        }))
    }
}
