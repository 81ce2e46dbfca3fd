//! Closed-loop [`ControlSimulator`].
//!
//! The simulator holds the end effector at a fixed world pose while the
//! crane's base travels along an [`OriginTrajectory`].  Two periodic events
//! share one elapsed-time input:
//!
//! * **sensor** – sample the origin, re-solve inverse kinematics for the
//!   world target and re-target the four axis controllers;
//! * **control** – recompute every controller signal from the measured joint
//!   state.  Between control events each controller holds its last signal.
//!
//! Every call to [`ControlSimulator::next_step`] then advances the four
//! controlled axes by their signals; the jaw is left alone.

use crane_kinematics::RobotCrane;
use crane_planner::{OriginTrajectory, Profile};
use crane_types::{ActuatorStates, CraneError, MotionLimits, Origin};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pid::PidController;

// ────────────────────────────────────────────────────────────────────────────
// Settings
// ────────────────────────────────────────────────────────────────────────────

/// Rates, gains and base limits of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    /// Origin sensor rate in Hz.
    pub sensor_frequency: f64,
    /// Controller update rate in Hz.
    pub control_frequency: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Limits timing the base move.
    pub origin_limits: MotionLimits,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            sensor_frequency: 20.0,
            control_frequency: 20.0,
            kp: 0.3,
            ki: 0.74,
            kd: 0.001,
            origin_limits: MotionLimits::origin_default(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tracking log
// ────────────────────────────────────────────────────────────────────────────

/// World pose the simulator holds the end effector at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndEffectorPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub phi: f64,
}

/// One simulation step as recorded for offline analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingSample {
    pub t: f64,
    pub origin: Origin,
    /// End-effector position after the step.
    pub actual: [f64; 3],
    pub target: [f64; 3],
    /// Signals applied to `d1`, `theta1`, `theta2`, `theta3`.
    pub signals: [f64; 4],
}

impl TrackingSample {
    /// Euclidean distance between actual and target position.
    pub fn position_error(&self) -> f64 {
        self.actual
            .iter()
            .zip(self.target.iter())
            .map(|(a, t)| (a - t) * (a - t))
            .sum::<f64>()
            .sqrt()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ControlSimulator
// ────────────────────────────────────────────────────────────────────────────

/// Axis order of the controllers.
const D1: usize = 0;
const THETA1: usize = 1;
const THETA2: usize = 2;
const THETA3: usize = 3;

#[derive(Debug, Clone)]
pub struct ControlSimulator {
    settings: SimulatorSettings,
    origin_trajectory: OriginTrajectory,
    controllers: [PidController; 4],
    target: EndEffectorPose,
    last_sensor_t: f64,
    last_control_t: f64,
    log: Vec<TrackingSample>,
}

impl ControlSimulator {
    /// Prepare a simulation for the origin move the robot was last commanded.
    ///
    /// The commanded `origin_t1` becomes the trajectory goal and the robot is
    /// rewound to its resting `origin_t0` / `act_states_t0`.  The end-effector
    /// pose in that resting configuration is the fixed world target.
    ///
    /// # Errors
    ///
    /// Fails if either rate is not a positive frequency, the resting state no
    /// longer validates or the target cannot be solved at the start origin.
    /// The robot is left untouched on failure.
    pub fn new(robot: &mut RobotCrane, settings: SimulatorSettings) -> Result<Self, CraneError> {
        CraneError::check_frequency("sensor_frequency", settings.sensor_frequency)?;
        CraneError::check_frequency("control_frequency", settings.control_frequency)?;

        let start = *robot.origin_t0();
        let goal = *robot.origin_t1();
        let mut rest = robot.clone();
        rest.validate_and_set(*robot.act_states_t0())?;
        rest.set_origin(start);

        let target = EndEffectorPose {
            x: rest.x_position(),
            y: rest.y_position(),
            z: rest.z_position(),
            phi: rest.phi(),
        };
        let origin_trajectory = OriginTrajectory::new(start, goal, &settings.origin_limits);

        let limits = *rest.motion_limits();
        let controller = |max_velocity| {
            PidController::new(
                settings.kp,
                settings.ki,
                settings.kd,
                settings.control_frequency,
                max_velocity,
            )
        };
        let mut controllers = [
            controller(limits.max_vel),
            controller(limits.max_ang_vel),
            controller(limits.max_ang_vel),
            controller(limits.max_ang_vel),
        ];
        let desired = Self::solve_target(&target, &rest)?;
        Self::retarget(&mut controllers, &desired);

        *robot = rest;
        let sim = Self {
            settings,
            origin_trajectory,
            controllers,
            target,
            last_sensor_t: 0.0,
            last_control_t: 0.0,
            log: Vec::new(),
        };
        info!(
            duration = sim.duration(),
            x = target.x,
            y = target.y,
            z = target.z,
            "control simulation prepared"
        );
        Ok(sim)
    }

    pub fn settings(&self) -> &SimulatorSettings {
        &self.settings
    }

    /// Length of the simulated move, fixed by the origin trajectory.
    pub fn duration(&self) -> f64 {
        self.origin_trajectory.duration()
    }

    pub fn origin_trajectory(&self) -> &OriginTrajectory {
        &self.origin_trajectory
    }

    pub fn target(&self) -> &EndEffectorPose {
        &self.target
    }

    /// Controllers in axis order `d1`, `theta1`, `theta2`, `theta3`.
    pub fn controllers(&self) -> &[PidController; 4] {
        &self.controllers
    }

    pub fn tracking_log(&self) -> &[TrackingSample] {
        &self.log
    }

    /// Sum of every controller's accumulated `|error|`.
    pub fn total_error(&self) -> f64 {
        self.controllers.iter().map(PidController::total_error).sum()
    }

    fn solve_target(
        target: &EndEffectorPose,
        robot: &RobotCrane,
    ) -> Result<ActuatorStates, CraneError> {
        let EndEffectorPose { x, y, z, phi } = *target;
        robot.inverse_kinematics_with_jaw(x, y, z, phi, robot.act_states_t1().l6)
    }

    fn retarget(controllers: &mut [PidController; 4], desired: &ActuatorStates) {
        controllers[D1].set_target(desired.d1);
        controllers[THETA1].set_target(desired.theta1);
        controllers[THETA2].set_target(desired.theta2);
        controllers[THETA3].set_target(desired.theta3);
    }

    /// Advance the simulation to elapsed time `t`.
    ///
    /// The robot's origin follows the trajectory on every call; the sensor
    /// rate only governs how often the controllers are re-targeted.  Returns
    /// the new actuator state, already adopted by `robot` together with the
    /// origin, or `None` once the origin move is over.  Nothing is advanced on
    /// `None`.
    ///
    /// If the target cannot be solved at a newly sensed origin the previous
    /// controller targets are kept.
    ///
    /// # Errors
    ///
    /// Returns [`CraneError::JointLimitViolation`] if the controlled step
    /// would leave the joint limits.  Neither the robot nor the simulator
    /// changes in that case.
    pub fn next_step(
        &mut self,
        robot: &mut RobotCrane,
        t: f64,
    ) -> Result<Option<ActuatorStates>, CraneError> {
        if t > self.duration() {
            return Ok(None);
        }
        let Some(origin) = self.origin_trajectory.evaluate(t) else {
            return Ok(None);
        };

        let mut controllers = self.controllers.clone();
        let sensed = t - self.last_sensor_t >= 1.0 / self.settings.sensor_frequency;
        if sensed {
            let mut moved = robot.clone();
            moved.set_origin(origin);
            match Self::solve_target(&self.target, &moved) {
                Ok(desired) => Self::retarget(&mut controllers, &desired),
                Err(e) => warn!(t, error = %e, "keeping previous targets"),
            }
        }

        let current = *robot.act_states_t1();
        let controlled = t - self.last_control_t >= 1.0 / self.settings.control_frequency;
        let signals = if controlled {
            let measured = [current.d1, current.theta1, current.theta2, current.theta3];
            let mut signals = [0.0; 4];
            for (i, c) in controllers.iter_mut().enumerate() {
                signals[i] = c.calculate_signal(measured[i]);
            }
            signals
        } else {
            controllers.each_ref().map(PidController::hold_last_signal)
        };

        let next = ActuatorStates::new(
            current.d1 + signals[D1],
            current.theta1 + signals[THETA1],
            current.theta2 + signals[THETA2],
            current.theta3 + signals[THETA3],
            current.l6,
        );
        robot.limits().check(&next)?;

        robot.set_origin(origin);
        robot.validate_and_set(next)?;
        self.controllers = controllers;
        if sensed {
            self.last_sensor_t = t;
        }
        if controlled {
            self.last_control_t = t;
        }

        self.log.push(TrackingSample {
            t,
            origin,
            actual: [robot.x_position(), robot.y_position(), robot.z_position()],
            target: [self.target.x, self.target.y, self.target.z],
            signals,
        });
        Ok(Some(next))
    }
}
