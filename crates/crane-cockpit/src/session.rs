//! Per-connection command handling.
//!
//! A [`Session`] owns one [`RobotCrane`] from connect to disconnect and
//! turns decoded [`CraneCommand`]s into replies or stream requests.  It has
//! no I/O of its own; [`server`][crate::server] moves the text frames.

use crane_control::SimulatorSettings;
use crane_kinematics::RobotCrane;
use crane_runtime::{
    ControlledMotion, JointMotion, OriginMotion, PoseStreamer, StepProvider, StreamSettings,
};
use crane_types::{ActuatorStates, CraneCommand, CraneError, Dimensions, MotionLimits, Origin};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reply to every successful state-setting command.
pub const ACK: &str = "True";

/// Everything a session needs to build its robot and streams.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    pub dimensions: Dimensions,
    /// Limits of the crane's own joints.
    pub motion_limits: MotionLimits,
    pub stream: StreamSettings,
    /// Control simulator rates, gains and base limits.  The base limits also
    /// time the open-loop base move.
    pub simulator: SimulatorSettings,
}

/// Which step provider a stream command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Joint,
    Origin,
    Controlled,
}

/// Result of handling one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Send this text frame back.
    Reply(String),
    /// Start a pose stream.
    Stream(StreamKind),
}

/// Decode one text frame.
pub fn parse_command(text: &str) -> Result<CraneCommand, CraneError> {
    serde_json::from_str(text).map_err(|e| CraneError::MalformedRequest(e.to_string()))
}

/// Text frame reporting a rejected request.
pub fn invalid_request(e: &CraneError) -> String {
    format!("Invalid request: {e}")
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| invalid_request(&CraneError::Transport(e.to_string())))
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    settings: SessionSettings,
    robot: RobotCrane,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            robot: RobotCrane::new(settings.dimensions, settings.motion_limits),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn robot(&self) -> &RobotCrane {
        &self.robot
    }

    pub fn robot_mut(&mut self) -> &mut RobotCrane {
        &mut self.robot
    }

    /// Replace the robot with a freshly constructed one.
    pub fn reset(&mut self) {
        self.robot = RobotCrane::new(self.settings.dimensions, self.settings.motion_limits);
        info!(session = %self.id, "robot reset");
    }

    pub fn streamer(&self) -> PoseStreamer {
        PoseStreamer::new(self.settings.stream)
    }

    /// Decode and handle one text frame.
    pub fn handle_text(&mut self, text: &str) -> Outcome {
        match parse_command(text) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => {
                debug!(session = %self.id, error = %e, "undecodable request");
                Outcome::Reply(invalid_request(&e))
            }
        }
    }

    pub fn handle(&mut self, cmd: CraneCommand) -> Outcome {
        debug!(session = %self.id, action = cmd.label(), "handling command");
        let result = match cmd {
            CraneCommand::InitializeConnection => return Outcome::Reply(to_json(self.robot.dimensions())),
            CraneCommand::GetPose => return Outcome::Reply(to_json(&self.robot.pose())),
            CraneCommand::StreamPoses => return Outcome::Stream(StreamKind::Joint),
            CraneCommand::StreamPosesForNewOrigin => return Outcome::Stream(StreamKind::Origin),
            CraneCommand::StreamPosesForNewOriginAndControlEndEffector => {
                return Outcome::Stream(StreamKind::Controlled);
            }
            CraneCommand::ResetRobot => {
                self.reset();
                Ok(())
            }
            CraneCommand::SetActuatorStates(target) => self.set_actuator_states(target.to_actuator_states()),
            CraneCommand::SetEndEffector(target) => self.set_end_effector(
                target.x,
                target.y,
                target.z,
                target.phi_rad(),
                target.do_open_gripper,
            ),
            CraneCommand::SetOrigin(target) => self.set_origin(target.to_origin()),
        };
        match result {
            Ok(()) => Outcome::Reply(ACK.to_string()),
            Err(e) => {
                warn!(session = %self.id, error = %e, "request rejected");
                Outcome::Reply(invalid_request(&e))
            }
        }
    }

    /// The goal is checked before settling, so a rejected request leaves both
    /// the resting and the current configuration as they were.
    fn set_actuator_states(&mut self, states: ActuatorStates) -> Result<(), CraneError> {
        self.robot.limits().check(&states)?;
        self.robot.settle();
        self.robot.validate_and_set(states)
    }

    fn set_end_effector(&mut self, x: f64, y: f64, z: f64, phi: f64, open: bool) -> Result<(), CraneError> {
        let states = self.robot.inverse_kinematics(x, y, z, phi, open)?;
        self.robot.limits().check(&states)?;
        self.robot.settle();
        self.robot.validate_and_set(states)
    }

    /// Command a new base origin with the arm held in its resting state.
    fn set_origin(&mut self, origin: Origin) -> Result<(), CraneError> {
        let rest = self.robot.act_states_t1().at_rest();
        self.robot.limits().check(&rest)?;
        self.robot.settle();
        self.robot.set_origin(origin);
        self.robot.validate_and_set(rest)
    }

    /// Build the step provider for a stream command.
    ///
    /// # Errors
    ///
    /// The controlled stream fails if the end effector cannot be solved at
    /// the resting origin.
    pub fn provider(&mut self, kind: StreamKind) -> Result<Box<dyn StepProvider + Send>, CraneError> {
        Ok(match kind {
            StreamKind::Joint => Box::new(JointMotion::for_robot(&self.robot)),
            StreamKind::Origin => Box::new(OriginMotion::for_robot(
                &self.robot,
                &self.settings.simulator.origin_limits,
            )),
            StreamKind::Controlled => Box::new(ControlledMotion::for_robot(
                &mut self.robot,
                self.settings.simulator,
            )?),
        })
    }
}
