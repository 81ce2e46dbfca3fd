//! Client commands, as decoded from the session wire format.
//!
//! Every command is a JSON object tagged by `action` with an optional `data`
//! payload:
//!
//! ```json
//! {"action": "set_end_effector", "data": {"x": 0.4, "y": 0.4, "z": 0.5, "phi": 0, "doOpenGripper": true}}
//! ```
//!
//! Angles in payloads are degrees; the `to_*` conversions turn them into the
//! radian-based core types.

use serde::{Deserialize, Serialize};

use crate::states::{ActuatorStates, Origin};

/// Closed set of requests a session can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum CraneCommand {
    /// Handshake; answered with the robot's dimensions.
    InitializeConnection,
    /// Replace the session's robot with a freshly constructed one.
    ResetRobot,
    /// Command a joint-space goal.
    SetActuatorStates(JointTarget),
    /// Command an end-effector goal, solved through inverse kinematics.
    SetEndEffector(EndEffectorTarget),
    /// Command a new base origin while keeping the resting joint state.
    SetOrigin(OriginTarget),
    /// Answer with the current pose.
    GetPose,
    /// Stream a joint-space move with a fixed origin.
    StreamPoses,
    /// Stream a joint-space move while the origin travels to its goal.
    StreamPosesForNewOrigin,
    /// Stream the closed-loop simulation that holds the end effector still
    /// while the origin travels.
    StreamPosesForNewOriginAndControlEndEffector,
}

impl CraneCommand {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            CraneCommand::InitializeConnection => "initialize_connection",
            CraneCommand::ResetRobot => "reset_robot",
            CraneCommand::SetActuatorStates(_) => "set_actuator_states",
            CraneCommand::SetEndEffector(_) => "set_end_effector",
            CraneCommand::SetOrigin(_) => "set_origin",
            CraneCommand::GetPose => "get_pose",
            CraneCommand::StreamPoses => "stream_poses",
            CraneCommand::StreamPosesForNewOrigin => "stream_poses_for_new_origin",
            CraneCommand::StreamPosesForNewOriginAndControlEndEffector => {
                "stream_poses_for_new_origin_and_control_end_effector"
            }
        }
    }
}

/// Joint-space goal; angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointTarget {
    pub d_1: f64,
    pub theta_1: f64,
    pub theta_2: f64,
    pub theta_3: f64,
    pub l_6: f64,
}

impl JointTarget {
    pub fn to_actuator_states(&self) -> ActuatorStates {
        ActuatorStates::new(
            self.d_1,
            self.theta_1.to_radians(),
            self.theta_2.to_radians(),
            self.theta_3.to_radians(),
            self.l_6,
        )
    }
}

/// World-space end-effector goal; `phi` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndEffectorTarget {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub phi: f64,
    #[serde(rename = "doOpenGripper", default = "default_open_gripper")]
    pub do_open_gripper: bool,
}

fn default_open_gripper() -> bool {
    true
}

impl EndEffectorTarget {
    /// Yaw in radians.
    pub fn phi_rad(&self) -> f64 {
        self.phi.to_radians()
    }
}

/// World-space origin goal; `phi` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginTarget {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub phi: f64,
}

impl OriginTarget {
    pub fn to_origin(&self) -> Origin {
        Origin::new(self.x, self.y, self.z, self.phi.to_radians())
    }
}
