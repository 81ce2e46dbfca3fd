//! [`Pose`] – the render-ready projection of the crane's kinematic state.

use serde::{Deserialize, Serialize};

use crate::states::{ActuatorStates, Origin};

/// World positions of every frame in the chain plus the angles a renderer
/// needs to orient the links.
///
/// `j_1` is the base, `j_7` the gripper tip.  Produced fresh for every
/// emitted sample; carries no further state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub j_1: [f64; 3],
    pub j_2: [f64; 3],
    pub j_3: [f64; 3],
    pub j_4: [f64; 3],
    pub j_5: [f64; 3],
    pub j_6: [f64; 3],
    pub j_7: [f64; 3],
    /// Origin yaw.
    pub theta_0: f64,
    pub theta_1: f64,
    pub theta_2: f64,
    pub theta_3: f64,
}

impl Pose {
    /// Assemble a pose from the seven joint positions, the origin and the
    /// actuator state they were computed from.
    pub fn from_parts(joints: [[f64; 3]; 7], origin: &Origin, states: &ActuatorStates) -> Self {
        Self {
            j_1: joints[0],
            j_2: joints[1],
            j_3: joints[2],
            j_4: joints[3],
            j_5: joints[4],
            j_6: joints[5],
            j_7: joints[6],
            theta_0: origin.phi,
            theta_1: states.theta1,
            theta_2: states.theta2,
            theta_3: states.theta3,
        }
    }
}
