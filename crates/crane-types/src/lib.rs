//! `crane-types` – shared vocabulary of the crane workspace.
//!
//! Every other crate speaks in these types: the joint snapshot
//! [`ActuatorStates`], the movable base [`Origin`], the fixed geometry
//! [`Dimensions`], the rendered [`Pose`], the decoded client
//! [`CraneCommand`] and the single error enum [`CraneError`].
//!
//! Angles are radians everywhere inside the workspace.  The only place
//! degrees appear is the wire-level command payloads in [`command`], which
//! convert on the way in.

pub mod command;
pub mod pose;
pub mod states;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use command::{CraneCommand, EndEffectorTarget, JointTarget, OriginTarget};
pub use pose::Pose;
pub use states::{ActuatorStates, Dimensions, MotionLimits, Origin};

/// The five actuated axes of the crane, in kinematic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Joint {
    /// Vertical lift along the base column (`d1`, length).
    Lift,
    /// Swing of the upper arm around the column (`theta1`).
    Swing,
    /// Elbow between upper and lower arm (`theta2`).
    Elbow,
    /// Wrist rotation (`theta3`).
    Wrist,
    /// Jaw opening (`l6`, length).
    Jaw,
}

impl std::fmt::Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Joint::Lift => write!(f, "D1"),
            Joint::Swing => write!(f, "Theta 1"),
            Joint::Elbow => write!(f, "Theta 2"),
            Joint::Wrist => write!(f, "Theta 3"),
            Joint::Jaw => write!(f, "L6"),
        }
    }
}

/// Error type spanning state validation, inverse kinematics and the session
/// boundary.
///
/// Core errors never leave partial state behind: the update that produced
/// them is rejected as a whole.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CraneError {
    #[error("Position out of reach: {joint} is out of bounds ({value:.4} not in [{min:.4}, {max:.4}])")]
    JointLimitViolation {
        joint: Joint,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Given end-effector position is out of reach: cos(theta 2) = {cos_theta_2:.4}")]
    UnreachablePose { cos_theta_2: f64 },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid setting: {name} must be a positive, finite frequency (got {value})")]
    InvalidFrequency { name: String, value: f64 },
}

impl CraneError {
    /// Check that `value` can serve as a rate in Hz.
    pub fn check_frequency(name: &str, value: f64) -> Result<f64, CraneError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(CraneError::InvalidFrequency {
                name: name.to_string(),
                value,
            })
        }
    }
}
