//! Value types describing the crane's joints, base and geometry.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// ActuatorStates
// ────────────────────────────────────────────────────────────────────────────

/// One snapshot of all five joint coordinates and their first two
/// derivatives.
///
/// Lengths (`d1`, `l6`) share the unit of [`Dimensions`]; angles are radians.
/// The type is `Copy` and is never mutated in place: every state transition
/// produces a new value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActuatorStates {
    pub d1: f64,
    pub theta1: f64,
    pub theta2: f64,
    pub theta3: f64,
    pub l6: f64,

    pub d1_v: f64,
    pub theta1_v: f64,
    pub theta2_v: f64,
    pub theta3_v: f64,
    pub l6_v: f64,

    pub d1_a: f64,
    pub theta1_a: f64,
    pub theta2_a: f64,
    pub theta3_a: f64,
    pub l6_a: f64,
}

impl ActuatorStates {
    /// Number of actuated axes.
    pub const AXES: usize = 5;

    /// Create a resting state (zero velocity and acceleration).
    pub fn new(d1: f64, theta1: f64, theta2: f64, theta3: f64, l6: f64) -> Self {
        Self::from_positions([d1, theta1, theta2, theta3, l6])
    }

    /// The crane's power-on pose: lifted to 0.7, arm stretched out, jaw open.
    pub fn home() -> Self {
        Self::new(0.7, 0.0, 0.0, 0.0, 0.1)
    }

    /// Build a resting state from positions in axis order
    /// `[d1, theta1, theta2, theta3, l6]`.
    pub fn from_positions(p: [f64; Self::AXES]) -> Self {
        Self::from_axes(p, [0.0; Self::AXES], [0.0; Self::AXES])
    }

    /// Build a state from per-axis positions, velocities and accelerations.
    pub fn from_axes(
        p: [f64; Self::AXES],
        v: [f64; Self::AXES],
        a: [f64; Self::AXES],
    ) -> Self {
        Self {
            d1: p[0],
            theta1: p[1],
            theta2: p[2],
            theta3: p[3],
            l6: p[4],
            d1_v: v[0],
            theta1_v: v[1],
            theta2_v: v[2],
            theta3_v: v[3],
            l6_v: v[4],
            d1_a: a[0],
            theta1_a: a[1],
            theta2_a: a[2],
            theta3_a: a[3],
            l6_a: a[4],
        }
    }

    pub fn positions(&self) -> [f64; Self::AXES] {
        [self.d1, self.theta1, self.theta2, self.theta3, self.l6]
    }

    pub fn velocities(&self) -> [f64; Self::AXES] {
        [self.d1_v, self.theta1_v, self.theta2_v, self.theta3_v, self.l6_v]
    }

    pub fn accelerations(&self) -> [f64; Self::AXES] {
        [self.d1_a, self.theta1_a, self.theta2_a, self.theta3_a, self.l6_a]
    }

    /// Same positions with velocity and acceleration reset to zero.
    ///
    /// Used whenever a reached state is adopted as the next resting pose.
    pub fn at_rest(&self) -> Self {
        Self::from_positions(self.positions())
    }
}

impl std::fmt::Display for ActuatorStates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "d1 = {:.4}, theta1 = {:.4}, theta2 = {:.4}, theta3 = {:.4}, l6 = {:.4}",
            self.d1, self.theta1, self.theta2, self.theta3, self.l6
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Origin
// ────────────────────────────────────────────────────────────────────────────

/// World-frame translation and yaw of the robot's base.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Origin {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Yaw around the world z axis, radians.
    pub phi: f64,
}

impl Origin {
    pub fn new(x: f64, y: f64, z: f64, phi: f64) -> Self {
        Self { x, y, z, phi }
    }

    /// Components in axis order `[x, y, z, phi]`.
    pub fn axes(&self) -> [f64; 4] {
        [self.x, self.y, self.z, self.phi]
    }

    pub fn from_axes(a: [f64; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dimensions
// ────────────────────────────────────────────────────────────────────────────

/// Fixed link geometry of the crane.
///
/// Serialised with the `l_1 … l_7` keys clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Base column length; upper bound of the lift.
    #[serde(rename = "l_1")]
    pub l1: f64,
    /// Upper arm length.
    #[serde(rename = "l_2")]
    pub l2: f64,
    /// Lower arm length.
    #[serde(rename = "l_3")]
    pub l3: f64,
    /// Wrist extension along z.  Signed; negative hangs below the arm.
    #[serde(rename = "d_4")]
    pub d4: f64,
    /// Gripper length.
    #[serde(rename = "l_5")]
    pub l5: f64,
    /// Maximum jaw extension.
    #[serde(rename = "l_7")]
    pub l7: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            l1: 1.0,
            l2: 0.4,
            l3: 0.4,
            d4: -0.2,
            l5: 0.1,
            l7: 0.1,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MotionLimits
// ────────────────────────────────────────────────────────────────────────────

/// Velocity and acceleration bounds used to time a move.
///
/// Linear limits apply to length axes, angular limits to rotational axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionLimits {
    pub max_vel: f64,
    pub max_acc: f64,
    pub max_ang_vel: f64,
    pub max_ang_acc: f64,
}

impl MotionLimits {
    pub fn uniform(value: f64) -> Self {
        Self {
            max_vel: value,
            max_acc: value,
            max_ang_vel: value,
            max_ang_acc: value,
        }
    }

    /// Default limits for the crane's own joints.
    pub fn robot_default() -> Self {
        Self::uniform(0.7)
    }

    /// Default limits for a moving base, deliberately slower than the arm.
    pub fn origin_default() -> Self {
        Self::uniform(0.1)
    }
}

impl Default for MotionLimits {
    fn default() -> Self {
        Self::robot_default()
    }
}
