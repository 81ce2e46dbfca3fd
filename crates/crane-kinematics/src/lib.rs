//! `crane-kinematics` – geometry of the lift-swing-elbow-wrist crane.
//!
//! # Modules
//!
//! - [`transform`] – Denavit-Hartenberg rows and the homogeneous transforms
//!   that map between the world frame, the movable origin and each joint.
//! - [`robot`] – [`RobotCrane`][robot::RobotCrane]: the kinematic model.
//!   Owns the dimensions, the resting and current origin/actuator states,
//!   validates every state it adopts and answers forward and inverse
//!   kinematics queries.
//!
//! # Example
//!
//! ```rust
//! use crane_kinematics::RobotCrane;
//!
//! let mut robot = RobotCrane::default();
//! let goal = robot.inverse_kinematics(0.4, 0.4, 0.5, 0.0, true).unwrap();
//! robot.validate_and_set(goal).unwrap();
//!
//! assert!((robot.x_position() - 0.4).abs() < 1e-6);
//! assert!((robot.z_position() - 0.5).abs() < 1e-6);
//! ```

pub mod robot;
pub mod transform;

pub use robot::{Frame, JointLimits, RobotCrane, FRAME_COUNT};
pub use transform::DhRow;
