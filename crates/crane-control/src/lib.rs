//! `crane-control` – closed-loop control of the crane.
//!
//! * [`pid`] – single-axis discrete PID controller with output saturation.
//! * [`simulator`] – couples a moving base to four PID controllers that hold
//!   the end effector at a fixed world pose.

pub mod pid;
pub mod simulator;

pub use pid::PidController;
pub use simulator::{ControlSimulator, EndEffectorPose, SimulatorSettings, TrackingSample};
