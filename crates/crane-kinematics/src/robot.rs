//! [`RobotCrane`] – the crane's kinematic model.
//!
//! The model tracks two origin/actuator pairs:
//!
//! * `t0` – the resting configuration a move starts from.
//! * `t1` – the current (or commanded) configuration.
//!
//! `act_states_t1` only ever holds states that pass [`JointLimits::check`];
//! a rejected update leaves the model untouched.

use crane_types::{ActuatorStates, CraneError, Dimensions, Joint, MotionLimits, Origin, Pose};
use nalgebra::{Matrix4, Vector4};
use tracing::debug;

use crate::transform::{dh_parameters, origin_to_world, origin_translation, translation, DhRow};

/// A homogeneous transform from the world frame to one joint.
pub type Frame = Matrix4<f64>;

/// Number of frames produced by forward kinematics: the base plus one per
/// DH row.
pub const FRAME_COUNT: usize = 7;

/// Jaw opening assumed by inverse kinematics when the gripper is open.
const JAW_OPEN: f64 = 0.1;
/// Jaw opening assumed by inverse kinematics when the gripper is closed.
const JAW_CLOSED: f64 = 0.0;

/// Slack allowed on `|cos(theta2)| <= 1` for targets at exactly full reach.
const REACH_EPSILON: f64 = 1e-9;

// ────────────────────────────────────────────────────────────────────────────
// JointLimits
// ────────────────────────────────────────────────────────────────────────────

/// Static per-axis bounds derived from the crane's dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimits {
    /// Lift range `[|d4|, l1]`.
    pub d1: (f64, f64),
    /// Swing and wrist range, `±360°`.
    pub angle: (f64, f64),
    /// Elbow range, `±150°`, keeping the lower arm clear of the upper arm.
    pub theta2: (f64, f64),
    /// Jaw range `±l7`.
    pub l6: (f64, f64),
}

impl JointLimits {
    pub fn from_dimensions(dims: &Dimensions) -> Self {
        let max_angle = 360f64.to_radians();
        let max_elbow = 150f64.to_radians();
        Self {
            d1: (dims.d4.abs(), dims.l1),
            angle: (-max_angle, max_angle),
            theta2: (-max_elbow, max_elbow),
            l6: (-dims.l7, dims.l7),
        }
    }

    /// Check every axis of `states`, reporting the first one out of bounds.
    pub fn check(&self, states: &ActuatorStates) -> Result<(), CraneError> {
        let axes = [
            (Joint::Lift, states.d1, self.d1),
            (Joint::Swing, states.theta1, self.angle),
            (Joint::Elbow, states.theta2, self.theta2),
            (Joint::Wrist, states.theta3, self.angle),
            (Joint::Jaw, states.l6, self.l6),
        ];
        for (joint, value, (min, max)) in axes {
            if !(min..=max).contains(&value) {
                return Err(CraneError::JointLimitViolation {
                    joint,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RobotCrane
// ────────────────────────────────────────────────────────────────────────────

/// Kinematic model of a 4-DOF crane with a gripper on a movable base.
///
/// # Example
///
/// ```rust
/// use crane_kinematics::RobotCrane;
/// use crane_types::ActuatorStates;
///
/// let mut robot = RobotCrane::default();
///
/// // Lift beyond the column is rejected and the state is kept.
/// let too_high = ActuatorStates::new(1.5, 0.0, 0.0, 0.0, 0.1);
/// assert!(robot.validate_and_set(too_high).is_err());
/// assert_eq!(robot.act_states_t1(), &ActuatorStates::home());
/// ```
#[derive(Debug, Clone)]
pub struct RobotCrane {
    dimensions: Dimensions,
    limits: JointLimits,
    motion_limits: MotionLimits,

    origin_t0: Origin,
    origin_t1: Origin,
    /// World → robot transform of `origin_t1`.
    origin_transform: Matrix4<f64>,

    act_states_t0: ActuatorStates,
    act_states_t1: ActuatorStates,
}

impl Default for RobotCrane {
    fn default() -> Self {
        Self::new(Dimensions::default(), MotionLimits::robot_default())
    }
}

impl RobotCrane {
    /// Create a crane at the home state with its origin at the world origin.
    pub fn new(dimensions: Dimensions, motion_limits: MotionLimits) -> Self {
        Self {
            dimensions,
            limits: JointLimits::from_dimensions(&dimensions),
            motion_limits,
            origin_t0: Origin::default(),
            origin_t1: Origin::default(),
            origin_transform: Matrix4::identity(),
            act_states_t0: ActuatorStates::home(),
            act_states_t1: ActuatorStates::home(),
        }
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    pub fn motion_limits(&self) -> &MotionLimits {
        &self.motion_limits
    }

    pub fn origin_t0(&self) -> &Origin {
        &self.origin_t0
    }

    pub fn origin_t1(&self) -> &Origin {
        &self.origin_t1
    }

    pub fn act_states_t0(&self) -> &ActuatorStates {
        &self.act_states_t0
    }

    pub fn act_states_t1(&self) -> &ActuatorStates {
        &self.act_states_t1
    }

    // ── State updates ──────────────────────────────────────────────────────

    /// Replace `act_states_t1` if every axis is within its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CraneError::JointLimitViolation`] naming the first offending
    /// axis; the current state is left unchanged.
    pub fn validate_and_set(&mut self, states: ActuatorStates) -> Result<(), CraneError> {
        if let Err(e) = self.limits.check(&states) {
            debug!(error = %e, "rejected actuator state");
            return Err(e);
        }
        self.act_states_t1 = states;
        Ok(())
    }

    /// Replace `origin_t1` and recompute the origin transform.
    ///
    /// The actuator state is not touched; callers that want the arm to keep
    /// its resting pose under the new frame re-apply `act_states_t0`.
    pub fn set_origin(&mut self, origin: Origin) {
        self.origin_t1 = origin;
        self.origin_transform = origin_translation(&origin);
    }

    /// Adopt the current configuration as the resting one.
    ///
    /// The actuator state is stored with velocity and acceleration reset to
    /// zero.
    pub fn settle(&mut self) {
        self.act_states_t0 = self.act_states_t1.at_rest();
        self.origin_t0 = self.origin_t1;
    }

    // ── Forward kinematics ─────────────────────────────────────────────────

    /// DH rows for the current actuator state.
    pub fn dh_parameters(&self) -> [DhRow; 6] {
        dh_parameters(&self.dimensions, &self.act_states_t1)
    }

    /// World frames of the base and every joint, base first and gripper tip
    /// last.
    pub fn forward_kinematics(&self) -> [Frame; FRAME_COUNT] {
        let mut frames = [Matrix4::identity(); FRAME_COUNT];
        frames[0] = origin_to_world(&self.origin_t1);
        for (i, row) in self.dh_parameters().iter().enumerate() {
            frames[i + 1] = frames[i] * row.transform();
        }
        frames
    }

    /// World positions of all frames.
    pub fn joint_positions(&self) -> [[f64; 3]; FRAME_COUNT] {
        self.forward_kinematics().map(|f| translation(&f))
    }

    fn end_effector(&self) -> [f64; 3] {
        translation(&self.forward_kinematics()[FRAME_COUNT - 1])
    }

    pub fn x_position(&self) -> f64 {
        self.end_effector()[0]
    }

    pub fn y_position(&self) -> f64 {
        self.end_effector()[1]
    }

    pub fn z_position(&self) -> f64 {
        self.end_effector()[2]
    }

    /// World yaw of the end effector: origin yaw plus the three rotational
    /// joints.
    pub fn phi(&self) -> f64 {
        let s = &self.act_states_t1;
        self.origin_t1.phi + s.theta1 + s.theta2 + s.theta3
    }

    /// Render-ready projection of the current state.
    pub fn pose(&self) -> Pose {
        Pose::from_parts(self.joint_positions(), &self.origin_t1, &self.act_states_t1)
    }

    // ── Inverse kinematics ─────────────────────────────────────────────────

    /// Solve the actuator state that puts the gripper tip at world position
    /// `(x, y, z)` with world yaw `phi`.
    ///
    /// The target is first expressed in the current origin frame; `phi` is
    /// taken relative to the origin's own yaw, so the result satisfies
    /// `phi() == phi` once adopted.  The elbow-up branch (`theta2 >= 0`) is
    /// always chosen.  The result is not limit-checked; route it through
    /// [`validate_and_set`][Self::validate_and_set].
    ///
    /// # Errors
    ///
    /// Returns [`CraneError::UnreachablePose`] when the wrist lies outside the
    /// annulus reachable by the two arm links.
    pub fn inverse_kinematics(
        &self,
        x: f64,
        y: f64,
        z: f64,
        phi: f64,
        open_gripper: bool,
    ) -> Result<ActuatorStates, CraneError> {
        let jaw = if open_gripper { JAW_OPEN } else { JAW_CLOSED };
        self.inverse_kinematics_with_jaw(x, y, z, phi, jaw)
    }

    /// [`inverse_kinematics`][Self::inverse_kinematics] for an explicit jaw
    /// opening `l6`, which is carried into the result unchanged.
    pub fn inverse_kinematics_with_jaw(
        &self,
        x: f64,
        y: f64,
        z: f64,
        phi: f64,
        l6: f64,
    ) -> Result<ActuatorStates, CraneError> {
        let local = self.origin_transform * Vector4::new(x, y, z, 1.0);
        let phi = phi - self.origin_t1.phi;
        let Dimensions { l2, l3, d4, l5, .. } = self.dimensions;

        let (sin_phi, cos_phi) = phi.sin_cos();

        // Walk back from the tip along the approach direction to the wrist.
        let wx = local.x - (l6 + l5) * cos_phi;
        let wy = local.y - (l6 + l5) * sin_phi;

        let cos_theta2 = (wx * wx + wy * wy - l2 * l2 - l3 * l3) / (2.0 * l2 * l3);
        if !(cos_theta2.abs() <= 1.0 + REACH_EPSILON) {
            debug!(cos_theta2, x, y, z, "end-effector target out of reach");
            return Err(CraneError::UnreachablePose { cos_theta_2: cos_theta2 });
        }
        let cos_theta2 = cos_theta2.clamp(-1.0, 1.0);
        let sin_theta2 = (1.0 - cos_theta2 * cos_theta2).sqrt();
        let theta2 = sin_theta2.atan2(cos_theta2);

        let k1 = l2 + l3 * cos_theta2;
        let k2 = l3 * sin_theta2;
        let theta1 = wy.atan2(wx) - k2.atan2(k1);
        let theta3 = phi - theta1 - theta2;
        let d1 = local.z - d4;

        Ok(ActuatorStates::new(d1, theta1, theta2, theta3, l6))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const TOL: f64 = 1e-4;

    fn assert_xyz(actual: [f64; 3], expected: [f64; 3]) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < TOL, "{actual:?} != {expected:?}");
        }
    }

    // ── Validation ──────────────────────────────────────────────────────────

    #[test]
    fn home_frames_match_link_geometry() {
        let robot = RobotCrane::default();
        let joints = robot.joint_positions();
        assert_xyz(joints[0], [0.0, 0.0, 0.0]);
        assert_xyz(joints[1], [0.0, 0.0, 0.7]);
        assert_xyz(joints[2], [0.4, 0.0, 0.7]);
        assert_xyz(joints[3], [0.8, 0.0, 0.7]);
        assert_xyz(joints[4], [0.8, 0.0, 0.5]);
        assert_xyz(joints[5], [0.9, 0.0, 0.5]);
        assert_xyz(joints[6], [1.0, 0.0, 0.5]);
    }

    #[test]
    fn valid_state_is_adopted_and_reflected_in_frames() {
        let mut robot = RobotCrane::default();
        let states = ActuatorStates::new(0.5, FRAC_PI_2, 0.0, 0.0, 0.05);
        robot.validate_and_set(states).unwrap();
        assert_eq!(robot.act_states_t1(), &states);
        let before = robot.joint_positions();

        // Setting the same state again changes nothing.
        robot.validate_and_set(states).unwrap();
        assert_eq!(robot.joint_positions(), before);

        // Swing of 90° points the arm along +y.
        assert_xyz(before[6], [0.0, 0.95, 0.3]);
    }

    #[test]
    fn lift_below_wrist_extension_is_rejected() {
        let mut robot = RobotCrane::default();
        let err = robot
            .validate_and_set(ActuatorStates::new(0.1, 0.0, 0.0, 0.0, 0.1))
            .unwrap_err();
        assert!(matches!(
            err,
            CraneError::JointLimitViolation { joint: Joint::Lift, .. }
        ));
        assert_eq!(robot.act_states_t1(), &ActuatorStates::home());
    }

    #[test]
    fn elbow_beyond_150_degrees_is_rejected() {
        let mut robot = RobotCrane::default();
        let err = robot
            .validate_and_set(ActuatorStates::new(0.7, 0.0, 151f64.to_radians(), 0.0, 0.1))
            .unwrap_err();
        assert!(matches!(
            err,
            CraneError::JointLimitViolation { joint: Joint::Elbow, .. }
        ));
    }

    #[test]
    fn wrist_beyond_full_turn_is_rejected() {
        let mut robot = RobotCrane::default();
        let err = robot
            .validate_and_set(ActuatorStates::new(0.7, 0.0, 0.0, 361f64.to_radians(), 0.1))
            .unwrap_err();
        assert!(matches!(
            err,
            CraneError::JointLimitViolation { joint: Joint::Wrist, .. }
        ));
    }

    #[test]
    fn jaw_beyond_max_extension_is_rejected() {
        let mut robot = RobotCrane::default();
        let err = robot
            .validate_and_set(ActuatorStates::new(0.7, 0.0, 0.0, 0.0, 0.2))
            .unwrap_err();
        assert!(matches!(
            err,
            CraneError::JointLimitViolation { joint: Joint::Jaw, .. }
        ));
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut robot = RobotCrane::default();
        let limits = *robot.limits();
        let edge = ActuatorStates::new(
            limits.d1.1,
            limits.angle.0,
            limits.theta2.1,
            limits.angle.1,
            limits.l6.0,
        );
        robot.validate_and_set(edge).unwrap();
    }

    // ── Inverse kinematics ──────────────────────────────────────────────────

    #[test]
    fn inverse_kinematics_reference_target() {
        let robot = RobotCrane::default();
        let states = robot.inverse_kinematics(0.4, 0.4, 0.5, 0.0, true).unwrap();
        assert!((states.d1 - 0.7).abs() < 1e-9);
        assert!(states.theta2 >= 0.0 && states.theta2 <= 150f64.to_radians());
        assert_eq!(states.l6, JAW_OPEN);
    }

    #[test]
    fn inverse_then_forward_reproduces_target() {
        let targets = [
            (0.4, 0.4, 0.5, 0.0),
            (0.6, -0.2, 0.7, 0.3),
            (-0.3, 0.5, 0.4, 2.0),
            (0.2, 0.2, 0.6, -1.0),
            (1.0, 0.0, 0.5, 0.0),
        ];
        for (x, y, z, phi) in targets {
            let mut robot = RobotCrane::default();
            let states = robot.inverse_kinematics(x, y, z, phi, true).unwrap();
            robot.validate_and_set(states).unwrap();
            assert_xyz(robot.joint_positions()[6], [x, y, z]);
            assert!((robot.phi() - phi).abs() < TOL);
        }
    }

    #[test]
    fn inverse_kinematics_with_closed_gripper() {
        let mut robot = RobotCrane::default();
        let states = robot.inverse_kinematics(0.5, 0.3, 0.6, 0.5, false).unwrap();
        assert_eq!(states.l6, JAW_CLOSED);
        robot.validate_and_set(states).unwrap();
        assert_xyz(robot.joint_positions()[6], [0.5, 0.3, 0.6]);
    }

    #[test]
    fn inverse_kinematics_keeps_explicit_jaw() {
        let mut robot = RobotCrane::default();
        let states = robot
            .inverse_kinematics_with_jaw(0.5, 0.3, 0.6, 0.5, 0.04)
            .unwrap();
        assert_eq!(states.l6, 0.04);
        robot.validate_and_set(states).unwrap();
        assert_xyz(robot.joint_positions()[6], [0.5, 0.3, 0.6]);
    }

    #[test]
    fn inverse_then_forward_under_moved_origin() {
        let mut robot = RobotCrane::default();
        robot.set_origin(Origin::new(0.2, -0.1, 0.1, 0.6));
        let states = robot.inverse_kinematics(0.5, 0.4, 0.6, 1.2, true).unwrap();
        robot.validate_and_set(states).unwrap();
        assert_xyz(robot.joint_positions()[6], [0.5, 0.4, 0.6]);
        assert!((robot.phi() - 1.2).abs() < TOL);
    }

    #[test]
    fn target_beyond_reach_is_unreachable() {
        let robot = RobotCrane::default();
        let err = robot.inverse_kinematics(2.0, 0.0, 0.5, 0.0, true).unwrap_err();
        match err {
            CraneError::UnreachablePose { cos_theta_2 } => assert!(cos_theta_2 > 1.0),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn target_inside_inner_disc_is_unreachable() {
        let dims = Dimensions {
            l3: 0.2,
            ..Dimensions::default()
        };
        let robot = RobotCrane::new(dims, MotionLimits::robot_default());
        // Wrist at the shoulder: |l2 - l3| = 0.2 > 0, nothing reaches it.
        let err = robot.inverse_kinematics(0.2, 0.0, 0.5, 0.0, true).unwrap_err();
        assert!(matches!(err, CraneError::UnreachablePose { .. }));
    }

    // ── Origin ──────────────────────────────────────────────────────────────

    #[test]
    fn raised_and_rotated_origin_shifts_end_effector() {
        let mut robot = RobotCrane::default();
        robot.set_origin(Origin::new(0.0, 0.0, 0.2, FRAC_PI_2));
        let tip = robot.joint_positions()[6];
        assert!((tip[2] - 0.7).abs() < TOL);
        assert_xyz(tip, [0.0, 1.0, 0.7]);
        assert!((robot.phi() - FRAC_PI_2).abs() < 1e-12);
        // The actuator state is untouched.
        assert_eq!(robot.act_states_t1(), &ActuatorStates::home());
    }

    #[test]
    fn settle_adopts_current_configuration_at_rest() {
        let mut robot = RobotCrane::default();
        let moving = ActuatorStates::from_axes([0.6, 0.1, 0.2, 0.3, 0.05], [1.0; 5], [2.0; 5]);
        robot.validate_and_set(moving).unwrap();
        robot.set_origin(Origin::new(0.1, 0.0, 0.0, 0.0));
        robot.settle();

        assert_eq!(robot.act_states_t0(), &moving.at_rest());
        assert_eq!(robot.origin_t0(), robot.origin_t1());
    }

    #[test]
    fn pose_carries_origin_yaw_and_joint_angles() {
        let mut robot = RobotCrane::default();
        robot.set_origin(Origin::new(0.0, 0.0, 0.0, 0.5));
        robot
            .validate_and_set(ActuatorStates::new(0.7, 0.1, 0.2, 0.3, 0.1))
            .unwrap();
        let pose = robot.pose();
        assert_eq!(pose.theta_0, 0.5);
        assert_eq!(pose.theta_3, 0.3);
        assert_eq!(pose.j_7, robot.joint_positions()[6]);
    }
}
