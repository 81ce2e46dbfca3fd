//! Homogeneous transforms for the crane's kinematic chain.
//!
//! Every link is described by one [`DhRow`] (offset `d`, length `a`, twist
//! `alpha`, angle `theta`).  Composing the row transforms left to right,
//! starting from the origin-to-world transform, yields one frame per joint
//! whose translation column is that joint's world position.
//!
//! # Example
//!
//! ```rust
//! use crane_kinematics::transform::{DhRow, translation};
//!
//! // A 0.4 long link rotated by 90° ends at (0, 0.4, 0).
//! let link = DhRow::new(0.0, 0.4, 0.0, std::f64::consts::FRAC_PI_2);
//! let [x, y, z] = translation(&link.transform());
//! assert!(x.abs() < 1e-12);
//! assert!((y - 0.4).abs() < 1e-12);
//! assert_eq!(z, 0.0);
//! ```

use crane_types::{ActuatorStates, Dimensions, Origin};
use nalgebra::Matrix4;

// ────────────────────────────────────────────────────────────────────────────
// DH rows
// ────────────────────────────────────────────────────────────────────────────

/// One Denavit-Hartenberg parameter row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DhRow {
    pub d: f64,
    pub a: f64,
    pub alpha: f64,
    pub theta: f64,
}

impl DhRow {
    pub fn new(d: f64, a: f64, alpha: f64, theta: f64) -> Self {
        Self { d, a, alpha, theta }
    }

    /// The 4×4 homogeneous transform encoded by this row.
    #[rustfmt::skip]
    pub fn transform(&self) -> Matrix4<f64> {
        let (st, ct) = self.theta.sin_cos();
        let (sa, ca) = self.alpha.sin_cos();
        Matrix4::new(
            ct, -st * ca, st * sa, self.a * ct,
            st, ct * ca, -ct * sa, self.a * st,
            0.0, sa, ca, self.d,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

/// The six DH rows of the crane for a given geometry and joint state:
/// lift, swing + upper arm, elbow + lower arm, wrist + wrist extension,
/// fixed jaw and gripper opening.
pub fn dh_parameters(dims: &Dimensions, states: &ActuatorStates) -> [DhRow; 6] {
    [
        DhRow::new(states.d1, 0.0, 0.0, 0.0),
        DhRow::new(0.0, dims.l2, 0.0, states.theta1),
        DhRow::new(0.0, dims.l3, 0.0, states.theta2),
        DhRow::new(dims.d4, 0.0, 0.0, states.theta3),
        DhRow::new(0.0, dims.l5, 0.0, 0.0),
        DhRow::new(0.0, states.l6, 0.0, 0.0),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Origin transforms
// ────────────────────────────────────────────────────────────────────────────

/// World → robot-frame transform for an origin: a rotation by `-phi` about
/// z composed with a translation by `(-x, -y, -z)`.
#[rustfmt::skip]
pub fn origin_translation(origin: &Origin) -> Matrix4<f64> {
    let (s, c) = origin.phi.sin_cos();
    Matrix4::new(
        c, s, 0.0, -origin.x,
        -s, c, 0.0, -origin.y,
        0.0, 0.0, 1.0, -origin.z,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Robot-frame → world transform; the closed-form inverse of
/// [`origin_translation`].
#[rustfmt::skip]
pub fn origin_to_world(origin: &Origin) -> Matrix4<f64> {
    let (s, c) = origin.phi.sin_cos();
    Matrix4::new(
        c, -s, 0.0, c * origin.x - s * origin.y,
        s, c, 0.0, s * origin.x + c * origin.y,
        0.0, 0.0, 1.0, origin.z,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Translation column of a homogeneous transform.
pub fn translation(frame: &Matrix4<f64>) -> [f64; 3] {
    [frame[(0, 3)], frame[(1, 3)], frame[(2, 3)]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(a: &Matrix4<f64>, b: &Matrix4<f64>) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12, "{a} != {b}");
        }
    }

    #[test]
    fn zero_row_is_identity() {
        assert_close(&DhRow::new(0.0, 0.0, 0.0, 0.0).transform(), &Matrix4::identity());
    }

    #[test]
    fn offset_row_translates_along_z() {
        let t = DhRow::new(0.7, 0.0, 0.0, 0.0).transform();
        assert_eq!(translation(&t), [0.0, 0.0, 0.7]);
    }

    #[test]
    fn twist_rotates_about_x() {
        // alpha = 90° maps the local y axis onto z.
        let t = DhRow::new(0.0, 0.0, FRAC_PI_2, 0.0).transform();
        assert!(t[(1, 1)].abs() < 1e-12);
        assert!((t[(2, 1)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn origin_to_world_inverts_origin_translation() {
        let origin = Origin::new(0.3, -0.2, 0.4, 0.7);
        let product = origin_to_world(&origin) * origin_translation(&origin);
        assert_close(&product, &Matrix4::identity());

        let product = origin_translation(&origin) * origin_to_world(&origin);
        assert_close(&product, &Matrix4::identity());
    }

    #[test]
    fn zero_origin_is_identity() {
        assert_close(&origin_translation(&Origin::default()), &Matrix4::identity());
    }

    #[test]
    fn dh_rows_follow_joint_state() {
        let dims = Dimensions::default();
        let states = ActuatorStates::new(0.6, 0.1, 0.2, 0.3, 0.05);
        let rows = dh_parameters(&dims, &states);
        assert_eq!(rows[0].d, 0.6);
        assert_eq!(rows[1].theta, 0.1);
        assert_eq!(rows[2].a, dims.l3);
        assert_eq!(rows[3].d, dims.d4);
        assert_eq!(rows[4].a, dims.l5);
        assert_eq!(rows[5].a, 0.05);
    }
}
