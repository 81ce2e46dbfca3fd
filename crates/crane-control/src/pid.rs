//! Discrete PID controller producing per-period displacements.
//!
//! The controller is sampled at a fixed `control_frequency`.  Its output is
//! the increment to add to the axis position for the next control period,
//! saturated at `max_velocity / control_frequency`.
//!
//! # Example
//!
//! ```rust
//! use crane_control::pid::PidController;
//!
//! let mut pid = PidController::new(0.3, 0.74, 0.001, 20.0, 0.7);
//! pid.set_target(1.0);
//!
//! let step = pid.calculate_signal(0.0);
//! assert!(step > 0.0);
//! assert!(step <= 0.7 / 20.0);
//! ```

/// Single-axis PID controller with output saturation.
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    /// Seconds between control updates.
    sample_period: f64,
    max_signal: f64,

    target: f64,
    integral: f64,
    last_measured: Option<f64>,
    signal: f64,
    total_error: f64,
}

impl PidController {
    /// Create a controller sampled at `control_frequency` Hz whose output may
    /// move the axis at most `max_velocity` units per second.
    pub fn new(kp: f64, ki: f64, kd: f64, control_frequency: f64, max_velocity: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            sample_period: 1.0 / control_frequency,
            max_signal: max_velocity / control_frequency,
            target: 0.0,
            integral: 0.0,
            last_measured: None,
            signal: 0.0,
            total_error: 0.0,
        }
    }

    /// Replace the target.  The integral restarts from zero.
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
        self.integral = 0.0;
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// The last emitted signal.
    pub fn signal(&self) -> f64 {
        self.signal
    }

    /// Saturation bound of the signal.
    pub fn max_signal(&self) -> f64 {
        self.max_signal
    }

    /// Sum of `|error|` over every control update so far.
    pub fn total_error(&self) -> f64 {
        self.total_error
    }

    /// Run one control update against `measured` and return the new signal.
    ///
    /// The derivative acts on the measurement, so the first update after
    /// construction has no derivative term.
    pub fn calculate_signal(&mut self, measured: f64) -> f64 {
        let error = self.target - measured;
        let last = self.last_measured.unwrap_or(measured);

        self.integral += error;
        let derivative = (measured - last) / self.sample_period;

        let raw = self.kp * error + self.ki * self.integral + self.kd * derivative;
        self.signal = raw.clamp(-self.max_signal, self.max_signal);

        self.total_error += error.abs();
        self.last_measured = Some(measured);
        self.signal
    }

    /// Zero-order hold: repeat the last signal without a control update.
    pub fn hold_last_signal(&self) -> f64 {
        self.signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p_only() -> PidController {
        PidController::new(2.0, 0.0, 0.0, 10.0, 100.0)
    }

    #[test]
    fn proportional_only_drives_toward_target() {
        let mut pid = p_only();
        pid.set_target(1.0);
        // error = 1.0 → signal = 2.0 * 1.0
        assert!((pid.calculate_signal(0.0) - 2.0).abs() < 1e-12);
        assert!(pid.calculate_signal(2.0) < 0.0);
    }

    #[test]
    fn signal_is_zero_at_target() {
        let mut pid = PidController::new(0.3, 0.74, 0.001, 20.0, 0.7);
        pid.set_target(0.5);
        assert!(pid.calculate_signal(0.5).abs() < 1e-12);
    }

    #[test]
    fn signal_saturates_for_any_error() {
        let mut pid = PidController::new(0.3, 0.74, 0.001, 20.0, 0.7);
        let bound = 0.7 / 20.0;
        assert!((pid.max_signal() - bound).abs() < 1e-15);
        for target in [1e-3, 1.0, -5.0, 1e6, -1e12] {
            pid.set_target(target);
            for _ in 0..50 {
                let s = pid.calculate_signal(0.0);
                assert!(s.abs() <= bound + 1e-15, "{s} exceeds {bound}");
            }
        }
    }

    #[test]
    fn integral_accumulates_once_per_update() {
        let mut pid = PidController::new(0.0, 1.0, 0.0, 10.0, 100.0);
        pid.set_target(2.0);
        pid.calculate_signal(1.0); // integral = 1
        let out = pid.calculate_signal(1.0); // integral = 2
        assert!((out - 2.0).abs() < 1e-12);
    }

    #[test]
    fn new_target_resets_integral() {
        let mut pid = PidController::new(0.0, 1.0, 0.0, 10.0, 100.0);
        pid.set_target(2.0);
        pid.calculate_signal(1.0);
        pid.calculate_signal(1.0);
        pid.set_target(2.0);
        let out = pid.calculate_signal(1.0);
        assert!((out - 1.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_uses_measurement_change_per_period() {
        let mut pid = PidController::new(0.0, 0.0, 1.0, 10.0, 100.0);
        pid.set_target(0.0);
        // First update has no history.
        assert_eq!(pid.calculate_signal(0.0), 0.0);
        // Measurement rose 0.5 in one 0.1 s period.
        assert!((pid.calculate_signal(0.5) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn hold_repeats_last_signal() {
        let mut pid = p_only();
        pid.set_target(1.0);
        let s = pid.calculate_signal(0.5);
        assert_eq!(pid.hold_last_signal(), s);
        assert_eq!(pid.hold_last_signal(), s);
        assert_eq!(pid.signal(), s);
    }

    #[test]
    fn total_error_sums_absolute_errors() {
        let mut pid = p_only();
        pid.set_target(1.0);
        pid.calculate_signal(0.0);
        pid.calculate_signal(2.0);
        assert!((pid.total_error() - 2.0).abs() < 1e-12);
    }
}
