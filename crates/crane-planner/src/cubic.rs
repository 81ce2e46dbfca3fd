//! Cubic blends and synchronised axis sets.
//!
//! A blend from `p0` (velocity `v0`) to `p1` (velocity `v1`) over `T`
//! seconds uses
//!
//! ```text
//! p(t)   = a0 + a1·t + a2·t² + a3·t³
//! v(t)   = a1 + 2·a2·t + 3·a3·t²
//! acc(t) = 2·a2 + 6·a3·t
//! ```

/// Shortest duration for which a cubic rest-to-rest blend over
/// `|goal - start|` stays within `max_vel` and `max_acc`.
///
/// A cubic peaks at `3Δ / 2T` in velocity and `6Δ / T²` in acceleration, so
/// the result is the larger of the two bounds solved for `T`.
pub fn minimum_move_time(max_vel: f64, max_acc: f64, start: f64, goal: f64) -> f64 {
    let delta = (goal - start).abs();
    if delta == 0.0 {
        return 0.0;
    }
    let by_velocity = 3.0 * delta / (2.0 * max_vel);
    let by_acceleration = (6.0 * delta / max_acc).sqrt();
    by_velocity.max(by_acceleration)
}

// ────────────────────────────────────────────────────────────────────────────
// Cubic
// ────────────────────────────────────────────────────────────────────────────

/// Coefficients of one cubic blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cubic {
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
}

/// Position, velocity and acceleration of one axis at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisSample {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
}

impl Cubic {
    /// Blend from `(p0, v0)` at `t = 0` to `(p1, v1)` at `t = duration`.
    ///
    /// A non-positive duration yields a constant at `p0`.
    pub fn blend(p0: f64, v0: f64, p1: f64, v1: f64, duration: f64) -> Self {
        if duration <= 0.0 {
            return Self {
                a0: p0,
                a1: 0.0,
                a2: 0.0,
                a3: 0.0,
            };
        }
        let t = duration;
        let delta = p1 - p0;
        Self {
            a0: p0,
            a1: v0,
            a2: 3.0 / (t * t) * delta - 2.0 / t * v0 - 1.0 / t * v1,
            a3: -2.0 / (t * t * t) * delta + 1.0 / (t * t) * (v0 + v1),
        }
    }

    pub fn position(&self, t: f64) -> f64 {
        self.a0 + self.a1 * t + self.a2 * t * t + self.a3 * t * t * t
    }

    pub fn velocity(&self, t: f64) -> f64 {
        self.a1 + 2.0 * self.a2 * t + 3.0 * self.a3 * t * t
    }

    pub fn acceleration(&self, t: f64) -> f64 {
        2.0 * self.a2 + 6.0 * self.a3 * t
    }

    pub fn sample(&self, t: f64) -> AxisSample {
        AxisSample {
            position: self.position(t),
            velocity: self.velocity(t),
            acceleration: self.acceleration(t),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SyncedCubics
// ────────────────────────────────────────────────────────────────────────────

/// `N` cubic blends sharing one duration.
///
/// The duration starts as the largest per-axis minimum move time and can be
/// overridden; every axis is then re-blended over the new duration so all
/// axes still arrive at their goals together.
#[derive(Debug, Clone)]
pub struct SyncedCubics<const N: usize> {
    start: [f64; N],
    start_vel: [f64; N],
    goal: [f64; N],
    min_duration: f64,
    duration: f64,
    axes: [Cubic; N],
}

impl<const N: usize> SyncedCubics<N> {
    /// `limits[i]` is the `(max_vel, max_acc)` pair for axis `i`.  Axes come
    /// to rest at the goal.
    pub fn new(start: [f64; N], start_vel: [f64; N], goal: [f64; N], limits: [(f64, f64); N]) -> Self {
        let min_duration = (0..N)
            .map(|i| minimum_move_time(limits[i].0, limits[i].1, start[i], goal[i]))
            .fold(0.0, f64::max);
        let mut synced = Self {
            start,
            start_vel,
            goal,
            min_duration,
            duration: min_duration,
            axes: [Cubic::blend(0.0, 0.0, 0.0, 0.0, 0.0); N],
        };
        synced.reblend();
        synced
    }

    fn reblend(&mut self) {
        for i in 0..N {
            self.axes[i] = Cubic::blend(self.start[i], self.start_vel[i], self.goal[i], 0.0, self.duration);
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// The largest per-axis minimum move time, unaffected by overrides.
    pub fn min_duration(&self) -> f64 {
        self.min_duration
    }

    /// Override the shared duration and re-blend every axis.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
        self.reblend();
    }

    pub fn axes(&self) -> &[Cubic; N] {
        &self.axes
    }

    pub fn goal(&self) -> [f64; N] {
        self.goal
    }

    /// Sample every axis at `t`, or `None` once `t >= duration`.
    pub fn sample(&self, t: f64) -> Option<[AxisSample; N]> {
        if t >= self.duration {
            return None;
        }
        Some(self.axes.map(|c| c.sample(t)))
    }
}
