//! `crane simulate` – run the closed-loop controller offline.
//!
//! The crane starts at rest at the world origin, its base is commanded to
//! the given goal, and the control simulator is stepped at a fixed time step
//! until the base arrives.  Every step is written as one JSON line.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use crane_control::ControlSimulator;
use crane_kinematics::RobotCrane;
use crane_types::Origin;
use tracing::info;

use crate::config::Config;
use crate::AppError;

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// Origin goal x.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x: f64,
    /// Origin goal y.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub y: f64,
    /// Origin goal z.
    #[arg(long, default_value_t = 0.2, allow_negative_numbers = true)]
    pub z: f64,
    /// Origin goal yaw in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub phi: f64,
    /// End effector to hold, as `x,y,z,phi` with phi in degrees.  Defaults
    /// to the home pose.
    #[arg(
        long,
        value_delimiter = ',',
        num_args = 4,
        allow_negative_numbers = true,
        value_name = "X,Y,Z,PHI"
    )]
    pub end_effector: Option<Vec<f64>>,
    /// Simulation time step in seconds.
    #[arg(long, default_value_t = 0.05)]
    pub step: f64,
    /// Write the tracking log here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl SimulateArgs {
    fn origin_goal(&self) -> Origin {
        Origin::new(self.x, self.y, self.z, self.phi.to_radians())
    }
}

/// Outcome of an offline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationReport {
    pub steps: usize,
    pub duration: f64,
    /// Accumulated `|error|` over every controller.
    pub total_error: f64,
    /// End-effector distance from its target after the last step.
    pub final_error: f64,
}

/// Run the simulation described by `args`, writing the tracking log to
/// `out` as JSON lines.
pub fn run(args: &SimulateArgs, cfg: &Config, out: &mut dyn Write) -> Result<SimulationReport, AppError> {
    if !(args.step.is_finite() && args.step > 0.0) {
        return Err(AppError::InvalidStep(args.step));
    }

    let mut robot = RobotCrane::new(cfg.dimensions, cfg.motion_limits);
    if let Some([x, y, z, phi]) = args.end_effector.as_deref().and_then(|v| <[f64; 4]>::try_from(v).ok()) {
        let states = robot.inverse_kinematics(x, y, z, phi.to_radians(), true)?;
        robot.validate_and_set(states)?;
    }

    robot.settle();
    let rest = *robot.act_states_t0();
    robot.set_origin(args.origin_goal());
    robot.validate_and_set(rest)?;

    let mut sim = ControlSimulator::new(&mut robot, cfg.simulator)?;
    let mut steps = 0usize;
    while sim.next_step(&mut robot, steps as f64 * args.step)?.is_some() {
        steps += 1;
    }

    for sample in sim.tracking_log() {
        serde_json::to_writer(&mut *out, sample)?;
        writeln!(out)?;
    }
    out.flush()?;

    let report = SimulationReport {
        steps,
        duration: sim.duration(),
        total_error: sim.total_error(),
        final_error: sim.tracking_log().last().map_or(0.0, |s| s.position_error()),
    };
    info!(
        steps = report.steps,
        duration = report.duration,
        total_error = report.total_error,
        final_error = report.final_error,
        "simulation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crane_control::TrackingSample;

    fn args() -> SimulateArgs {
        SimulateArgs {
            x: 0.0,
            y: 0.0,
            z: 0.2,
            phi: 0.0,
            end_effector: None,
            step: 0.05,
            output: None,
        }
    }

    fn parse_log(buf: &[u8]) -> Vec<TrackingSample> {
        String::from_utf8(buf.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn raising_the_base_keeps_the_tip_in_place() {
        let mut a = args();
        a.z = 0.1;
        let mut buf = Vec::new();
        let report = run(&a, &Config::default(), &mut buf).unwrap();

        let log = parse_log(&buf);
        assert_eq!(log.len(), report.steps);
        assert!(report.steps > 0);
        assert!(log.windows(2).all(|w| w[1].t > w[0].t));
        assert!(report.final_error < 0.01, "final error {}", report.final_error);
        assert!((log.last().unwrap().origin.z - 0.1).abs() < 0.01);
    }

    #[test]
    fn custom_end_effector_is_held() {
        let mut a = args();
        a.end_effector = Some(vec![0.5, 0.3, 0.6, 30.0]);
        let mut buf = Vec::new();
        run(&a, &Config::default(), &mut buf).unwrap();

        let log = parse_log(&buf);
        let target = log[0].target;
        assert!((target[0] - 0.5).abs() < 1e-9);
        assert!((target[1] - 0.3).abs() < 1e-9);
        assert!((target[2] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn unreachable_end_effector_is_rejected() {
        let mut a = args();
        a.end_effector = Some(vec![5.0, 0.0, 0.5, 0.0]);
        let result = run(&a, &Config::default(), &mut Vec::new());
        assert!(matches!(result, Err(AppError::Crane(_))));
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let mut a = args();
        a.step = 0.0;
        let result = run(&a, &Config::default(), &mut Vec::new());
        assert!(matches!(result, Err(AppError::InvalidStep(_))));
    }
}
