//! Rate-limited pose streaming.
//!
//! [`PoseStreamer::run`] ticks at `streaming_frequency`.  On every tick it
//! reads the elapsed time since the stream started, asks the
//! [`StepProvider`] for the state at that time, commits it to the robot and
//! sends the resulting pose.  The first sample is taken at `t = 0`; the loop
//! ends the moment the provider reports exhaustion, without emitting a
//! partial frame.
//!
//! The loop awaits between samples, so a caller driving it inside
//! `tokio::select!` can interleave I/O and cancel it by dropping the future.

use std::time::Duration;

use crane_kinematics::RobotCrane;
use crane_types::{ActuatorStates, CraneError, Origin, Pose};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

/// Streaming rate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Samples per second.
    pub streaming_frequency: f64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            streaming_frequency: 20.0,
        }
    }
}

/// The state to commit for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// New base origin, if the base moves during this stream.
    pub origin: Option<Origin>,
    pub states: ActuatorStates,
}

/// Source of the state at a given elapsed time.
pub trait StepProvider {
    /// Expected length of the move in seconds.
    fn duration(&self) -> f64;

    /// State after `t` seconds, or `None` once the move is over.
    fn next_step(&mut self, robot: &mut RobotCrane, t: f64) -> Result<Option<Step>, CraneError>;
}

/// One emitted sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    /// Elapsed stream time in seconds.
    pub t: f64,
    pub pose: Pose,
}

/// Why a stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The provider ran out of steps.
    Completed,
    /// The receiving side went away.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamSummary {
    pub samples: usize,
    /// Elapsed time of the last emitted sample.
    pub last_t: f64,
    pub end: StreamEnd,
}

/// Drives a [`StepProvider`] in real time.
#[derive(Debug, Clone, Default)]
pub struct PoseStreamer {
    settings: StreamSettings,
}

impl PoseStreamer {
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    fn period(&self) -> Result<Duration, CraneError> {
        let hz = CraneError::check_frequency(
            "streaming_frequency",
            self.settings.streaming_frequency,
        )?;
        Ok(Duration::from_secs_f64(1.0 / hz))
    }

    /// Stream `provider` until it is exhausted or `tx` is closed.
    ///
    /// Samples are sent in strictly increasing elapsed-time order.
    ///
    /// # Errors
    ///
    /// Returns [`CraneError::InvalidFrequency`] before the first sample if the
    /// streaming rate is not a positive frequency.  Otherwise returns the
    /// first error raised by the provider or by validating a step; the robot
    /// keeps the origin and state of the last emitted sample.
    #[instrument(skip_all, fields(duration = provider.duration(), hz = self.settings.streaming_frequency))]
    pub async fn run<P>(
        &self,
        robot: &mut RobotCrane,
        provider: &mut P,
        tx: &mpsc::Sender<PoseSample>,
    ) -> Result<StreamSummary, CraneError>
    where
        P: StepProvider + ?Sized,
    {
        let period = self.period()?;
        info!(duration = provider.duration(), "stream started");

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let start = Instant::now();
        let mut samples = 0usize;
        let mut last_t = f64::NEG_INFINITY;

        let end = loop {
            ticker.tick().await;
            let t = start.elapsed().as_secs_f64();
            if t <= last_t {
                continue;
            }

            let Some(step) = provider.next_step(robot, t)? else {
                break StreamEnd::Completed;
            };
            robot.limits().check(&step.states)?;
            if let Some(origin) = step.origin {
                robot.set_origin(origin);
            }
            robot.validate_and_set(step.states)?;

            let sample = PoseSample {
                t,
                pose: robot.pose(),
            };
            if tx.send(sample).await.is_err() {
                debug!(t, "pose receiver dropped");
                break StreamEnd::Cancelled;
            }
            samples += 1;
            last_t = t;
        };

        let summary = StreamSummary {
            samples,
            last_t: if samples == 0 { 0.0 } else { last_t },
            end,
        };
        info!(samples, last_t = summary.last_t, end = ?end, "stream finished");
        Ok(summary)
    }
}
