//! `crane-runtime` – real-time execution of crane moves.
//!
//! # Modules
//!
//! - [`streamer`] – [`PoseStreamer`][streamer::PoseStreamer]: a rate-limited
//!   loop that samples elapsed time, asks a
//!   [`StepProvider`][streamer::StepProvider] for the next state, commits it
//!   to the [`RobotCrane`][crane_kinematics::RobotCrane] and emits the
//!   resulting [`Pose`][crane_types::Pose].
//! - [`providers`] – the three step providers: a joint-space move with a
//!   fixed base, a joint-space move on a travelling base, and the
//!   closed-loop control simulation.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.
//!
//! Each stream owns its robot exclusively for its whole run; nothing is
//! shared between streams.

pub mod providers;
pub mod streamer;
pub mod telemetry;

pub use providers::{ControlledMotion, JointMotion, OriginMotion};
pub use streamer::{
    PoseSample, PoseStreamer, Step, StepProvider, StreamEnd, StreamSettings, StreamSummary,
};
pub use telemetry::{init_tracing, LogFormat, TracerProviderGuard};
