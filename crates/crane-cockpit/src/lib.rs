//! `crane-cockpit` – WebSocket session server for the crane.
//!
//! Boots a lightweight HTTP + WebSocket server (default port `8000`) that:
//!
//! 1. **Serves** a small cockpit page at every non-WebSocket HTTP path.
//!
//! 2. **Hosts** one [`Session`] per WebSocket connection.  Each session owns
//!    its own [`RobotCrane`] and answers JSON commands of the form
//!    `{"action": "...", "data": {...}}`:
//!    - `initialize_connection` → the robot's dimensions.
//!    - `set_actuator_states`, `set_end_effector`, `set_origin`,
//!      `reset_robot` → `"True"` or `"Invalid request: ..."`.
//!    - `get_pose` → the current pose.
//!    - `stream_poses*` → one pose frame per streaming tick until the move
//!      completes.
//!
//! # Usage
//!
//! ```rust,no_run
//! use crane_cockpit::{CockpitServer, SessionSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     CockpitServer::new(SessionSettings::default())
//!         .run()
//!         .await
//!         .expect("cockpit server failed");
//! }
//! ```
//!
//! [`RobotCrane`]: crane_kinematics::RobotCrane

pub mod server;
pub mod session;

pub use server::{serve_session, CockpitServer, DEFAULT_PORT};
pub use session::{Outcome, Session, SessionSettings, StreamKind, ACK};
