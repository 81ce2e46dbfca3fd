//! [`CockpitServer`] – HTTP + WebSocket front end for crane sessions.
//!
//! Listens on `0.0.0.0:8000` (configurable via [`CockpitServer::with_port`]).
//!
//! * Regular HTTP requests → 200 OK with the embedded cockpit page.
//! * WebSocket upgrades → one [`Session`] per connection, fed by the text
//!   frames the client sends.

use std::collections::VecDeque;
use std::fmt::Display;
use std::net::SocketAddr;

use crane_runtime::PoseSample;
use crane_types::{CraneCommand, CraneError};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::session::{invalid_request, parse_command, Outcome, Session, SessionSettings, StreamKind, ACK};

/// Default TCP port for the cockpit server.
pub const DEFAULT_PORT: u16 = 8000;

/// Poses buffered between the streaming loop and the socket writer.
const POSE_BUFFER: usize = 8;

/// The compiled-in cockpit page.
const COCKPIT_HTML: &str = include_str!("cockpit.html");

// ---------------------------------------------------------------------------
// CockpitServer
// ---------------------------------------------------------------------------

/// Lightweight HTTP + WebSocket server giving every client its own crane.
///
/// # Example
///
/// ```rust,no_run
/// use crane_cockpit::{CockpitServer, SessionSettings};
///
/// #[tokio::main]
/// async fn main() {
///     CockpitServer::new(SessionSettings::default())
///         .with_port(8000)
///         .run()
///         .await
///         .expect("cockpit server failed");
/// }
/// ```
pub struct CockpitServer {
    settings: SessionSettings,
    port: u16,
}

impl CockpitServer {
    /// Create a server on the [`DEFAULT_PORT`] whose sessions use `settings`.
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            port: DEFAULT_PORT,
        }
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Start the server and accept connections until the task is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CraneError::Transport`] if the TCP listener cannot bind.
    pub async fn run(self) -> Result<(), CraneError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CraneError::Transport(format!("bind error on {addr}: {e}")))?;

        info!(port = self.port, "cockpit listening on http://localhost:{}", self.port);

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let settings = self.settings;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, settings).await {
                            warn!(%peer, error = %e, "client error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept error");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-connection handler
// ---------------------------------------------------------------------------

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    settings: SessionSettings,
) -> Result<(), CraneError> {
    // `peek` leaves the request in the socket for the WebSocket handshake.
    let mut buf = [0u8; 1024];
    let n = stream
        .peek(&mut buf)
        .await
        .map_err(|e| CraneError::Transport(format!("peek error from {peer}: {e}")))?;

    let header_preview = String::from_utf8_lossy(&buf[..n]);
    let is_ws_upgrade = header_preview.lines().any(|line| {
        let line = line.to_lowercase();
        line.starts_with("upgrade:") && line.contains("websocket")
    });

    if is_ws_upgrade {
        handle_ws(stream, peer, settings).await
    } else {
        serve_html(stream).await
    }
}

async fn serve_html(mut stream: TcpStream) -> Result<(), CraneError> {
    let body = COCKPIT_HTML;
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    );
    stream
        .write_all(response.as_bytes())
        .await
        .map_err(|e| CraneError::Transport(format!("HTTP write error: {e}")))
}

async fn handle_ws(stream: TcpStream, peer: SocketAddr, settings: SessionSettings) -> Result<(), CraneError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| CraneError::Transport(format!("WS handshake from {peer}: {e}")))?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let mut session = Session::new(settings);
    let span = info_span!("session", id = %session.id(), %peer);
    async move {
        info!("client connected");
        let result = serve_session(&mut session, &mut ws_tx, &mut ws_rx).await;
        info!("client disconnected");
        result
    }
    .instrument(span)
    .await
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

/// How a stream handed control back to the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamExit {
    Finished,
    Reset,
    Disconnected,
}

async fn send_text<Si>(sink: &mut Si, text: String) -> Result<(), CraneError>
where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    sink.send(Message::Text(text.into()))
        .await
        .map_err(|e| CraneError::Transport(e.to_string()))
}

/// Answer text frames from `source` until the client goes away.
///
/// Commands that arrive while a stream runs are queued and handled in order
/// once it ends, except `reset_robot`, which aborts the stream.
///
/// # Errors
///
/// Returns [`CraneError::Transport`] when a frame cannot be written.
pub async fn serve_session<Si, St, E>(
    session: &mut Session,
    sink: &mut Si,
    source: &mut St,
) -> Result<(), CraneError>
where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut pending: VecDeque<String> = VecDeque::new();
    loop {
        let text = match pending.pop_front() {
            Some(text) => text,
            None => match source.next().await {
                Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(error = %e, "read error");
                    break;
                }
                Some(Ok(_)) => continue,
            },
        };

        match session.handle_text(&text) {
            Outcome::Reply(reply) => send_text(sink, reply).await?,
            Outcome::Stream(kind) => match stream_poses(session, kind, sink, source, &mut pending).await? {
                StreamExit::Finished => {}
                StreamExit::Reset => {
                    session.reset();
                    send_text(sink, ACK.to_string()).await?;
                }
                StreamExit::Disconnected => break,
            },
        }
    }
    Ok(())
}

/// Run one stream while still reading the socket.
async fn stream_poses<Si, St, E>(
    session: &mut Session,
    kind: StreamKind,
    sink: &mut Si,
    source: &mut St,
    pending: &mut VecDeque<String>,
) -> Result<StreamExit, CraneError>
where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut provider = match session.provider(kind) {
        Ok(provider) => provider,
        Err(e) => {
            send_text(sink, invalid_request(&e)).await?;
            return Ok(StreamExit::Finished);
        }
    };
    let streamer = session.streamer();
    let (tx, mut rx) = mpsc::channel::<PoseSample>(POSE_BUFFER);

    let outcome = {
        let run = streamer.run(session.robot_mut(), provider.as_mut(), &tx);
        tokio::pin!(run);
        loop {
            tokio::select! {
                result = &mut run => break Ok(result),
                Some(sample) = rx.recv() => {
                    send_text(sink, pose_json(&sample)).await?;
                }
                msg = source.next() => match msg {
                    Some(Ok(Message::Text(text))) => match parse_command(text.as_str()) {
                        Ok(CraneCommand::ResetRobot) => break Err(StreamExit::Reset),
                        _ => pending.push_back(text.as_str().to_owned()),
                    },
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break Err(StreamExit::Disconnected),
                    Some(Ok(_)) => {}
                },
            }
        }
    };
    drop(tx);

    let result = match outcome {
        Ok(result) => result,
        Err(exit) => {
            info!(?exit, "stream aborted");
            return Ok(exit);
        }
    };

    while let Some(sample) = rx.recv().await {
        send_text(sink, pose_json(&sample)).await?;
    }
    if let Err(e) = result {
        send_text(sink, invalid_request(&e)).await?;
    }
    Ok(StreamExit::Finished)
}

fn pose_json(sample: &PoseSample) -> String {
    serde_json::to_string(&sample.pose)
        .unwrap_or_else(|e| invalid_request(&CraneError::Transport(e.to_string())))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crane_types::{ActuatorStates, Pose};
    use futures_util::stream;
    use std::convert::Infallible;
    use std::time::Duration;

    const MOVE: &str = r#"{"action":"set_actuator_states","data":{"d_1":0.5,"theta_1":90,"theta_2":0,"theta_3":0,"l_6":0.1}}"#;

    fn texts(sink: &[Message]) -> Vec<String> {
        sink.iter()
            .filter_map(|m| match m {
                Message::Text(t) => Some(t.as_str().to_owned()),
                _ => None,
            })
            .collect()
    }

    fn is_pose(text: &str) -> bool {
        serde_json::from_str::<Pose>(text).is_ok()
    }

    /// Feed `frames`, then keep the connection open until the timeout.
    async fn run_open(session: &mut Session, frames: &[&str]) -> Vec<String> {
        let mut sink: Vec<Message> = Vec::new();
        let mut source = stream::iter(
            frames
                .iter()
                .map(|f| Ok::<_, Infallible>(Message::text(f.to_string())))
                .collect::<Vec<_>>(),
        )
        .chain(stream::pending());
        let served = tokio::time::timeout(
            Duration::from_secs(60),
            serve_session(session, &mut sink, &mut source),
        )
        .await;
        assert!(served.is_err(), "session ended while the client was connected");
        texts(&sink)
    }

    #[test]
    fn default_port_is_8000() {
        assert_eq!(CockpitServer::new(SessionSettings::default()).port(), DEFAULT_PORT);
    }

    #[test]
    fn with_port_overrides_default() {
        let server = CockpitServer::new(SessionSettings::default()).with_port(9999);
        assert_eq!(server.port(), 9999);
    }

    #[tokio::test(start_paused = true)]
    async fn stream_runs_to_completion_then_handles_queued_command() {
        let mut session = Session::new(SessionSettings::default());
        let out = run_open(
            &mut session,
            &[MOVE, r#"{"action":"stream_poses"}"#, r#"{"action":"get_pose"}"#],
        )
        .await;

        assert_eq!(out[0], ACK);
        let poses = out[1..].iter().filter(|t| is_pose(t)).count();
        // ~3.67 s at 20 Hz plus the queued get_pose reply.
        assert!(poses >= 70, "only {poses} poses");
        assert_eq!(poses, out.len() - 1);

        let last: Pose = serde_json::from_str(out.last().unwrap()).unwrap();
        assert_eq!(last, session.robot().pose());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_aborts_stream() {
        let mut session = Session::new(SessionSettings::default());
        let out = run_open(
            &mut session,
            &[MOVE, r#"{"action":"stream_poses"}"#, r#"{"action":"reset_robot"}"#],
        )
        .await;

        assert_eq!(out.first().map(String::as_str), Some(ACK));
        assert_eq!(out.last().map(String::as_str), Some(ACK));
        assert!(out.len() < 10, "stream was not aborted: {} frames", out.len());
        assert_eq!(session.robot().act_states_t1(), &ActuatorStates::home());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_ends_session_during_stream() {
        let mut session = Session::new(SessionSettings::default());
        let mut sink: Vec<Message> = Vec::new();
        let mut source = stream::iter(vec![
            Ok::<_, Infallible>(Message::text(MOVE)),
            Ok(Message::text(r#"{"action":"stream_poses"}"#)),
        ]);
        serve_session(&mut session, &mut sink, &mut source).await.unwrap();

        let out = texts(&sink);
        assert_eq!(out[0], ACK);
        assert!(out.len() < 5);
    }

    #[tokio::test(start_paused = true)]
    async fn bad_frames_get_error_replies() {
        let mut session = Session::new(SessionSettings::default());
        let out = run_open(&mut session, &["{", r#"{"action":"get_pose"}"#]).await;
        assert!(out[0].starts_with("Invalid request"));
        assert!(is_pose(&out[1]));
    }

    #[test]
    fn cockpit_html_speaks_the_command_protocol() {
        assert!(COCKPIT_HTML.contains("WebSocket"));
        assert!(COCKPIT_HTML.contains("stream_poses"));
        assert!(COCKPIT_HTML.contains("initialize_connection"));
    }
}
