//! Admin observation streams (server-streaming over WebSocket).
//!
//! Each stream task owns one bus subscription and is its only reader. Queue
//! closure (unsubscribe or host teardown) is the cancellation signal and ends
//! the stream gracefully with a Close frame. A failed write ends only that
//! stream. The subscription handle unsubscribes itself on every exit path.

use std::borrow::Cow;
use std::fmt::Display;
use std::time::Duration;

use axum::{
    extract::{
        rejection::QueryRejection,
        ws::{
            close_code, rejection::WebSocketUpgradeRejection, CloseFrame, Message,
            WebSocketUpgrade,
        },
        Query, State,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use callgate_core::error::{GateError, Result};
use callgate_core::protocol::{ServiceDescriptor, StatInterval};

use crate::app_state::{AppState, StreamLimits};
use crate::error::ApiError;
use crate::events::{StatWindow, Subscription};

pub const LOGGING: &str = "Logging";
pub const STATISTICS: &str = "Statistics";

pub const SERVICE: ServiceDescriptor = ServiceDescriptor {
    name: "service.Admin",
    methods: &[LOGGING, STATISTICS],
};

/// How a stream ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Queue closed (unsubscribed or torn down); Close frame sent.
    Drained,
    /// Client sent Close or disconnected.
    ClientLeft,
}

// --------------------
// Entry points
// --------------------

/// `Logging(Nothing) -> stream Event`.
pub async fn logging(
    State(app): State<AppState>,
    ws: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> std::result::Result<Response, ApiError> {
    let ws = upgrade(ws)?;
    // Subscribe before the upgrade completes so every call admitted after the
    // client sees `101 Switching Protocols` reaches this stream.
    let sub = app.bus().subscribe();
    Ok(ws.on_upgrade(move |socket| async move {
        let _gauge = ActiveStream::open(&app, "logging");
        let id = sub.id();
        let (tx, rx) = socket.split();
        report("logging", id, forward_events(sub, tx, rx).await);
    }))
}

/// `Statistics(StatInterval) -> stream StatSnapshot`, interval from the query string.
pub async fn statistics(
    State(app): State<AppState>,
    query: std::result::Result<Query<StatInterval>, QueryRejection>,
    ws: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> std::result::Result<Response, ApiError> {
    let Query(req) = query.map_err(|e| {
        GateError::InvalidArgument(format!("bad statistics request: {}", e.body_text()))
    })?;
    let period = stat_period(req, app.limits())?;
    let ws = upgrade(ws)?;
    let sub = app.bus().subscribe();
    Ok(ws.on_upgrade(move |socket| async move {
        let _gauge = ActiveStream::open(&app, "statistics");
        let id = sub.id();
        let (tx, rx) = socket.split();
        report("statistics", id, stream_stats(sub, period, tx, rx).await);
    }))
}

/// Streaming calls need a WebSocket handshake; anything else is a bad request.
fn upgrade(
    ws: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<WebSocketUpgrade> {
    ws.map_err(|e| {
        GateError::InvalidArgument(format!("stream call requires upgrade: {}", e.body_text()))
    })
}

pub fn stat_period(req: StatInterval, limits: StreamLimits) -> Result<Duration> {
    let max = limits.max_stat_interval_secs;
    if !(1..=max).contains(&req.interval_seconds) {
        return Err(GateError::InvalidArgument(format!(
            "interval_seconds must be between 1 and {max}"
        )));
    }
    Ok(Duration::from_secs(req.interval_seconds))
}

// --------------------
// Stream loops
// --------------------

/// Forward every event of `sub` to `tx` until the queue closes, the client
/// leaves, or a write fails.
pub async fn forward_events<W, R, E>(
    mut sub: Subscription,
    mut tx: W,
    mut rx: R,
) -> Result<StreamEnd>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
    R: Stream<Item = std::result::Result<Message, E>> + Unpin,
{
    loop {
        tokio::select! {
            next = sub.recv() => match next {
                Some(ev) => send_json(&mut tx, &*ev).await?,
                None => {
                    send_drained(&mut tx).await;
                    return Ok(StreamEnd::Drained);
                }
            },
            incoming = rx.next() => {
                if client_left(incoming) {
                    return Ok(StreamEnd::ClientLeft);
                }
            }
        }
    }
}

/// Count events of `sub` into a private window and emit a snapshot every
/// `period`, whether or not anything happened. The first snapshot goes out
/// one full period after the stream starts.
pub async fn stream_stats<W, R, E>(
    mut sub: Subscription,
    period: Duration,
    mut tx: W,
    mut rx: R,
) -> Result<StreamEnd>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
    R: Stream<Item = std::result::Result<Message, E>> + Unpin,
{
    let mut window = StatWindow::new();
    let mut tick = interval_at(Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            next = sub.recv() => match next {
                Some(ev) => window.update(&ev),
                None => {
                    send_drained(&mut tx).await;
                    return Ok(StreamEnd::Drained);
                }
            },
            _ = tick.tick() => send_json(&mut tx, &window.collect()).await?,
            incoming = rx.next() => {
                if client_left(incoming) {
                    return Ok(StreamEnd::ClientLeft);
                }
            }
        }
    }
}

// --------------------
// Helpers
// --------------------

async fn send_json<W, T>(tx: &mut W, msg: &T) -> Result<()>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
    T: Serialize,
{
    let text = serde_json::to_string(msg)
        .map_err(|e| GateError::Internal(format!("json encode failed: {e}")))?;
    tx.send(Message::Text(text))
        .await
        .map_err(|e| GateError::Transport(format!("stream send failed: {e}")))
}

async fn send_drained<W>(tx: &mut W)
where
    W: Sink<Message> + Unpin,
{
    let frame = CloseFrame {
        code: close_code::NORMAL,
        reason: Cow::Borrowed("stream drained"),
    };
    // best-effort; the stream is over either way
    let _ = tx.send(Message::Close(Some(frame))).await;
}

/// Inbound frames are ignored except for the end of the client half.
fn client_left<E>(incoming: Option<std::result::Result<Message, E>>) -> bool {
    matches!(incoming, None | Some(Err(_)) | Some(Ok(Message::Close(_))))
}

fn report(kind: &'static str, id: u64, outcome: Result<StreamEnd>) {
    match outcome {
        Ok(end) => tracing::debug!(kind, subscription = id, ?end, "admin stream finished"),
        Err(e) => tracing::warn!(kind, subscription = id, error = %e, "admin stream aborted"),
    }
}

/// Keeps `callgate_streams_active{kind}` in step with live stream tasks.
struct ActiveStream {
    app: AppState,
    kind: &'static str,
}

impl ActiveStream {
    fn open(app: &AppState, kind: &'static str) -> Self {
        app.metrics().streams_active.inc(&[("kind", kind)]);
        Self {
            app: app.clone(),
            kind,
        }
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.app.metrics().streams_active.dec(&[("kind", self.kind)]);
    }
}
