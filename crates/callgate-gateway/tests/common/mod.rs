//! Shared harness for host-level tests: start a host on a loopback port,
//! make unary calls with reqwest, open admin streams with tokio-tungstenite.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use callgate_gateway::ServiceHost;

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const ACL: &str = r#"{
    "logger1":          ["/service.Admin/Logging"],
    "logger2":          ["/service.Admin/Logging"],
    "stat1":            ["/service.Admin/Statistics"],
    "stat2":            ["/service.Admin/Statistics"],
    "business_user":    ["/service.BusinessLogic/Check", "/service.BusinessLogic/Add"],
    "business_admin":   ["/service.BusinessLogic/*"],
    "after_disconnect": ["/service.BusinessLogic/Add"]
}"#;

pub const WAIT: Duration = Duration::from_secs(5);

pub struct TestHost {
    pub host: ServiceHost,
    stop: oneshot::Sender<()>,
}

impl TestHost {
    pub async fn start() -> Self {
        Self::start_on("127.0.0.1:0").await
    }

    pub async fn start_on(addr: &str) -> Self {
        let (stop, stopped) = oneshot::channel::<()>();
        let host = ServiceHost::start(addr, ACL, async move {
            let _ = stopped.await;
        })
        .await
        .expect("host start");
        Self { host, stop }
    }

    pub fn addr(&self) -> SocketAddr {
        self.host.local_addr()
    }

    /// Trigger shutdown and wait for the listener to be released.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        tokio::time::timeout(WAIT, self.host.stopped())
            .await
            .expect("host did not stop in time")
            .expect("host stopped with error");
    }

    /// Wait until the bus has exactly `n` live subscriptions.
    pub async fn await_subscribers(&self, n: usize) {
        let bus = self.host.bus();
        tokio::time::timeout(WAIT, async {
            while bus.subscriber_count() != n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("expected {n} subscribers, have {}", bus.subscriber_count()));
    }
}

/// Unary call; returns the HTTP status and JSON body.
pub async fn call(
    addr: SocketAddr,
    method: &str,
    consumer: Option<&str>,
) -> (reqwest::StatusCode, serde_json::Value) {
    let mut req = reqwest::Client::new()
        .post(format!("http://{addr}{method}"))
        .json(&serde_json::json!({}));
    if let Some(c) = consumer {
        req = req.header("consumer", c);
    }
    let resp = req.send().await.expect("http call");
    let status = resp.status();
    let body = resp.json().await.unwrap_or(serde_json::Value::Null);
    (status, body)
}

/// Plain GET without a WebSocket handshake; returns the HTTP status and JSON body.
pub async fn get(
    addr: SocketAddr,
    path: &str,
    consumer: &str,
) -> (reqwest::StatusCode, serde_json::Value) {
    let resp = reqwest::Client::new()
        .get(format!("http://{addr}{path}"))
        .header("consumer", consumer)
        .send()
        .await
        .expect("http get");
    let status = resp.status();
    let body = resp.json().await.unwrap_or(serde_json::Value::Null);
    (status, body)
}

/// Open a server-streaming call. `Err` carries the HTTP status of a refused upgrade.
pub async fn open_stream(addr: SocketAddr, path: &str, consumer: &str) -> Result<Ws, u16> {
    let mut req = format!("ws://{addr}{path}").into_client_request().unwrap();
    req.headers_mut()
        .insert("consumer", HeaderValue::from_str(consumer).unwrap());
    match connect_async(req).await {
        Ok((ws, _)) => Ok(ws),
        Err(tungstenite::Error::Http(resp)) => Err(resp.status().as_u16()),
        Err(e) => panic!("stream connect failed: {e}"),
    }
}

pub async fn next_msg(ws: &mut Ws) -> Option<Message> {
    tokio::time::timeout(WAIT, ws.next())
        .await
        .expect("stream produced nothing in time")
        .map(|r| r.expect("stream read"))
}

/// Next text frame decoded as `T`; panics on anything else.
pub async fn next_json<T: DeserializeOwned>(ws: &mut Ws) -> T {
    match next_msg(ws).await {
        Some(Message::Text(s)) => serde_json::from_str(&s).expect("json frame"),
        other => panic!("expected text frame, got {other:?}"),
    }
}

/// Skip queued text frames until the stream ends; returns the close code, if any.
pub async fn read_until_close(ws: &mut Ws) -> Option<u16> {
    loop {
        match next_msg(ws).await {
            Some(Message::Text(_)) => continue,
            Some(Message::Close(frame)) => return frame.map(|f| u16::from(f.code)),
            None => return None,
            Some(other) => panic!("expected text or close, got {other:?}"),
        }
    }
}
