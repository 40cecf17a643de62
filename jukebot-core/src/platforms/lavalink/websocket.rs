// File: src/platforms/lavalink/websocket.rs
//
// Event half of the Lavalink node: keeps `/v4/websocket` open, records the
// session id from `ready` and republishes player events on the bus.

use std::sync::Arc;

use futures_util::StreamExt;
use http::HeaderValue;
use parking_lot::RwLock;
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use jukebot_common::models::NodeEvent;

use crate::eventbus::NodeEventBus;
use crate::platforms::ConnectionStatus;
use crate::Error;

use super::client::LavalinkNode;
use super::model::parse_node_message;

const CLIENT_NAME: &str = concat!("jukebot/", env!("CARGO_PKG_VERSION"));
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct LavalinkListener {
    node: Arc<LavalinkNode>,
    bus: Arc<NodeEventBus>,
    user_id: u64,
    status: RwLock<ConnectionStatus>,
}

/// `http://host:port` → `ws://host:port/v4/websocket`
pub fn websocket_url(base_uri: &str) -> Result<String, Error> {
    let base = base_uri.trim_end_matches('/');
    let rest = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(Error::Config(format!("Lavalink URI must be http(s): {base_uri}")));
    };
    Ok(format!("{rest}/v4/websocket"))
}

impl LavalinkListener {
    pub fn new(node: Arc<LavalinkNode>, bus: Arc<NodeEventBus>, user_id: u64) -> Self {
        Self {
            node,
            bus,
            user_id,
            status: RwLock::new(ConnectionStatus::Disconnected),
        }
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.status.read().clone()
    }

    fn set_status(&self, status: ConnectionStatus) {
        *self.status.write() = status;
    }

    async fn connect(&self) -> Result<Socket, Error> {
        let url = websocket_url(self.node.base_uri())?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::Platform(format!("bad websocket request: {e}")))?;

        let header = |v: &str| {
            HeaderValue::from_str(v).map_err(|e| Error::Config(format!("bad header value: {e}")))
        };
        let headers = request.headers_mut();
        headers.insert("Authorization", header(self.node.password())?);
        headers.insert("User-Id", header(&self.user_id.to_string())?);
        headers.insert("Client-Name", header(CLIENT_NAME)?);

        let (ws, _) = connect_async(request)
            .await
            .map_err(|e| Error::Platform(format!("websocket connect error: {e}")))?;
        info!("(LavalinkListener) connected → {}", url);
        Ok(ws)
    }

    /// Keeps the socket open until `cancel` fires, reconnecting on errors.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let mut ws = tokio::select! {
                _ = cancel.cancelled() => break,
                res = self.connect() => match res {
                    Ok(ws) => ws,
                    Err(e) => {
                        error!("(LavalinkListener) {}", e);
                        self.set_status(ConnectionStatus::Reconnecting);
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = sleep(RECONNECT_DELAY) => continue,
                        }
                    }
                },
            };
            self.set_status(ConnectionStatus::Connected);

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = ws.close(None).await;
                    break;
                }
                res = self.read_loop(&mut ws) => res,
            };

            // Players are gone with the old session.
            self.node.set_session_id(None);
            match outcome {
                Ok(()) => warn!("(LavalinkListener) socket closed by node, reconnecting"),
                Err(e) => error!("(LavalinkListener) read error: {}", e),
            }
            self.set_status(ConnectionStatus::Reconnecting);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(RECONNECT_DELAY) => {}
            }
        }

        self.set_status(ConnectionStatus::Disconnected);
        info!("(LavalinkListener) stopped");
    }

    async fn read_loop(&self, ws: &mut Socket) -> Result<(), Error> {
        while let Some(msg_res) = ws.next().await {
            let msg = msg_res.map_err(|e| Error::Platform(format!("ws error: {e}")))?;

            if msg.is_close() {
                return Ok(());
            }
            let Message::Text(txt) = msg else { continue };

            match parse_node_message(&txt) {
                Ok(Some(event)) => self.handle_event(event).await,
                Ok(None) => trace!("(LavalinkListener) ignored: {}", txt.as_str()),
                Err(e) => warn!("(LavalinkListener) could not parse frame: {}", e),
            }
        }
        Ok(())
    }

    async fn handle_event(&self, event: NodeEvent) {
        if let NodeEvent::Ready { session_id, resumed } = &event {
            debug!("(LavalinkListener) ready (resumed={})", resumed);
            self.node.set_session_id(Some(session_id.clone()));
        }
        self.bus.publish(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url() {
        assert_eq!(
            websocket_url("http://lavalink:2333").unwrap(),
            "ws://lavalink:2333/v4/websocket"
        );
        assert_eq!(
            websocket_url("https://node.example.com/").unwrap(),
            "wss://node.example.com/v4/websocket"
        );
        assert!(websocket_url("lavalink:2333").is_err());
    }

    #[tokio::test]
    async fn test_ready_sets_session_and_publishes() {
        let http = Arc::new(crate::http::canned::CannedHttp::new(&[]));
        let node = Arc::new(LavalinkNode::new(http, "http://lavalink:2333", "pw"));
        let bus = Arc::new(NodeEventBus::new());
        let mut rx = bus.subscribe(Some(4)).await;

        let listener = LavalinkListener::new(node.clone(), bus, 1);
        listener
            .handle_event(NodeEvent::Ready { session_id: "s1".into(), resumed: false })
            .await;

        assert_eq!(node.session_id().as_deref(), Some("s1"));
        assert!(matches!(rx.recv().await, Some(NodeEvent::Ready { .. })));
        assert_eq!(listener.connection_status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let http = Arc::new(crate::http::canned::CannedHttp::new(&[]));
        // Nothing listens here; the listener sits in its retry loop.
        let node = Arc::new(LavalinkNode::new(http, "http://127.0.0.1:9", "pw"));
        let listener = LavalinkListener::new(node, Arc::new(NodeEventBus::new()), 1);

        let cancel = CancellationToken::new();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), listener.run(cancel))
            .await
            .expect("listener should stop");
        assert_eq!(listener.connection_status(), ConnectionStatus::Disconnected);
    }
}
