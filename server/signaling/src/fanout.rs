use std::sync::Arc;

use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::Mutex};
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::tls::insecure_client_config;

type Sink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// A persistent outbound control link to Relay or Transcriber, opened lazily
/// and reconnected lazily on the next event after any failure (spec.md
/// §4.1's fan-out discipline).
pub struct FanoutLink {
    url: String,
    name: &'static str,
    sink: Mutex<Option<Sink>>,
}

impl FanoutLink {
    pub fn new(url: String, name: &'static str) -> Arc<Self> {
        Arc::new(Self { url, name, sink: Mutex::new(None) })
    }

    /// Best-effort send of one JSON control event. Never blocks or errors
    /// the caller: a failed connect or send just drops the cached sink so
    /// the next event attempts reconnection.
    pub async fn notify(&self, payload: &impl serde::Serialize) {
        let text = match serde_json::to_string(payload) {
            Ok(t) => t,
            Err(e) => {
                warn!(service = %self.name, error = %e, "failed to encode fan-out payload");
                return;
            }
        };

        let mut guard = self.sink.lock().await;
        if guard.is_none() {
            *guard = self.connect().await;
        }
        let Some(sink) = guard.as_mut() else {
            warn!(service = %self.name, "socket not open or connected");
            return;
        };
        if let Err(e) = sink.send(Message::Text(text.into())).await {
            warn!(service = %self.name, error = %e, "error notifying service");
            *guard = None;
        }
    }

    async fn connect(&self) -> Option<Sink> {
        let connector = Connector::Rustls(Arc::new(insecure_client_config()));
        match connect_async_tls_with_config(&self.url, None, false, Some(connector)).await {
            Ok((stream, _)) => {
                debug!(service = %self.name, url = %self.url, "connected");
                let (sink, _stream) = stream.split();
                Some(sink)
            }
            Err(e) => {
                warn!(service = %self.name, url = %self.url, error = %e, "connect failed");
                None
            }
        }
    }
}
