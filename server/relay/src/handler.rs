use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::warn;
use vox_metrics::{CallMetrics, ConnMetrics};
use vox_wire::RelayControl;

use crate::state::{CallRoute, RelayState};

pub struct Services {
    pub state: Arc<RelayState>,
    pub conn_metrics: Arc<ConnMetrics>,
    pub call_metrics: Arc<CallMetrics>,
}

pub async fn handle_connection<S>(stream: S, services: Arc<Services>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    services.conn_metrics.accepted();

    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("websocket handshake failed: {e}");
            return;
        }
    };

    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::channel::<Bytes>(64);

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Binary(frame)).await.is_err() {
                break;
            }
        }
    });

    let mut username: Option<String> = None;

    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };
        match msg {
            Message::Text(text) => {
                handle_control(&text, &tx, &mut username, &services).await;
            }
            Message::Binary(data) => {
                services.conn_metrics.msg_rx("audio");
                let Some(sender) = username.as_deref() else {
                    warn!("client not registered, discarding audio");
                    continue;
                };
                services.state.forward(sender, data).await;
                services.call_metrics.frame_forwarded();
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    if let Some(username) = username {
        services.state.unregister(&username).await;
    }

    drop(tx);
    let _ = writer.await;
    services.conn_metrics.closed();
}

async fn handle_control(text: &str, tx: &mpsc::Sender<Bytes>, username: &mut Option<String>, services: &Services) {
    let event: RelayControl = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            warn!("unparseable control frame: {e}");
            return;
        }
    };

    match event {
        RelayControl::Register { group: _, username: u } => {
            services.conn_metrics.msg_rx("register");
            services.state.register(&u, tx.clone()).await;
            *username = Some(u);
        }
        RelayControl::CallAccepted { call_id, from_user, to_user, caller_group, callee_group } => {
            services.conn_metrics.msg_rx("call_accepted");
            services
                .state
                .call_accepted(&call_id, CallRoute { caller: from_user, callee: to_user, caller_group, callee_group })
                .await;
        }
        RelayControl::CallEnded { call_id } | RelayControl::CallRejected { call_id } => {
            services.conn_metrics.msg_rx("call_ended");
            services.state.call_ended(&call_id).await;
        }
        RelayControl::Logout { username: u } => {
            services.conn_metrics.msg_rx("logout");
            services.state.unregister(&u).await;
        }
    }
}
