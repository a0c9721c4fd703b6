use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::warn;
use vox_metrics::{CallMetrics, ConnMetrics};
use vox_recognizer::RecognizerFactory;
use vox_wire::{TranscriberControl, TranscriberEvent};

use crate::session::{self, PcmItem, SessionConfig};
use crate::state::{CallRoute, TranscriberState};

pub struct Services {
    pub state: Arc<TranscriberState>,
    pub recognizer_factory: Arc<dyn RecognizerFactory>,
    pub session_cfg: SessionConfig,
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
    let (tx, mut rx) = mpsc::channel::<TranscriberEvent>(64);

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else { continue };
            if sink.send(Message::Text(text.into())).await.is_err() {
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
                services.conn_metrics.msg_rx("pcm");
                let Some(sender) = username.as_deref() else {
                    warn!("client not registered, discarding PCM frame");
                    continue;
                };
                route_pcm(sender, data, &services).await;
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

async fn route_pcm(sender: &str, data: bytes::Bytes, services: &Services) {
    let Some(call_id) = services.state.current_call_of(sender).await else {
        return;
    };
    let Some(route) = services.state.route_for(&call_id).await else { return };
    let Some(cohort) = route.cohort_of(sender) else { return };
    let Some(session) = route.session else { return };

    if session.pcm_tx.try_send(PcmItem::Chunk { cohort, pcm: data.to_vec() }).is_err() {
        services.call_metrics.frame_dropped("transcriber_queue_full");
    }
}

async fn handle_control(text: &str, tx: &mpsc::Sender<TranscriberEvent>, username: &mut Option<String>, services: &Services) {
    let event: TranscriberControl = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            warn!("unparseable control frame: {e}");
            return;
        }
    };

    match event {
        TranscriberControl::Register { group, username: u, language } => {
            services.conn_metrics.msg_rx("register");
            services.state.register(group, &u, language, tx.clone()).await;
            *username = Some(u);
        }
        TranscriberControl::CallAccepted { call_id, from_user, to_user, caller_group, callee_group, caller_language: _, callee_language: _ } => {
            services.conn_metrics.msg_rx("call_accepted");
            let sales_username = if caller_group == vox_wire::Cohort::Sales {
                Some(from_user.clone())
            } else if callee_group == vox_wire::Cohort::Sales {
                Some(to_user.clone())
            } else {
                None
            };

            // Each speaker's recognizer is bound to the language that
            // speaker registered with on this service, not to the single
            // `language` Signaling's `accept_call` carries for both sides
            // (spec.md §9: Transcriber is authoritative for language).
            let caller_language = services.state.language_of(&from_user).await;
            let callee_language = services.state.language_of(&to_user).await;

            services
                .state
                .insert_route(
                    &call_id,
                    CallRoute { caller: from_user.clone(), callee: to_user.clone(), caller_group, callee_group, session: None },
                )
                .await;

            let session = session::spawn(
                call_id.clone(),
                caller_group,
                callee_group,
                caller_language,
                callee_language,
                sales_username,
                services.state.clone(),
                services.recognizer_factory.clone(),
                services.session_cfg.clone(),
                services.call_metrics.clone(),
            );
            services.state.set_session(&call_id, session).await;
        }
        TranscriberControl::CallEnded { call_id } | TranscriberControl::CallRejected { call_id } => {
            services.conn_metrics.msg_rx("call_ended");
            if let Some(route) = services.state.remove_route(&call_id).await {
                if let Some(session) = route.session {
                    session.shutdown().await;
                }
            }
        }
        TranscriberControl::Logout { username: u } => {
            services.conn_metrics.msg_rx("logout");
            services.state.unregister(&u).await;
        }
    }
}
