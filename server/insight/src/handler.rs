use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::Message;
use tracing::warn;
use vox_insight_engine::InsightEngine;
use vox_metrics::{CallMetrics, ConnMetrics};
use vox_wire::{InsightRequest, InsightResponse};

pub struct Services {
    pub engine: Arc<dyn InsightEngine>,
    pub conn_metrics: Arc<ConnMetrics>,
    pub call_metrics: Arc<CallMetrics>,
}

/// One Insight channel: requests are handled strictly in receive order
/// (spec.md §4.4 "handles requests serially per channel"), and no state
/// survives from one request to the next.
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

    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        services.conn_metrics.msg_rx("infer");
        let req: InsightRequest = match serde_json::from_str(&text) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "unparseable insight request, dropping");
                continue;
            }
        };

        services.call_metrics.insight_requested();
        let started = std::time::Instant::now();
        let commentary = services.engine.infer(&req.call_id, &req.text);
        let resp = InsightResponse::new(req.call_id, commentary);
        let Ok(payload) = serde_json::to_string(&resp) else {
            warn!("failed to encode insight response, dropping");
            continue;
        };
        if sink.send(Message::Text(payload.into())).await.is_err() {
            break;
        }
        services.call_metrics.insight_received(started.elapsed().as_secs_f64());
    }

    services.conn_metrics.closed();
}
