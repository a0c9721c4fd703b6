use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message, Connector};
use vox_wire::{InsightRequest, InsightResponse};

use crate::tls::insecure_client_config;

/// One request/response round-trip to the Insight service. A fresh
/// connection is opened per request rather than held persistently: the
/// insight-drain task is tolerant of connection loss (spec.md §4.3
/// "Loss of the Insight connection is tolerated") and a request arrives
/// only once per final customer utterance, so there is no benefit to
/// keeping a socket warm between calls.
pub async fn request(url: &str, call_id: &str, text: &str, timeout: Duration) -> Result<String> {
    tokio::time::timeout(timeout, exchange(url, call_id, text))
        .await
        .context("insight round-trip timed out")?
}

async fn exchange(url: &str, call_id: &str, text: &str) -> Result<String> {
    let connector = Connector::Rustls(std::sync::Arc::new(insecure_client_config()));
    let (stream, _) = connect_async_tls_with_config(url, None, false, Some(connector))
        .await
        .context("connect to insight service")?;
    let (mut sink, mut source) = stream.split();

    let req = InsightRequest { call_id: call_id.to_string(), text: text.to_string() };
    let payload = serde_json::to_string(&req).context("encode insight request")?;
    sink.send(Message::Text(payload.into())).await.context("send insight request")?;

    while let Some(msg) = source.next().await {
        match msg.context("read insight response")? {
            Message::Text(t) => {
                let resp: InsightResponse = serde_json::from_str(&t).context("parse insight response")?;
                return Ok(resp.text);
            }
            Message::Close(_) => break,
            _ => continue,
        }
    }
    Err(anyhow!("insight connection closed before a response arrived"))
}
