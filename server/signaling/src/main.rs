mod config;
mod errors;
mod fanout;
mod handler;
mod state;
mod tls;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rustls::ServerConfig as RustlsServerConfig;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;
use vox_metrics::{CallMetrics, ConnMetrics, LabelPolicy, MetricsConfig, MetricsServer};

use config::Config;
use fanout::FanoutLink;
use handler::Services;
use state::SignalingState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let _ = rustls::crypto::ring::default_provider().install_default();

    let cfg = Config::parse();

    let ms = MetricsServer::install(MetricsConfig::new(cfg.metrics_listen.clone(), "vox_signaling"))?;
    tokio::spawn(async move {
        if let Err(e) = ms.serve().await {
            warn!("metrics server stopped: {e:#}");
        }
    });

    let services = Arc::new(Services {
        state: Arc::new(SignalingState::new()),
        relay: FanoutLink::new(cfg.relay_url.clone(), "relay"),
        transcriber: FanoutLink::new(cfg.transcriber_url.clone(), "transcriber"),
        conn_metrics: Arc::new(ConnMetrics::new("vox_signaling")),
        call_metrics: Arc::new(CallMetrics::new("vox_signaling", LabelPolicy::default())),
        cfg: Arc::new(cfg.clone()),
    });

    let (certs, key) = tls::load_or_generate_tls(cfg.tls_cert_pem.as_deref(), cfg.tls_key_pem.as_deref())?;
    let server_cfg = RustlsServerConfig::builder().with_no_client_auth().with_single_cert(certs, key)?;
    let acceptor = TlsAcceptor::from(Arc::new(server_cfg));

    let listener = TcpListener::bind(&cfg.listen).await?;
    info!("signaling listening on wss://{}", cfg.listen);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let acceptor = acceptor.clone();
                let services = services.clone();
                tokio::spawn(async move {
                    match acceptor.accept(stream).await {
                        Ok(tls_stream) => handler::handle_connection(tls_stream, services).await,
                        Err(e) => warn!(%peer, "tls handshake failed: {e}"),
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown");
                return Ok(());
            }
        }
    }
}
