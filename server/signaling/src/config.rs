use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "vox-signaling", about = "Call-control signaling service")]
pub struct Config {
    #[arg(long, default_value = "0.0.0.0:8001")]
    pub listen: String,

    #[arg(long, env = "VOX_TLS_CERT_PEM")]
    pub tls_cert_pem: Option<String>,

    #[arg(long, env = "VOX_TLS_KEY_PEM")]
    pub tls_key_pem: Option<String>,

    #[arg(long, default_value = "0.0.0.0:9101")]
    pub metrics_listen: String,

    /// Outbound fan-out target for the Relay service.
    #[arg(long, default_value = "wss://127.0.0.1:8002")]
    pub relay_url: String,

    /// Outbound fan-out target for the Transcriber service.
    #[arg(long, default_value = "wss://127.0.0.1:8003")]
    pub transcriber_url: String,

    /// Reject call_user when the callee already participates in another
    /// active call, instead of spec.md's default of allowing it (see
    /// DESIGN.md, Open Question: concurrent calls per user).
    #[arg(long, default_value_t = false)]
    pub reject_second_call: bool,
}
