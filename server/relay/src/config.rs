use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "vox-relay", about = "Audio relay service")]
pub struct Config {
    #[arg(long, default_value = "0.0.0.0:8002")]
    pub listen: String,

    #[arg(long, env = "VOX_TLS_CERT_PEM")]
    pub tls_cert_pem: Option<String>,

    #[arg(long, env = "VOX_TLS_KEY_PEM")]
    pub tls_key_pem: Option<String>,

    #[arg(long, default_value = "0.0.0.0:9102")]
    pub metrics_listen: String,
}
