use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "vox-insight", about = "Stateless request/response commentary generator")]
pub struct Config {
    #[arg(long, default_value = "0.0.0.0:8004")]
    pub listen: String,

    #[arg(long, env = "VOX_TLS_CERT_PEM")]
    pub tls_cert_pem: Option<String>,

    #[arg(long, env = "VOX_TLS_KEY_PEM")]
    pub tls_key_pem: Option<String>,

    #[arg(long, default_value = "0.0.0.0:9104")]
    pub metrics_listen: String,
}
