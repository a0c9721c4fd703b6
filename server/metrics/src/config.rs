#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Bind address for Prometheus scrape endpoint, e.g. 0.0.0.0:9100
    pub listen: String,

    /// Optional namespace prefix, e.g. "vox_signaling"
    pub namespace: &'static str,
}

impl MetricsConfig {
    pub fn new(listen: impl Into<String>, namespace: &'static str) -> Self {
        Self { listen: listen.into(), namespace }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:9100".to_string(),
            namespace: "vox",
        }
    }
}
