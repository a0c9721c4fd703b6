use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "vox-transcriber", about = "Per-speaker recognition and insight dispatch service")]
pub struct Config {
    #[arg(long, default_value = "0.0.0.0:8003")]
    pub listen: String,

    #[arg(long, env = "VOX_TLS_CERT_PEM")]
    pub tls_cert_pem: Option<String>,

    #[arg(long, env = "VOX_TLS_KEY_PEM")]
    pub tls_key_pem: Option<String>,

    #[arg(long, default_value = "0.0.0.0:9103")]
    pub metrics_listen: String,

    /// Outbound target for the Insight service.
    #[arg(long, default_value = "wss://127.0.0.1:8004")]
    pub insight_url: String,

    /// RMS silence gate threshold (spec.md §4.3 step 1).
    #[arg(long, default_value_t = vox_recognizer::DEFAULT_SILENCE_THRESHOLD)]
    pub silence_threshold: f32,

    /// Minimum buffered audio duration, in seconds, before a prefix is fed
    /// to the recognizer (spec.md §4.3 step 3).
    #[arg(long, default_value_t = 0.2)]
    pub min_buffer_duration_secs: f32,

    /// Sample rate in Hz the client is expected to stream PCM at.
    #[arg(long, default_value_t = 48_000)]
    pub target_rate: u32,

    /// Bytes per sample (16-bit PCM -> 2).
    #[arg(long, default_value_t = 2)]
    pub bytes_per_sample: u32,

    /// Max inter-word gap, in seconds, that splits a final transcript into
    /// separate phrases (spec.md §4.3 step 5).
    #[arg(long, default_value_t = 0.5)]
    pub max_gap_secs: f32,

    /// Minimum average per-word confidence a phrase must meet to survive
    /// filtering (spec.md §4.3 step 5).
    #[arg(long, default_value_t = 0.7)]
    pub confidence_threshold: f32,

    /// Per-call bounded PCM/insight queue depth.
    #[arg(long, default_value_t = 64)]
    pub queue_depth: usize,

    /// Timeout, in milliseconds, for one Insight round-trip before the
    /// request is abandoned and logged (ambient robustness; spec.md §4.3
    /// states the insight-drain "does not back-pressure the recognition
    /// path" but does not forbid bounding a single stalled round-trip).
    #[arg(long, default_value_t = 5_000)]
    pub insight_timeout_ms: u64,
}

impl Config {
    pub fn process_threshold_bytes(&self) -> usize {
        (self.target_rate as f32 * self.bytes_per_sample as f32 * self.min_buffer_duration_secs) as usize
    }
}
