pub mod call;
pub mod config;
pub mod conn;
pub mod http;
pub mod labels;

pub use call::CallMetrics;
pub use config::MetricsConfig;
pub use conn::ConnMetrics;
pub use http::MetricsServer;
pub use labels::{BoundedLabel, LabelPolicy};
