//! JSON wire envelopes shared by the four call-plane services. Every
//! message is a `#[serde(tag = "event")]` enum so an unknown tag fails to
//! parse with a single `serde_json::Error` instead of silently matching
//! the wrong variant.

pub mod cohort;
pub mod insight;
pub mod relay;
pub mod signaling;
pub mod transcriber;

pub use cohort::Cohort;
pub use insight::{InsightEventTag, InsightRequest, InsightResponse};
pub use relay::RelayControl;
pub use signaling::{ClientEvent, ServerEvent};
pub use transcriber::{TranscriberControl, TranscriberEvent, WordTiming};
