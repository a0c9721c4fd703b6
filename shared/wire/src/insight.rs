use serde::{Deserialize, Serialize};

/// Transcriber -> Insight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsightRequest {
    pub call_id: String,
    pub text: String,
}

/// Insight -> Transcriber. The `event` field is always `"insight"`; it is
/// serialized explicitly (rather than as a tagged enum of one variant) so
/// the wire shape matches spec.md §6 byte-for-byte.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsightResponse {
    pub event: InsightEventTag,
    pub call_id: String,
    pub text: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InsightEventTag {
    Insight,
}

impl InsightResponse {
    pub fn new(call_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { event: InsightEventTag::Insight, call_id: call_id.into(), text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_serializes_event_tag() {
        let resp = InsightResponse::new("c1", "hello");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""event":"insight""#));
    }
}
