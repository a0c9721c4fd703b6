use metrics::{counter, histogram};

use crate::labels::LabelPolicy;

/// Call-plane counters: registrations, call lifecycle, media forwarding,
/// recognizer output, and insight round-trips.
pub struct CallMetrics {
    ns: &'static str,
    policy: LabelPolicy,
}

impl CallMetrics {
    pub fn new(namespace: &'static str, policy: LabelPolicy) -> Self {
        Self { ns: namespace, policy }
    }

    #[inline]
    pub fn registered(&self, group: &'static str) {
        counter!(format!("{}_registrations_total", self.ns), "group" => group).increment(1);
    }

    #[inline]
    pub fn call_started(&self) {
        counter!(format!("{}_calls_started_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn call_ended(&self) {
        counter!(format!("{}_calls_ended_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn call_rejected(&self) {
        counter!(format!("{}_calls_rejected_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn frame_forwarded(&self) {
        counter!(format!("{}_frames_forwarded_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn frame_dropped(&self, reason: &'static str) {
        counter!(
            format!("{}_frames_dropped_total", self.ns),
            "reason" => self.policy.reason(reason).as_str().to_string()
        )
        .increment(1);
    }

    #[inline]
    pub fn recognizer_partial(&self) {
        counter!(format!("{}_recognizer_partials_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn recognizer_final(&self, words: usize) {
        counter!(format!("{}_recognizer_finals_total", self.ns)).increment(1);
        histogram!(format!("{}_recognizer_final_words", self.ns)).record(words as f64);
    }

    #[inline]
    pub fn insight_requested(&self) {
        counter!(format!("{}_insight_requests_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn insight_received(&self, seconds: f64) {
        counter!(format!("{}_insight_responses_total", self.ns)).increment(1);
        histogram!(format!("{}_insight_latency_seconds", self.ns)).record(seconds);
    }
}
