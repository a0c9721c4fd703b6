use metrics::counter;

/// Connection-lifecycle counters shared by all four WebSocket services.
pub struct ConnMetrics {
    ns: &'static str,
}

impl ConnMetrics {
    pub fn new(namespace: &'static str) -> Self {
        Self { ns: namespace }
    }

    #[inline]
    pub fn accepted(&self) {
        counter!(format!("{}_connections_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn closed(&self) {
        counter!(format!("{}_connections_closed_total", self.ns)).increment(1);
    }

    #[inline]
    pub fn msg_rx(&self, kind: &'static str) {
        counter!(format!("{}_control_rx_total", self.ns), "kind" => kind).increment(1);
    }

    #[inline]
    pub fn msg_tx(&self, kind: &'static str) {
        counter!(format!("{}_control_tx_total", self.ns), "kind" => kind).increment(1);
    }
}
