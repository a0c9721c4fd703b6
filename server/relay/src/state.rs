use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};
use tracing::error;
use vox_wire::Cohort;

const MAX_OVERFLOW_FRAMES: usize = 50;

pub type AudioTx = mpsc::Sender<Bytes>;

#[derive(Clone)]
pub struct CallRoute {
    pub caller: String,
    pub callee: String,
    #[allow(dead_code)]
    pub caller_group: Cohort,
    #[allow(dead_code)]
    pub callee_group: Cohort,
}

/// Routing table and per-sender overflow buffers (spec.md §4.2). The relay
/// never decodes or reorders audio; it only tracks who is currently
/// registered and which call_id pairs two usernames.
#[derive(Default)]
pub struct RelayState {
    registrations: RwLock<HashMap<String, AudioTx>>,
    calls: RwLock<HashMap<String, CallRoute>>,
    overflow: RwLock<HashMap<String, VecDeque<Bytes>>>,
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, username: &str, tx: AudioTx) {
        self.registrations.write().await.insert(username.to_string(), tx);
    }

    pub async fn unregister(&self, username: &str) {
        self.registrations.write().await.remove(username);
        self.overflow.write().await.remove(username);
    }

    pub async fn call_accepted(&self, call_id: &str, route: CallRoute) {
        self.calls.write().await.insert(call_id.to_string(), route);
    }

    pub async fn call_ended(&self, call_id: &str) {
        self.calls.write().await.remove(call_id);
    }

    /// Find the peer of `sender` across any currently routed call.
    async fn peer_of(&self, sender: &str) -> Option<String> {
        let calls = self.calls.read().await;
        calls.values().find_map(|c| {
            if c.caller == sender {
                Some(c.callee.clone())
            } else if c.callee == sender {
                Some(c.caller.clone())
            } else {
                None
            }
        })
    }

    /// Route one binary frame from `sender`. Forwards verbatim to the peer
    /// if the peer is registered and accepting; otherwise buffers up to
    /// `MAX_OVERFLOW_FRAMES` per sender and drops further frames with a
    /// logged error.
    pub async fn forward(&self, sender: &str, frame: Bytes) {
        let peer = self.peer_of(sender).await;

        let peer_tx = match &peer {
            Some(peer) => self.registrations.read().await.get(peer).cloned(),
            None => None,
        };

        if let Some(tx) = peer_tx {
            if tx.try_send(frame).is_ok() {
                return;
            }
        }

        let mut overflow = self.overflow.write().await;
        let buf = overflow.entry(sender.to_string()).or_default();
        if buf.len() < MAX_OVERFLOW_FRAMES {
            buf.push_back(frame);
        } else {
            error!(sender, "buffer overflow for sender, dropping chunk");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(caller: &str, callee: &str) -> CallRoute {
        CallRoute { caller: caller.into(), callee: callee.into(), caller_group: Cohort::Sales, callee_group: Cohort::Customers }
    }

    #[tokio::test]
    async fn forwards_to_registered_peer() {
        let state = RelayState::new();
        let (tx, mut rx) = mpsc::channel(4);
        state.register("bob", tx).await;
        state.call_accepted("c1", route("alice", "bob")).await;
        state.forward("alice", Bytes::from_static(b"hi")).await;
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"hi"));
    }

    #[tokio::test]
    async fn buffers_when_peer_unregistered() {
        let state = RelayState::new();
        state.call_accepted("c1", route("alice", "bob")).await;
        for _ in 0..60 {
            state.forward("alice", Bytes::from_static(b"x")).await;
        }
        let overflow = state.overflow.read().await;
        assert_eq!(overflow.get("alice").unwrap().len(), MAX_OVERFLOW_FRAMES);
    }

    #[tokio::test]
    async fn call_ended_removes_route() {
        let state = RelayState::new();
        let (tx, mut rx) = mpsc::channel(4);
        state.register("bob", tx).await;
        state.call_accepted("c1", route("alice", "bob")).await;
        state.call_ended("c1").await;
        state.forward("alice", Bytes::from_static(b"hi")).await;
        assert!(rx.try_recv().is_err());
    }
}
