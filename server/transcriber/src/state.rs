use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use vox_wire::{Cohort, TranscriberEvent};

pub type ClientTx = mpsc::Sender<TranscriberEvent>;

/// One registered client's attributes (spec.md §4.3: "an extra per-client
/// attribute `language` captured on `register`").
#[derive(Clone)]
struct ClientRecord {
    #[allow(dead_code)]
    cohort: Cohort,
    language: String,
    tx: ClientTx,
}

/// The Transcriber's shadow of one call: enough to attribute an inbound
/// PCM frame to a speaker cohort and to find the sales participant (spec.md
/// §3 "Ownership summary").
#[derive(Clone)]
pub struct CallRoute {
    pub caller: String,
    pub callee: String,
    pub caller_group: Cohort,
    pub callee_group: Cohort,
    /// `None` only during the brief window between route registration and
    /// session spawn; always `Some` once `call_accepted` fully lands.
    pub session: Option<crate::session::SessionHandle>,
}

impl CallRoute {
    /// The username of whichever participant belongs to `Cohort::Sales`.
    /// Calls are always cross-cohort (spec.md §3 invariant), so exactly one
    /// of the two participants is sales.
    pub fn sales_username(&self) -> Option<&str> {
        if self.caller_group == Cohort::Sales {
            Some(self.caller.as_str())
        } else if self.callee_group == Cohort::Sales {
            Some(self.callee.as_str())
        } else {
            None
        }
    }

    pub fn cohort_of(&self, username: &str) -> Option<Cohort> {
        if self.caller == username {
            Some(self.caller_group)
        } else if self.callee == username {
            Some(self.callee_group)
        } else {
            None
        }
    }
}

/// Registrations, the call-routing shadow, and the username -> call_id
/// index used to attribute an inbound binary frame (spec.md §4.3
/// "Binary-frame ingestion").
#[derive(Default)]
pub struct TranscriberState {
    clients: RwLock<HashMap<String, ClientRecord>>,
    calls: RwLock<HashMap<String, CallRoute>>,
    user_call: RwLock<HashMap<String, String>>,
}

impl TranscriberState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn register(&self, cohort: Cohort, username: &str, language: String, tx: ClientTx) {
        self.clients.write().await.insert(username.to_string(), ClientRecord { cohort, language, tx });
    }

    pub async fn unregister(&self, username: &str) {
        self.clients.write().await.remove(username);
    }

    pub async fn language_of(&self, username: &str) -> String {
        self.clients.read().await.get(username).map(|c| c.language.clone()).unwrap_or_else(vox_wire::signaling::default_language)
    }

    pub async fn send_to(&self, username: &str, event: TranscriberEvent) {
        let tx = { self.clients.read().await.get(username).map(|c| c.tx.clone()) };
        if let Some(tx) = tx {
            let _ = tx.try_send(event);
        }
    }

    pub async fn insert_route(&self, call_id: &str, route: CallRoute) {
        self.user_call.write().await.insert(route.caller.clone(), call_id.to_string());
        self.user_call.write().await.insert(route.callee.clone(), call_id.to_string());
        self.calls.write().await.insert(call_id.to_string(), route);
    }

    pub async fn set_session(&self, call_id: &str, session: crate::session::SessionHandle) {
        if let Some(route) = self.calls.write().await.get_mut(call_id) {
            route.session = Some(session);
        }
    }

    pub async fn remove_route(&self, call_id: &str) -> Option<CallRoute> {
        let route = self.calls.write().await.remove(call_id);
        if let Some(r) = &route {
            let mut user_call = self.user_call.write().await;
            if user_call.get(&r.caller).map(|c| c.as_str()) == Some(call_id) {
                user_call.remove(&r.caller);
            }
            if user_call.get(&r.callee).map(|c| c.as_str()) == Some(call_id) {
                user_call.remove(&r.callee);
            }
        }
        route
    }

    pub async fn route_for(&self, call_id: &str) -> Option<CallRoute> {
        self.calls.read().await.get(call_id).cloned()
    }

    /// The call currently attributed to `username`, for routing an inbound
    /// binary frame (spec.md §4.3: "attributed to its sender's current
    /// call (by username membership)").
    pub async fn current_call_of(&self, username: &str) -> Option<String> {
        self.user_call.read().await.get(username).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> (ClientTx, mpsc::Receiver<TranscriberEvent>) {
        mpsc::channel(8)
    }

    #[tokio::test]
    async fn route_identifies_sales_participant_either_side() {
        let a = CallRoute { caller: "alice".into(), callee: "bob".into(), caller_group: Cohort::Sales, callee_group: Cohort::Customers, session: None };
        assert_eq!(a.sales_username(), Some("alice"));
        let b = CallRoute { caller: "bob".into(), callee: "alice".into(), caller_group: Cohort::Customers, callee_group: Cohort::Sales, session: None };
        assert_eq!(b.sales_username(), Some("alice"));
    }

    #[tokio::test]
    async fn current_call_of_tracks_both_participants() {
        let state = TranscriberState::default();
        let route = CallRoute { caller: "alice".into(), callee: "bob".into(), caller_group: Cohort::Sales, callee_group: Cohort::Customers, session: None };
        state.insert_route("c1", route).await;
        assert_eq!(state.current_call_of("alice").await, Some("c1".to_string()));
        assert_eq!(state.current_call_of("bob").await, Some("c1".to_string()));
        state.remove_route("c1").await;
        assert_eq!(state.current_call_of("alice").await, None);
    }

    #[tokio::test]
    async fn send_to_unregistered_user_is_silently_dropped() {
        let state = TranscriberState::default();
        state
            .send_to("nobody", TranscriberEvent::Insight { call_id: "c1".into(), text: "hi".into() })
            .await;
    }

    #[tokio::test]
    async fn register_then_language_of_round_trips() {
        let state = TranscriberState::default();
        let (tx, _rx) = tx();
        state.register(Cohort::Sales, "alice", "ja".to_string(), tx).await;
        assert_eq!(state.language_of("alice").await, "ja");
        assert_eq!(state.language_of("unknown").await, "en");
    }
}
