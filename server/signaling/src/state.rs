use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use vox_wire::{Cohort, ServerEvent};

use crate::errors::{SignalingError, SignalingResult};

pub type ClientTx = mpsc::Sender<ServerEvent>;

struct UserRecord {
    cohort: Cohort,
    tx: ClientTx,
}

#[derive(Clone)]
pub struct CallRecord {
    pub caller: String,
    pub callee: String,
    pub caller_group: Cohort,
    pub callee_group: Cohort,
}

/// Owns the authoritative user and call maps (spec.md §3, §4.1). All
/// mutations go through `&self` methods that take the write lock only for
/// the map update itself; the caller performs network sends after the
/// guard is dropped, matching spec.md §4.1's "broadcasts proceed without
/// holding the map lock across the network write."
#[derive(Default)]
pub struct SignalingState {
    users: RwLock<HashMap<String, UserRecord>>,
    calls: RwLock<HashMap<String, CallRecord>>,
}

impl SignalingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `username` under `cohort`. Fails if a user with that exact
    /// name is already registered in the same cohort.
    pub async fn register(&self, cohort: Cohort, username: &str, tx: ClientTx) -> SignalingResult<()> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.get(username) {
            if existing.cohort == cohort {
                return Err(SignalingError::UsernameTaken);
            }
        }
        users.insert(username.to_string(), UserRecord { cohort, tx });
        Ok(())
    }

    pub async fn remove_user(&self, username: &str) -> Option<Cohort> {
        self.users.write().await.remove(username).map(|u| u.cohort)
    }

    pub async fn user_status(&self) -> ServerEvent {
        let users = self.users.read().await;
        let mut sales = Vec::new();
        let mut customers = Vec::new();
        for (name, rec) in users.iter() {
            match rec.cohort {
                Cohort::Sales => sales.push(name.clone()),
                Cohort::Customers => customers.push(name.clone()),
            }
        }
        sales.sort();
        customers.sort();
        ServerEvent::UserStatus { sales, customers }
    }

    pub async fn send_to(&self, username: &str, event: ServerEvent) {
        let tx = { self.users.read().await.get(username).map(|r| r.tx.clone()) };
        if let Some(tx) = tx {
            let _ = tx.try_send(event);
        }
    }

    pub async fn broadcast(&self, event: ServerEvent) {
        let txs: Vec<ClientTx> = self.users.read().await.values().map(|r| r.tx.clone()).collect();
        for tx in txs {
            let _ = tx.try_send(event.clone());
        }
    }

    pub async fn create_call(&self, call_id: &str, record: CallRecord) -> SignalingResult<()> {
        let mut calls = self.calls.write().await;
        if calls.contains_key(call_id) {
            return Err(SignalingError::CallIdInUse);
        }
        calls.insert(call_id.to_string(), record);
        Ok(())
    }

    pub async fn call(&self, call_id: &str) -> Option<CallRecord> {
        self.calls.read().await.get(call_id).cloned()
    }

    pub async fn remove_call(&self, call_id: &str) -> Option<CallRecord> {
        self.calls.write().await.remove(call_id)
    }

    /// All call_ids in which `username` participates, as caller or callee.
    pub async fn calls_for_user(&self, username: &str) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|(_, c)| c.caller == username || c.callee == username)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub async fn user_cohort(&self, username: &str) -> Option<Cohort> {
        self.users.read().await.get(username).map(|r| r.cohort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> (ClientTx, mpsc::Receiver<ServerEvent>) {
        mpsc::channel(8)
    }

    #[tokio::test]
    async fn duplicate_registration_same_cohort_is_rejected() {
        let state = SignalingState::new();
        let (tx1, _rx1) = tx();
        let (tx2, _rx2) = tx();
        state.register(Cohort::Sales, "alice", tx1).await.unwrap();
        let err = state.register(Cohort::Sales, "alice", tx2).await.unwrap_err();
        assert!(matches!(err, SignalingError::UsernameTaken));
    }

    #[tokio::test]
    async fn same_username_in_different_cohorts_is_allowed() {
        let state = SignalingState::new();
        let (tx1, _rx1) = tx();
        let (tx2, _rx2) = tx();
        state.register(Cohort::Sales, "alice", tx1).await.unwrap();
        assert!(state.register(Cohort::Customers, "alice", tx2).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_call_id_is_rejected() {
        let state = SignalingState::new();
        let record = CallRecord {
            caller: "a".into(),
            callee: "b".into(),
            caller_group: Cohort::Sales,
            callee_group: Cohort::Customers,
        };
        state.create_call("c1", record.clone()).await.unwrap();
        let err = state.create_call("c1", record).await.unwrap_err();
        assert!(matches!(err, SignalingError::CallIdInUse));
    }

    #[tokio::test]
    async fn calls_for_user_finds_both_roles() {
        let state = SignalingState::new();
        state
            .create_call(
                "c1",
                CallRecord { caller: "a".into(), callee: "b".into(), caller_group: Cohort::Sales, callee_group: Cohort::Customers },
            )
            .await
            .unwrap();
        assert_eq!(state.calls_for_user("a").await, vec!["c1".to_string()]);
        assert_eq!(state.calls_for_user("b").await, vec!["c1".to_string()]);
        assert!(state.calls_for_user("c").await.is_empty());
    }
}
