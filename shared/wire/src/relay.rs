use serde::{Deserialize, Serialize};

use crate::cohort::Cohort;

/// Relay's entire text-frame control surface. Received both from browser
/// clients (`Register`) and from Signaling's fan-out connection
/// (`CallAccepted`/`CallEnded`/`CallRejected`). Binary frames (opaque audio)
/// are handled separately from this enum, matching the original's
/// string-vs-bytes dispatch on the same socket.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RelayControl {
    Register {
        group: Cohort,
        username: String,
    },
    CallAccepted {
        call_id: String,
        from_user: String,
        to_user: String,
        caller_group: Cohort,
        callee_group: Cohort,
    },
    CallEnded {
        call_id: String,
    },
    CallRejected {
        call_id: String,
    },
    Logout {
        username: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_accepted_round_trips() {
        let json = r#"{"event":"call_accepted","call_id":"c1","from_user":"Alice","to_user":"Bob","caller_group":"sales","callee_group":"customers"}"#;
        let ev: RelayControl = serde_json::from_str(json).unwrap();
        matches!(ev, RelayControl::CallAccepted { .. });
    }
}
