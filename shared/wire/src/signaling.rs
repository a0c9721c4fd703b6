use serde::{Deserialize, Serialize};

use crate::cohort::Cohort;

/// Client -> Signaling. Tag field matches the wire's `event` discriminator.
///
/// Fields that spec.md §4.1/§7 require to be validated with a
/// `error{"Missing …"}` response (rather than a dropped, unparseable
/// frame) are `Option`-typed here: serde leaves an absent JSON field as
/// `None` instead of failing the whole envelope to parse, and the
/// signaling handler checks for `None` explicitly before acting.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    Register {
        group: Option<Cohort>,
        username: Option<String>,
    },
    CallUser {
        call_id: Option<String>,
        to_user: Option<String>,
        from_group: Option<Cohort>,
        from_user: Option<String>,
    },
    AcceptCall {
        call_id: Option<String>,
        #[serde(default = "default_language")]
        language: String,
    },
    CallRejected {
        call_id: Option<String>,
    },
    HangUp {
        call_id: Option<String>,
    },
    Logout,
    Ping {
        timestamp: serde_json::Value,
    },
}

pub fn default_language() -> String {
    "en".to_string()
}

/// Signaling -> Client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    SetCookie {
        session_id: String,
    },
    UserStatus {
        sales: Vec<String>,
        customers: Vec<String>,
    },
    IncomingCall {
        call_id: String,
        from_user: String,
    },
    CallAccepted {
        call_id: String,
        from_user: String,
        to_user: String,
        caller_group: Cohort,
        callee_group: Cohort,
        language: String,
    },
    CallRejected,
    CallEnded,
    Pong {
        timestamp: serde_json::Value,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_round_trips() {
        let json = r#"{"event":"register","group":"sales","username":"Alice"}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        match ev {
            ClientEvent::Register { group, username } => {
                assert_eq!(group, Some(Cohort::Sales));
                assert_eq!(username, Some("Alice".to_string()));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn register_missing_group_deserializes_to_none() {
        let json = r#"{"event":"register","username":"Alice"}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        match ev {
            ClientEvent::Register { group, username } => {
                assert_eq!(group, None);
                assert_eq!(username, Some("Alice".to_string()));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn accept_call_defaults_language() {
        let json = r#"{"event":"accept_call","call_id":"c1"}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        match ev {
            ClientEvent::AcceptCall { call_id, language } => {
                assert_eq!(call_id, Some("c1".to_string()));
                assert_eq!(language, "en");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn unknown_event_fails_to_parse() {
        let json = r#"{"event":"frobnicate"}"#;
        let res: Result<ClientEvent, _> = serde_json::from_str(json);
        assert!(res.is_err());
    }

    #[test]
    fn server_event_serializes_tag() {
        let ev = ServerEvent::CallEnded;
        assert_eq!(serde_json::to_string(&ev).unwrap(), r#"{"event":"call_ended"}"#);
    }
}
