use serde::{Deserialize, Serialize};

use crate::cohort::Cohort;
use crate::signaling::default_language;

/// Transcriber's text-frame control surface: the Relay surface plus the
/// per-client `language` attribute and both participants' languages on
/// `call_accepted` (spec.md §4.3).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TranscriberControl {
    Register {
        group: Cohort,
        username: String,
        #[serde(default = "default_language")]
        language: String,
    },
    CallAccepted {
        call_id: String,
        from_user: String,
        to_user: String,
        caller_group: Cohort,
        callee_group: Cohort,
        #[serde(default = "default_language")]
        caller_language: String,
        #[serde(default = "default_language")]
        callee_language: String,
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

/// Optional per-word timing/confidence metadata a recognizer may supply
/// alongside a final transcript.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WordTiming {
    pub word: String,
    pub start: f32,
    pub end: f32,
    pub confidence: f32,
}

/// Transcriber -> sales client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TranscriberEvent {
    Transcription {
        call_id: String,
        group: Cohort,
        text: String,
        is_final: bool,
    },
    Insight {
        call_id: String,
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_defaults_language() {
        let json = r#"{"event":"register","group":"customers","username":"Bob"}"#;
        let ev: TranscriberControl = serde_json::from_str(json).unwrap();
        match ev {
            TranscriberControl::Register { language, .. } => assert_eq!(language, "en"),
            _ => panic!("wrong variant"),
        }
    }
}
