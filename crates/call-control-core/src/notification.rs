//! Notification messages from the subscription feed
//!
//! The feed delivers `{event, body}` messages. Only telephony session
//! events are consumed: the topic must reference `/telephony/sessions` and
//! the body must carry a `telephonySessionId`. Everything else is ignored
//! without error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::opt_string_or_number;
use crate::party::{format_party, RawParty};
use crate::session::{SessionData, SessionOrigin, SessionUpdate};

const TELEPHONY_SESSIONS_TOPIC: &str = "/telephony/sessions";

/// Raw message as delivered by the subscription
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotificationMessage {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub body: Value,
}

impl NotificationMessage {
    pub fn new(event: impl Into<String>, body: Value) -> Self {
        Self { event: event.into(), body }
    }

    pub fn is_telephony_session_event(&self) -> bool {
        self.event.contains(TELEPHONY_SESSIONS_TOPIC)
    }

    /// Decode the body when this is a usable telephony session event
    ///
    /// Returns `None` for other topics, for bodies without a session id and
    /// for bodies that cannot be decoded.
    pub fn telephony_session_event(&self) -> Option<TelephonySessionEvent> {
        if !self.is_telephony_session_event() {
            return None;
        }
        let event = TelephonySessionEvent::deserialize(&self.body).ok()?;
        event.telephony_session_id.as_ref()?;
        Some(event)
    }
}

/// Body of a telephony session notification
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelephonySessionEvent {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub telephony_session_id: Option<String>,
    #[serde(default)]
    pub sequence: Option<u64>,
    #[serde(default)]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parties: Vec<RawParty>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub origin: Option<SessionOrigin>,
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub voice_call_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TelephonySessionEvent {
    pub fn id(&self) -> &str {
        self.telephony_session_id.as_deref().unwrap_or_default()
    }

    /// Session data for a session first seen through this event
    ///
    /// `creation_time` falls back to the event time.
    pub fn to_session_data(&self) -> SessionData {
        SessionData {
            id: self.id().to_string(),
            parties: self.parties.iter().cloned().map(format_party).collect(),
            creation_time: self.creation_time.or(self.event_time),
            session_id: self.session_id.clone(),
            voice_call_token: self.voice_call_token.clone(),
            origin: self.origin.clone(),
            server_id: self.server_id.clone(),
            ..Default::default()
        }
    }

    /// Partial snapshot for a session that is already held
    pub fn to_update(&self) -> SessionUpdate {
        SessionUpdate {
            parties: self.parties.iter().cloned().map(format_party).collect(),
            sequence: self.sequence,
            session_id: self.session_id.clone(),
            server_id: self.server_id.clone(),
            origin: self.origin.clone(),
        }
    }
}
