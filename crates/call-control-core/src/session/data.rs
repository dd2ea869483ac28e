//! Session snapshot types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CallControlResult;
use crate::ids::{opt_string_or_number, string_or_number};
use crate::party::{format_party, Party, RawParty};

/// Where the session came from (`Call`, `RingOut`, `RingMe`, `Conference`, ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionOrigin {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized state of one telephony session
///
/// `extension_id`/`account_id` hold the observer's identity, not an owner of
/// the call; they decide which party is "mine".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    /// Telephony session id
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub account_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub extension_id: Option<String>,
    #[serde(default)]
    pub parties: Vec<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
    /// Correlation id used to pair call legs
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_call_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<SessionOrigin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionData {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    /// Decode a session as the REST API returns it, normalizing every party
    pub fn from_api(mut value: Value) -> CallControlResult<Self> {
        let raw_parties = value
            .as_object_mut()
            .and_then(|object| object.remove("parties"))
            .unwrap_or(Value::Null);
        let mut data: SessionData = serde_json::from_value(value)?;
        let raw_parties: Vec<RawParty> = match raw_parties {
            Value::Null => Vec::new(),
            parties => serde_json::from_value(parties)?,
        };
        data.parties = raw_parties.into_iter().map(format_party).collect();
        Ok(data)
    }

    pub fn with_identity(mut self, extension_id: Option<String>, account_id: Option<String>) -> Self {
        self.extension_id = extension_id;
        self.account_id = account_id;
        self
    }

    pub fn with_party(mut self, party: Party) -> Self {
        self.parties.push(party);
        self
    }

    /// True when the snapshot has no party that is still alive
    pub fn is_fully_disconnected(&self) -> bool {
        self.parties.iter().all(Party::is_disconnected)
    }
}
