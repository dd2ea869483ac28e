//! Party records and their normalization
//!
//! A party is one leg or participant of a telephony session. Parties reach
//! this crate from three places (REST session details, REST call-control
//! responses and notification events) and all of them go through
//! [`format_party`] before they are stored, so ownership is always carried
//! as flat `extension_id`/`account_id` strings.
//!
//! Fields the crate does not interpret are kept in `extra` so that a party
//! survives a round trip through [`Session::data`](crate::Session::data)
//! without losing anything the service sent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{opt_string_or_number, string_or_number};

/// Direction of a party relative to its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Party status codes reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartyStatusCode {
    Setup,
    Proceeding,
    Answered,
    Disconnected,
    Gone,
    Parked,
    Hold,
    #[serde(rename = "VoiceMail")]
    Voicemail,
    FaxReceive,
    #[serde(rename = "VoiceMailScreening")]
    VoicemailScreening,
    /// Any code this crate does not know about yet
    #[serde(other)]
    Unknown,
}

/// Status reasons that describe a hand-off within the same call rather
/// than the end of it.
pub const REASON_PICKUP: &str = "Pickup";
pub const REASON_CALL_SWITCH: &str = "CallSwitch";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<PartyStatusCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartyStatus {
    pub fn new(code: PartyStatusCode) -> Self {
        Self { code: Some(code), ..Default::default() }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Caller or callee description attached to a party
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyToFrom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub extension_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartyToFrom {
    pub fn phone(number: impl Into<String>) -> Self {
        Self { phone_number: Some(number.into()), ..Default::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConferenceRole {
    Host,
    Participant,
}

/// Role in a RingOut or RingMe call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingRole {
    Initiator,
    Target,
}

/// Call recording attached to a party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub active: bool,
}

/// Park location returned by the park operation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParkInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized party record
///
/// Every field except `id` is optional because notification events may
/// carry partial party snapshots; an absent field never overwrites a held
/// value when updates are merged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub extension_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PartyToFrom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PartyToFrom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PartyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_call: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stand_alone: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference_role: Option<ConferenceRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring_out_role: Option<RingRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ring_me_role: Option<RingRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recordings: Option<Vec<Recording>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub park: Option<ParkInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Party {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    pub fn status_code(&self) -> Option<PartyStatusCode> {
        self.status.as_ref().and_then(|s| s.code)
    }

    pub fn status_reason(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.reason.as_deref())
    }

    pub fn is_disconnected(&self) -> bool {
        self.status_code() == Some(PartyStatusCode::Disconnected)
    }

    /// Disconnected because the call moved to another of the owner's
    /// endpoints, not because it ended.
    pub fn is_handoff_disconnect(&self) -> bool {
        self.is_disconnected()
            && matches!(self.status_reason(), Some(REASON_PICKUP) | Some(REASON_CALL_SWITCH))
    }

    pub fn recordings(&self) -> &[Recording] {
        self.recordings.as_deref().unwrap_or(&[])
    }

    pub fn from_number(&self) -> Option<&str> {
        self.from.as_ref().and_then(|f| f.phone_number.as_deref())
    }

    pub fn to_number(&self) -> Option<&str> {
        self.to.as_ref().and_then(|t| t.phone_number.as_deref())
    }
}

/// Ownership block attached to raw party records
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyOwner {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub extension_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub account_id: Option<String>,
}

/// Party record as it arrives from the service
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawParty {
    #[serde(default)]
    pub owner: Option<PartyOwner>,
    #[serde(flatten)]
    pub party: Party,
}

impl From<Party> for RawParty {
    fn from(party: Party) -> Self {
        Self { owner: None, party }
    }
}

/// Normalize a raw party record
///
/// When an `owner` block is present its ids replace the party's own.
/// Without one, an `account_id` is only kept alongside an `extension_id`.
/// The `owner` block itself is dropped.
pub fn format_party(raw: RawParty) -> Party {
    let RawParty { owner, mut party } = raw;
    match owner {
        Some(owner) => {
            party.extension_id = owner.extension_id;
            party.account_id = owner.account_id;
        }
        None => {
            let has_extension = party.extension_id.as_deref().map_or(false, |e| !e.is_empty());
            if !has_extension {
                party.account_id = None;
            }
        }
    }
    party
}
