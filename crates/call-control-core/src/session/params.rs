//! Request bodies for party-scoped operations

use serde::{Deserialize, Serialize};

/// Redirect target for `forward`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_number: Option<String>,
    /// Extension id whose voicemail receives the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voicemail: Option<String>,
}

impl ForwardParams {
    pub fn phone_number(number: impl Into<String>) -> Self {
        Self { phone_number: Some(number.into()), ..Default::default() }
    }

    pub fn extension_number(number: impl Into<String>) -> Self {
        Self { extension_number: Some(number.into()), ..Default::default() }
    }

    pub fn voicemail(extension_id: impl Into<String>) -> Self {
        Self { voicemail: Some(extension_id.into()), ..Default::default() }
    }
}

/// Redirect target for `transfer`; a park orbit is also accepted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    #[serde(flatten)]
    pub target: ForwardParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub park_orbit: Option<String>,
}

impl From<ForwardParams> for TransferParams {
    fn from(target: ForwardParams) -> Self {
        Self { target, park_orbit: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipParams {
    pub call_flip_id: String,
}

/// Generic party attributes accepted by the party PATCH
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stand_alone: Option<bool>,
}

/// Auto-reply sent to a ringing caller
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_with_text: Option<String>,
    /// Predefined reply pattern, e.g. `{"pattern": "WillCallYouBack", "time": 10, "timeUnit": "Minute"}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_with_pattern: Option<serde_json::Value>,
}

impl ReplyParams {
    pub fn text(text: impl Into<String>) -> Self {
        Self { reply_with_text: Some(text.into()), ..Default::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SuperviseMode {
    #[default]
    Listen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperviseParams {
    pub mode: SuperviseMode,
    pub device_id: String,
    pub extension_number: String,
}

impl SuperviseParams {
    pub fn listen(device_id: impl Into<String>, extension_number: impl Into<String>) -> Self {
        Self {
            mode: SuperviseMode::Listen,
            device_id: device_id.into(),
            extension_number: extension_number.into(),
        }
    }
}

/// Party of another session to pull into a conference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BringInParams {
    pub party_id: String,
    pub session_id: String,
}
