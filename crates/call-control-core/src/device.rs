//! Devices registered to the observing extension

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::string_or_number;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `SoftPhone`, `HardPhone`, `WebPhone`, `OtherPhone`, ...
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    pub fn is_online(&self) -> bool {
        self.status.as_deref() == Some("Online")
    }
}

/// `GET .../device` response
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DeviceList {
    #[serde(default)]
    pub records: Vec<Device>,
}
