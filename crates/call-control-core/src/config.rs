//! Call-control configuration
//!
//! [`CallControlConfig`] controls what the collection manager loads during
//! bootstrap and how it reaches the REST service. It can be built in code
//! with the `with_*` methods or deserialized from any serde format.
//!
//! ```rust
//! use call_control_core::CallControlConfig;
//!
//! let config = CallControlConfig::new()
//!     .with_preload_devices(false)
//!     .with_account_level(true)
//!     .with_user_agent("MyApp/1.0");
//!
//! assert!(config.preload_sessions);
//! assert!(!config.preload_devices);
//! assert!(config.account_level);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CallControlError, CallControlResult};
use crate::ids::{opt_string_or_number, string_or_number};

/// Root of every REST path unless overridden
pub const DEFAULT_API_PREFIX: &str = "/restapi/v1.0";

/// Buffer size of the broadcast channels
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Account reference inside extension info
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountRef {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// Identity of the observing extension
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub extension_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountRef>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExtensionInfo {
    pub fn new(id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            account: Some(AccountRef { id: account_id.into() }),
            ..Default::default()
        }
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallControlConfig {
    /// Load active sessions during bootstrap
    pub preload_sessions: bool,
    /// Load the extension's devices during bootstrap
    pub preload_devices: bool,
    /// Observe the whole account instead of one extension
    pub account_level: bool,
    /// Caller-supplied identity; skips the extension info request
    pub extension_info: Option<ExtensionInfo>,
    pub api_prefix: String,
    /// Sent as `X-User-Agent` on every request
    pub user_agent: Option<String>,
    pub event_channel_capacity: usize,
}

impl Default for CallControlConfig {
    fn default() -> Self {
        Self {
            preload_sessions: true,
            preload_devices: true,
            account_level: false,
            extension_info: None,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            user_agent: None,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl CallControlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preload_sessions(mut self, preload: bool) -> Self {
        self.preload_sessions = preload;
        self
    }

    pub fn with_preload_devices(mut self, preload: bool) -> Self {
        self.preload_devices = preload;
        self
    }

    pub fn with_account_level(mut self, account_level: bool) -> Self {
        self.account_level = account_level;
        self
    }

    pub fn with_extension_info(mut self, info: ExtensionInfo) -> Self {
        self.extension_info = Some(info);
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    pub fn validate(&self) -> CallControlResult<()> {
        if self.api_prefix.is_empty() || !self.api_prefix.starts_with('/') {
            return Err(CallControlError::invalid_configuration(
                "api_prefix",
                "must be a non-empty path starting with '/'",
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(CallControlError::invalid_configuration(
                "event_channel_capacity",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CallControlConfig::default();
        assert!(config.preload_sessions);
        assert!(config.preload_devices);
        assert!(!config.account_level);
        assert_eq!(config.api_prefix, "/restapi/v1.0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_prefix() {
        let config = CallControlConfig::new().with_api_prefix("restapi");
        assert!(matches!(
            config.validate(),
            Err(CallControlError::InvalidConfiguration { .. })
        ));
        let config = CallControlConfig::new().with_event_channel_capacity(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: CallControlConfig =
            serde_json::from_str(r#"{"account_level": true, "preload_devices": false}"#).unwrap();
        assert!(config.account_level);
        assert!(!config.preload_devices);
        assert!(config.preload_sessions);
        assert_eq!(config.event_channel_capacity, DEFAULT_EVENT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_extension_info_from_api_shape() {
        let info: ExtensionInfo = serde_json::from_str(
            r#"{"id": 170848004, "extensionNumber": "101", "account": {"id": 170848004}, "status": "Enabled"}"#,
        )
        .unwrap();
        assert_eq!(info.id, "170848004");
        assert_eq!(info.account_id(), Some("170848004"));
        assert!(info.extra.contains_key("status"));
    }
}
