//! Builder for the collection manager

use std::sync::Arc;

use crate::config::{CallControlConfig, ExtensionInfo};
use crate::control::CallControl;
use crate::error::{CallControlError, CallControlResult};
use crate::platform::Platform;

/// Fluent construction of a [`CallControl`]
#[derive(Default)]
pub struct CallControlBuilder {
    platform: Option<Arc<dyn Platform>>,
    config: CallControlConfig,
}

impl CallControlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport used for every REST request (required)
    pub fn platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: CallControlConfig) -> Self {
        self.config = config;
        self
    }

    pub fn preload_sessions(mut self, preload: bool) -> Self {
        self.config.preload_sessions = preload;
        self
    }

    pub fn preload_devices(mut self, preload: bool) -> Self {
        self.config.preload_devices = preload;
        self
    }

    pub fn account_level(mut self, account_level: bool) -> Self {
        self.config.account_level = account_level;
        self
    }

    /// Known identity; skips the extension info request
    pub fn extension_info(mut self, info: ExtensionInfo) -> Self {
        self.config.extension_info = Some(info);
        self
    }

    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.api_prefix = prefix.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.event_channel_capacity = capacity;
        self
    }

    pub fn build(self) -> CallControlResult<Arc<CallControl>> {
        let platform = self
            .platform
            .ok_or_else(|| CallControlError::invalid_configuration("platform", "a platform is required"))?;
        Ok(Arc::new(CallControl::new(platform, self.config)?))
    }
}
