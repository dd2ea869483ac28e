//! One-time initialization
//!
//! Loads identity, preloads active sessions and the device list. Every
//! request failure here is logged and absorbed: the manager becomes ready
//! with whatever could be loaded.

use std::collections::HashSet;
use std::sync::atomic::Ordering;

use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use super::manager::CallControl;
use crate::config::ExtensionInfo;
use crate::device::{Device, DeviceList};
use crate::error::CallControlResult;
use crate::events::CallControlEvent;
use crate::ids::opt_string_or_number;
use crate::session::SessionData;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveCall {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    telephony_session_id: Option<String>,
}

/// Presence of one extension
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Presence {
    #[serde(default)]
    active_calls: Vec<ActiveCall>,
}

/// Presence of every extension of the account
#[derive(Debug, Default, Deserialize)]
struct AccountPresence {
    #[serde(default)]
    records: Vec<Presence>,
}

impl CallControl {
    /// Bring the manager to the ready state
    ///
    /// Runs once. Concurrent and later calls wait for the first run to
    /// finish and then return immediately.
    pub async fn initialize(&self) {
        self.init.get_or_init(|| self.bootstrap()).await;
    }

    async fn bootstrap(&self) {
        if self.identity.read().is_none() {
            match self.load_extension_info().await {
                Ok(info) => {
                    debug!(extension_id = %info.id, "Loaded extension info");
                    *self.identity.write() = Some(info);
                }
                Err(e) => error!(error = %e, "Failed to load extension info"),
            }
        }

        if self.config.preload_sessions {
            self.preload_sessions().await;
        }

        if self.config.preload_devices {
            if let Err(e) = self.refresh_devices().await {
                error!(error = %e, "Failed to load devices");
            }
        }

        self.ready.store(true, Ordering::SeqCst);
        info!(
            sessions = self.sessions.len(),
            devices = self.devices.read().len(),
            "Call control initialized"
        );
        self.emit(CallControlEvent::Initialized);
    }

    async fn load_extension_info(&self) -> CallControlResult<ExtensionInfo> {
        let response = self.client.get(self.client.endpoints().extension_info()).await?;
        response.json()
    }

    /// Reload the device list of the observing extension
    pub async fn refresh_devices(&self) -> CallControlResult<Vec<Device>> {
        let response = self.client.get(self.client.endpoints().devices()).await?;
        let list: DeviceList = response.json()?;
        debug!(devices = list.records.len(), "Loaded devices");
        *self.devices.write() = list.records.clone();
        Ok(list.records)
    }

    async fn load_active_call_ids(&self) -> CallControlResult<Vec<String>> {
        let endpoints = self.client.endpoints();
        let active_calls = if self.config.account_level {
            let response = self.client.get(endpoints.account_presence()).await?;
            let presence: AccountPresence = response.json()?;
            presence.records.into_iter().flat_map(|r| r.active_calls).collect::<Vec<_>>()
        } else {
            let response = self.client.get(endpoints.extension_presence()).await?;
            let presence: Presence = response.json()?;
            presence.active_calls
        };

        let mut seen = HashSet::new();
        Ok(active_calls
            .into_iter()
            .filter_map(|call| call.telephony_session_id)
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }

    async fn load_session(&self, id: &str) -> CallControlResult<SessionData> {
        let response = self.client.get(self.client.endpoints().session(id)).await?;
        SessionData::from_api(response.body)
    }

    async fn preload_sessions(&self) {
        let ids = match self.load_active_call_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Failed to load presence");
                return;
            }
        };
        debug!(active_calls = ids.len(), "Loading active sessions");

        let results = join_all(ids.iter().map(|id| self.load_session(id))).await;
        for (id, result) in ids.iter().zip(results) {
            let data = match result {
                Ok(data) => self.with_identity(data),
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Failed to load session details");
                    continue;
                }
            };
            if data.is_fully_disconnected() {
                debug!(session_id = %id, "Skipping session with no live party");
                continue;
            }
            if self.sessions.contains_key(&data.id) {
                // a notification got there first
                continue;
            }
            self.register_session(data, None);
        }
    }
}
