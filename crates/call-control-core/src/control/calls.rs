//! Call creation
//!
//! Both operations return the session from the response right away and
//! register it in the collection. Later notifications for the same id update
//! that object in place.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::manager::CallControl;
use crate::error::{CallControlError, CallControlResult};
use crate::events::CallControlEvent;
use crate::platform::ApiResponse;
use crate::session::{Session, SessionData};

/// Destination of an outbound call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallTarget {
    PhoneNumber(String),
    ExtensionNumber(String),
}

impl CallControl {
    /// Place a call from one of the extension's devices
    pub async fn create_call(&self, device_id: &str, target: CallTarget) -> CallControlResult<Arc<Session>> {
        let to = serde_json::to_value(&target)?;
        let body = json!({ "from": { "deviceId": device_id }, "to": to });
        let response = self.client.post(self.client.endpoints().call_out(), Some(body)).await?;
        let session = self.materialize(response)?;
        info!(session_id = %session.id(), device_id = %device_id, "Call created");
        Ok(session)
    }

    /// Start an empty conference; parties join with the voice call token
    pub async fn create_conference(&self) -> CallControlResult<Arc<Session>> {
        let response = self.client.post(self.client.endpoints().conference(), None).await?;
        let session = self.materialize(response)?;
        info!(session_id = %session.id(), "Conference created");
        Ok(session)
    }

    fn materialize(&self, response: ApiResponse) -> CallControlResult<Arc<Session>> {
        let raw = match response.body {
            Value::Object(mut body) => body
                .remove("session")
                .ok_or_else(|| CallControlError::invalid_response("missing session in response"))?,
            _ => return Err(CallControlError::invalid_response("expected a JSON object")),
        };
        let data = self.with_identity(SessionData::from_api(raw)?);
        let had_party = self.session(&data.id).map_or(false, |s| s.party().is_some());
        let session = self.upsert_session(data);
        if !had_party && session.party().is_some() {
            self.emit(CallControlEvent::NewSession(Arc::clone(&session)));
        }
        Ok(session)
    }
}
