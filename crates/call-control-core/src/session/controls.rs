//! Call-control operations on a session
//!
//! Every operation is one REST request. Party-scoped operations act on
//! "my party" and fail with [`CallControlError::NoActiveParty`] when the
//! session has none. Transport and API failures are returned as-is; nothing
//! here retries.
//!
//! Responses carrying a party are normalized and merged into held state by
//! id before the matching event is emitted. `forward`, `transfer` and
//! `park` move the call away from the observer, so their result is handed
//! back without touching held state.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::params::{
    BringInParams, FlipParams, ForwardParams, PartyParams, ReplyParams, SuperviseParams,
    TransferParams,
};
use super::{Session, SessionData};
use crate::error::{CallControlError, CallControlResult};
use crate::events::{PartyField, SessionEvent};
use crate::party::{format_party, Party, RawParty, Recording};
use crate::platform::ApiResponse;

fn to_body<T: serde::Serialize>(params: &T) -> CallControlResult<Value> {
    Ok(serde_json::to_value(params)?)
}

fn decode_party(response: &ApiResponse) -> CallControlResult<Party> {
    Ok(format_party(response.json::<RawParty>()?))
}

impl Session {
    fn my_party_id(&self) -> CallControlResult<String> {
        self.party()
            .map(|p| p.id)
            .ok_or_else(|| CallControlError::NoActiveParty { session_id: self.id.clone() })
    }

    fn party_action_path(&self, party_id: &str, action: &str) -> String {
        self.context.client.endpoints().party_action(&self.id, party_id, action)
    }

    /// Merge a party from a response and emit either `field` or one event per
    /// changed key
    fn apply_party(&self, party: Party, field: Option<PartyField>) -> Party {
        let changed = self.upsert_party(party.clone());
        let events = match field {
            Some(field) => vec![SessionEvent::new(&self.id, field, party.clone())],
            None => changed
                .iter()
                .map(|key| SessionEvent::new(&self.id, PartyField::from_key(key), party.clone()))
                .collect(),
        };
        self.dispatch(events);
        party
    }

    // ===== SESSION-LEVEL OPERATIONS =====

    /// Replace the whole session with a fresh fetch
    ///
    /// Observer identity is kept; party sequence history is kept too so that
    /// a notification older than the reload is still rejected.
    pub async fn reload(&self) -> CallControlResult<()> {
        let path = self.context.client.endpoints().session(&self.id);
        let response = self.context.client.get(path).await?;
        let fresh = SessionData::from_api(response.body)?;
        let current = self.data();
        let data = SessionData {
            id: self.id.clone(),
            extension_id: current.extension_id,
            account_id: current.account_id,
            creation_time: fresh.creation_time.or(current.creation_time),
            ..fresh
        };
        debug!(session_id = %self.id, parties = data.parties.len(), "Reloaded session");
        self.replace_data(data);
        Ok(())
    }

    /// Terminate the whole call
    ///
    /// Held state is left alone; the disconnect notifications that follow
    /// drive eviction.
    pub async fn drop_call(&self) -> CallControlResult<()> {
        let path = self.context.client.endpoints().session(&self.id);
        self.context.client.delete(path).await?;
        info!(session_id = %self.id, "Session dropped");
        Ok(())
    }

    pub async fn supervise(&self, params: SuperviseParams) -> CallControlResult<Value> {
        let path = self.context.client.endpoints().supervise(&self.id);
        let response = self.context.client.post(path, Some(to_body(&params)?)).await?;
        Ok(response.body)
    }

    /// Pull a party of another session into this conference
    pub async fn bring_in_party(&self, params: BringInParams) -> CallControlResult<Value> {
        let path = self.context.client.endpoints().bring_in(&self.id);
        let response = self.context.client.post(path, Some(to_body(&params)?)).await?;
        Ok(response.body)
    }

    pub async fn remove_party(&self, party_id: &str) -> CallControlResult<()> {
        let path = self.context.client.endpoints().party(&self.id, party_id);
        self.context.client.delete(path).await?;
        Ok(())
    }

    // ===== PARTY OPERATIONS =====

    pub async fn hold(&self) -> CallControlResult<Party> {
        let party_id = self.my_party_id()?;
        let response = self.context.client.post(self.party_action_path(&party_id, "hold"), None).await?;
        Ok(self.apply_party(decode_party(&response)?, Some(PartyField::Status)))
    }

    pub async fn unhold(&self) -> CallControlResult<Party> {
        let party_id = self.my_party_id()?;
        let response = self.context.client.post(self.party_action_path(&party_id, "unhold"), None).await?;
        Ok(self.apply_party(decode_party(&response)?, Some(PartyField::Status)))
    }

    /// Send a ringing inbound call to voicemail
    pub async fn to_voicemail(&self) -> CallControlResult<()> {
        let party_id = self.my_party_id()?;
        self.context.client.post(self.party_action_path(&party_id, "reject"), None).await?;
        Ok(())
    }

    /// Stop ringing on one device without rejecting the call
    pub async fn ignore(&self, device_id: &str) -> CallControlResult<()> {
        let party_id = self.my_party_id()?;
        let body = json!({ "deviceId": device_id });
        self.context.client.post(self.party_action_path(&party_id, "ignore"), Some(body)).await?;
        Ok(())
    }

    /// Answer on a specific device
    pub async fn answer(&self, device_id: &str) -> CallControlResult<()> {
        let party_id = self.my_party_id()?;
        let body = json!({ "deviceId": device_id });
        self.context.client.post(self.party_action_path(&party_id, "answer"), Some(body)).await?;
        Ok(())
    }

    pub async fn reply(&self, params: ReplyParams) -> CallControlResult<Party> {
        let party_id = self.my_party_id()?;
        let path = self.party_action_path(&party_id, "reply");
        let response = self.context.client.post(path, Some(to_body(&params)?)).await?;
        Ok(self.apply_party(decode_party(&response)?, Some(PartyField::Status)))
    }

    pub async fn forward(&self, params: ForwardParams) -> CallControlResult<Party> {
        let party_id = self.my_party_id()?;
        let path = self.party_action_path(&party_id, "forward");
        let response = self.context.client.post(path, Some(to_body(&params)?)).await?;
        decode_party(&response)
    }

    pub async fn transfer(&self, params: TransferParams) -> CallControlResult<Party> {
        let party_id = self.my_party_id()?;
        let path = self.party_action_path(&party_id, "transfer");
        let response = self.context.client.post(path, Some(to_body(&params)?)).await?;
        decode_party(&response)
    }

    /// Park the call; the returned party's `park` holds the orbit
    pub async fn park(&self) -> CallControlResult<Party> {
        let party_id = self.my_party_id()?;
        let response = self.context.client.post(self.party_action_path(&party_id, "park"), None).await?;
        decode_party(&response)
    }

    /// Move the call to another device by call-flip number
    pub async fn flip(&self, params: FlipParams) -> CallControlResult<Value> {
        let party_id = self.my_party_id()?;
        let path = self.party_action_path(&party_id, "flip");
        let response = self.context.client.post(path, Some(to_body(&params)?)).await?;
        Ok(response.body)
    }

    /// PATCH "my party" and emit one event per field that changed
    pub async fn update_party(&self, params: PartyParams) -> CallControlResult<Party> {
        let party = self.patch_party(&params).await?;
        Ok(self.apply_party(party, None))
    }

    pub async fn mute(&self) -> CallControlResult<Party> {
        self.set_muted(true).await
    }

    pub async fn unmute(&self) -> CallControlResult<Party> {
        self.set_muted(false).await
    }

    async fn set_muted(&self, muted: bool) -> CallControlResult<Party> {
        let params = PartyParams { muted: Some(muted), ..Default::default() };
        let party = self.patch_party(&params).await?;
        Ok(self.apply_party(party, Some(PartyField::Muted)))
    }

    async fn patch_party(&self, params: &PartyParams) -> CallControlResult<Party> {
        let party_id = self.my_party_id()?;
        let path = self.context.client.endpoints().party(&self.id, &party_id);
        let response = self.context.client.patch(path, to_body(params)?).await?;
        decode_party(&response)
    }

    // ===== RECORDINGS =====

    /// Start recording "my party"
    pub async fn create_record(&self) -> CallControlResult<Recording> {
        let party_id = self.my_party_id()?;
        let path = self.context.client.endpoints().recordings(&self.id, &party_id);
        let response = self.context.client.post(path, None).await?;
        let recording: Recording = response.json()?;
        self.merge_recording(recording.clone());
        Ok(recording)
    }

    /// Switch an existing recording on or off
    ///
    /// The service may answer without a body; the requested state is
    /// assumed in that case.
    pub async fn update_record(&self, recording_id: &str, active: bool) -> CallControlResult<Recording> {
        let party_id = self.my_party_id()?;
        let path = self.context.client.endpoints().recording(&self.id, &party_id, recording_id);
        let response = self.context.client.patch(path, json!({ "active": active })).await?;
        let recording = Recording {
            id: response
                .body
                .get("id")
                .and_then(|id| match id {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .unwrap_or_else(|| recording_id.to_string()),
            active: response.body.get("active").and_then(Value::as_bool).unwrap_or(active),
        };
        self.merge_recording(recording.clone());
        Ok(recording)
    }

    pub async fn pause_record(&self, recording_id: &str) -> CallControlResult<Recording> {
        self.update_record(recording_id, false).await
    }

    pub async fn resume_record(&self, recording_id: &str) -> CallControlResult<Recording> {
        self.update_record(recording_id, true).await
    }

    fn merge_recording(&self, recording: Recording) {
        let updated = self.update_my_party(|party| {
            let recordings = party.recordings.get_or_insert_with(Vec::new);
            match recordings.iter_mut().find(|r| r.id == recording.id) {
                Some(existing) => *existing = recording.clone(),
                None => recordings.push(recording.clone()),
            }
        });
        match updated {
            Some(party) => self.dispatch(vec![SessionEvent::new(&self.id, PartyField::Recordings, party)]),
            None => warn!(
                session_id = %self.id,
                recording_id = %recording.id,
                "Party left the session before the recording response arrived"
            ),
        }
    }
}
