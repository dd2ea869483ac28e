//! Notification routing and snapshot restore

use std::collections::HashSet;

use tracing::{debug, info, trace};

use super::manager::CallControl;
use crate::events::CallControlEvent;
use crate::notification::NotificationMessage;
use crate::session::SessionData;

impl CallControl {
    /// Apply one message from the notification feed
    ///
    /// Messages for other topics, or without a telephony session id, are
    /// ignored. A session is never created from an event in which every
    /// party is already disconnected.
    pub fn on_notification_event(&self, message: &NotificationMessage) {
        let Some(event) = message.telephony_session_event() else {
            trace!(topic = %message.event, "Ignoring notification");
            return;
        };
        let id = event.id().to_string();

        match self.session(&id) {
            Some(session) => {
                let had_party = session.party().is_some();
                trace!(session_id = %id, sequence = ?event.sequence, "Updating session");
                session.on_updated(event.to_update());
                if !had_party && session.party().is_some() && self.is_held(&session) {
                    debug!(session_id = %id, "Session gained a party of ours");
                    self.emit(CallControlEvent::NewSession(session));
                }
            }
            None => {
                let data = self.with_identity(event.to_session_data());
                if data.is_fully_disconnected() {
                    debug!(session_id = %id, "Ignoring event for a session that already ended");
                    return;
                }
                let session = self.register_session(data, event.sequence);
                if session.party().is_some() {
                    info!(session_id = %id, "New session");
                    self.emit(CallControlEvent::NewSession(session));
                }
            }
        }
    }

    /// Replace the collection with persisted snapshots
    ///
    /// Sessions already held keep their object, so subscribers stay attached;
    /// held sessions missing from `snapshots` are dropped. No events are
    /// emitted.
    pub fn restore_sessions(&self, snapshots: Vec<SessionData>) {
        let ids: HashSet<String> = snapshots.iter().map(|data| data.id.clone()).collect();
        for data in snapshots {
            match self.session(&data.id) {
                Some(existing) => existing.restore(data),
                None => {
                    self.register_session(data, None);
                }
            }
        }
        self.sessions.retain(|id, _| ids.contains(id));
        debug!(sessions = self.sessions.len(), "Restored sessions");
    }
}
