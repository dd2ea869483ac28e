//! Telephony session entity
//!
//! A [`Session`] owns the locally reconciled state of one call: its parties,
//! session metadata, and a per-party table of the last notification sequence
//! applied. It resolves which party belongs to the observer ("my party"),
//! merges incoming snapshots with [`Session::on_updated`], and exposes the
//! call-control operations (see `controls.rs`).
//!
//! # Reconciliation
//!
//! ```text
//! notification ──► diff_parties(held, incoming)
//!                    │
//!                    ├─ New     → append, emit `status`
//!                    └─ Update  → sequence <= last applied for party? drop
//!                                 else merge fields, emit one event per key
//!                  record max(sequence) for every party in the update
//! ```
//!
//! Sequence tracking is per party: parties of the same session progress
//! independently and notifications for one must not gate another.
//!
//! All mutation happens under a short write lock; events are dispatched
//! after the lock is released, in mutation order.

mod controls;
mod data;
mod diff;
mod params;

pub use data::{SessionData, SessionOrigin};
pub use diff::{diff_fields, diff_parties, merge_party, shallow_equal, PartyDiff};
pub use params::{
    BringInParams, FlipParams, ForwardParams, PartyParams, ReplyParams, SuperviseMode,
    SuperviseParams, TransferParams,
};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::config::DEFAULT_EVENT_CHANNEL_CAPACITY;
use crate::events::{PartyField, SessionEvent, SessionObserver};
use crate::party::{Party, Recording, REASON_PICKUP};
use crate::platform::PlatformClient;

/// Shared dependencies handed to every session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub client: Arc<PlatformClient>,
    /// Resolve "my party" by account id instead of extension id
    pub account_level: bool,
    pub event_capacity: usize,
}

impl SessionContext {
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self { client, account_level: false, event_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY }
    }

    pub fn with_account_level(mut self, account_level: bool) -> Self {
        self.account_level = account_level;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

/// Incoming partial snapshot of a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    /// Normalized parties
    pub parties: Vec<Party>,
    /// Notification sequence; `None` bypasses staleness checks
    pub sequence: Option<u64>,
    pub session_id: Option<String>,
    pub server_id: Option<String>,
    pub origin: Option<SessionOrigin>,
}

impl SessionUpdate {
    pub fn new(parties: Vec<Party>, sequence: Option<u64>) -> Self {
        Self { parties, sequence, ..Default::default() }
    }
}

struct SessionState {
    data: SessionData,
    /// Last applied notification sequence per party id
    party_sequences: HashMap<String, u64>,
}

pub struct Session {
    id: String,
    state: RwLock<SessionState>,
    context: SessionContext,
    event_tx: broadcast::Sender<SessionEvent>,
    observers: RwLock<Vec<(Uuid, Arc<dyn SessionObserver>)>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("account_level", &self.context.account_level)
            .field("parties", &state.data.parties.len())
            .field("observers", &self.observers.read().len())
            .finish()
    }
}

impl Session {
    pub fn new(data: SessionData, context: SessionContext) -> Self {
        let (event_tx, _) = broadcast::channel(context.event_capacity.max(1));
        Self {
            id: data.id.clone(),
            state: RwLock::new(SessionState { data, party_sequences: HashMap::new() }),
            context,
            event_tx,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Seed the sequence table with the notification that created the session
    pub fn with_sequence(self, sequence: Option<u64>) -> Self {
        if let Some(sequence) = sequence {
            let mut state = self.state.write();
            let ids: Vec<String> = state.data.parties.iter().map(|p| p.id.clone()).collect();
            for id in ids {
                state.party_sequences.insert(id, sequence);
            }
        }
        self
    }

    // ===== ACCESSORS =====

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn account_id(&self) -> Option<String> {
        self.state.read().data.account_id.clone()
    }

    pub fn extension_id(&self) -> Option<String> {
        self.state.read().data.extension_id.clone()
    }

    pub fn account_level(&self) -> bool {
        self.context.account_level
    }

    pub fn parties(&self) -> Vec<Party> {
        self.state.read().data.parties.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.state.read().data.session_id.clone()
    }

    pub fn voice_call_token(&self) -> Option<String> {
        self.state.read().data.voice_call_token.clone()
    }

    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.state.read().data.creation_time
    }

    pub fn origin(&self) -> Option<SessionOrigin> {
        self.state.read().data.origin.clone()
    }

    pub fn server_id(&self) -> Option<String> {
        self.state.read().data.server_id.clone()
    }

    /// Snapshot of the full session state, suitable for persisting
    pub fn data(&self) -> SessionData {
        self.state.read().data.clone()
    }

    /// Last applied sequence for a party, if any notification touched it
    pub fn party_sequence(&self, party_id: &str) -> Option<u64> {
        self.state.read().party_sequences.get(party_id).copied()
    }

    // ===== IDENTITY =====

    /// True when the party belongs to the observing identity
    pub fn is_mine(&self, party: &Party) -> bool {
        let state = self.state.read();
        owned_by_observer(&state.data, self.context.account_level, party)
    }

    /// The observer's party in this session
    ///
    /// With several candidates (pickup or call switch in progress) the most
    /// recently added one that is not disconnected wins; if all are
    /// disconnected the last one is returned.
    pub fn party(&self) -> Option<Party> {
        let state = self.state.read();
        resolve_my_party(&state.data, self.context.account_level).cloned()
    }

    /// Every party except "my party"
    pub fn other_parties(&self) -> Vec<Party> {
        let state = self.state.read();
        let mine = resolve_my_party(&state.data, self.context.account_level).map(|p| p.id.clone());
        state
            .data
            .parties
            .iter()
            .filter(|p| Some(&p.id) != mine.as_ref())
            .cloned()
            .collect()
    }

    /// Recordings attached to "my party"
    pub fn recordings(&self) -> Vec<Recording> {
        self.party().map(|p| p.recordings().to_vec()).unwrap_or_default()
    }

    // ===== SUBSCRIPTIONS =====

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn add_observer(&self, observer: Arc<dyn SessionObserver>) -> Uuid {
        let id = Uuid::new_v4();
        self.observers.write().push((id, observer));
        id
    }

    pub fn remove_observer(&self, id: Uuid) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    // ===== RECONCILIATION =====

    /// Merge an incoming partial snapshot into held state
    pub fn on_updated(&self, update: SessionUpdate) {
        let mut events = Vec::new();
        {
            let mut state = self.state.write();
            let SessionState { data, party_sequences } = &mut *state;

            if data.session_id.is_none() {
                data.session_id = update.session_id.clone();
            }
            if data.server_id.is_none() {
                data.server_id = update.server_id.clone();
            }
            if data.origin.is_none() {
                data.origin = update.origin.clone();
            }

            for diff in diff_parties(&data.parties, &update.parties) {
                match diff {
                    PartyDiff::New(party) => {
                        debug!(session_id = %self.id, party_id = %party.id, "New party in session");
                        data.parties.push(party.clone());
                        events.push(SessionEvent::status(&self.id, party));
                    }
                    PartyDiff::Update { party, changed } => {
                        if let (Some(incoming), Some(applied)) =
                            (update.sequence, party_sequences.get(&party.id))
                        {
                            if incoming <= *applied {
                                debug!(
                                    session_id = %self.id,
                                    party_id = %party.id,
                                    sequence = incoming,
                                    last_applied = *applied,
                                    "Dropping stale party update"
                                );
                                continue;
                            }
                        }
                        let Some(index) = data.parties.iter().position(|p| p.id == party.id) else {
                            continue;
                        };
                        let merged = match merge_party(&data.parties[index], &party) {
                            Ok(merged) => merged,
                            Err(e) => {
                                warn!(session_id = %self.id, party_id = %party.id, error = %e, "Failed to merge party update");
                                continue;
                            }
                        };
                        data.parties[index] = merged.clone();
                        for key in changed {
                            events.push(SessionEvent::new(&self.id, PartyField::from_key(&key), merged.clone()));
                        }
                    }
                }
            }

            if let Some(sequence) = update.sequence {
                for party in &update.parties {
                    let entry = party_sequences.entry(party.id.clone()).or_insert(sequence);
                    *entry = (*entry).max(sequence);
                }
            }
        }
        self.dispatch(events);
    }

    /// Replace the whole session state in place, keeping listeners attached
    pub fn restore(&self, data: SessionData) {
        let mut state = self.state.write();
        trace!(session_id = %self.id, parties = data.parties.len(), "Restoring session data");
        state.data = SessionData { id: self.id.clone(), ..data };
    }

    /// Insert or replace a party by id with a representation from a
    /// call-control response. Returns the keys that changed.
    pub(crate) fn upsert_party(&self, party: Party) -> Vec<String> {
        let mut state = self.state.write();
        match state.data.parties.iter().position(|p| p.id == party.id) {
            Some(index) => {
                let changed = diff_fields(
                    &diff::party_fields(&state.data.parties[index]),
                    &diff::party_fields(&party),
                );
                state.data.parties[index] = party;
                changed
            }
            None => {
                state.data.parties.push(party);
                vec![PartyField::Status.key().to_string()]
            }
        }
    }

    /// Apply `f` to "my party" in place and return the result
    pub(crate) fn update_my_party<F>(&self, f: F) -> Option<Party>
    where
        F: FnOnce(&mut Party),
    {
        let mut state = self.state.write();
        let account_level = self.context.account_level;
        let id = resolve_my_party(&state.data, account_level)?.id.clone();
        let party = state.data.parties.iter_mut().find(|p| p.id == id)?;
        f(party);
        Some(party.clone())
    }

    pub(crate) fn replace_data(&self, data: SessionData) {
        self.state.write().data = data;
    }

    pub(crate) fn dispatch(&self, events: Vec<SessionEvent>) {
        for event in events {
            if event.field == PartyField::Status {
                self.prune_pickup(&event.party);
            }
            // No receivers is fine
            let _ = self.event_tx.send(event.clone());

            let observers: Vec<Arc<dyn SessionObserver>> =
                self.observers.read().iter().map(|(_, o)| Arc::clone(o)).collect();
            for observer in observers {
                observer.on_session_event(self, &event);
            }
        }
    }

    /// A pickup hands the call to another of our endpoints; the old party
    /// is dropped instead of being kept as a dead record.
    fn prune_pickup(&self, party: &Party) {
        if !party.is_disconnected() || party.status_reason() != Some(REASON_PICKUP) {
            return;
        }
        let mut state = self.state.write();
        if !owned_by_observer(&state.data, self.context.account_level, party) {
            return;
        }
        let before = state.data.parties.len();
        state.data.parties.retain(|p| p.id != party.id);
        if state.data.parties.len() != before {
            debug!(session_id = %self.id, party_id = %party.id, "Removed party handed off by pickup");
        }
    }
}

fn observer_identity(data: &SessionData, account_level: bool) -> Option<&str> {
    if account_level {
        data.account_id.as_deref()
    } else {
        data.extension_id.as_deref()
    }
}

fn owned_by_observer(data: &SessionData, account_level: bool, party: &Party) -> bool {
    let Some(identity) = observer_identity(data, account_level) else {
        return false;
    };
    let owner = if account_level { party.account_id.as_deref() } else { party.extension_id.as_deref() };
    owner == Some(identity)
}

fn resolve_my_party(data: &SessionData, account_level: bool) -> Option<&Party> {
    let mine: Vec<&Party> = data
        .parties
        .iter()
        .filter(|p| owned_by_observer(data, account_level, p))
        .collect();
    match mine.as_slice() {
        [] => None,
        [only] => Some(*only),
        several => several
            .iter()
            .rev()
            .find(|p| !p.is_disconnected())
            .or_else(|| several.last())
            .copied(),
    }
}
