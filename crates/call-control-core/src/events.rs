//! Events emitted by sessions and by the collection manager
//!
//! Two channels exist:
//!
//! - **Collection events** ([`CallControlEvent`]) - `Initialized` once bootstrap
//!   finishes and `NewSession` whenever a session enters the set of calls that
//!   have a party belonging to the observer.
//! - **Session events** ([`SessionEvent`]) - one per changed party field,
//!   tagged with a [`PartyField`]. New parties and status changes are tagged
//!   [`PartyField::Status`].
//!
//! Both are delivered on `tokio::sync::broadcast` channels in mutation order.
//! In-process listeners that must react inside the mutation (before the next
//! notification is handled) implement [`SessionObserver`] instead.
//!
//! ```rust,no_run
//! # use call_control_core::{CallControl, CallControlEvent, PartyField};
//! # async fn example(control: CallControl) {
//! let mut events = control.subscribe_events();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let CallControlEvent::NewSession(session) = event {
//!             let mut updates = session.subscribe();
//!             tokio::spawn(async move {
//!                 while let Ok(update) = updates.recv().await {
//!                     if update.field == PartyField::Status {
//!                         println!("{} -> {:?}", update.party.id, update.party.status_code());
//!                     }
//!                 }
//!             });
//!         }
//!     }
//! });
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::party::Party;
use crate::session::Session;

/// Party field a change event refers to, named after the wire key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartyField {
    Status,
    Muted,
    Recordings,
    StandAlone,
    MissedCall,
    Direction,
    To,
    From,
    ConferenceRole,
    RingOutRole,
    RingMeRole,
    Park,
    ExtensionId,
    AccountId,
    /// Any other key the service sent
    Other(String),
}

impl PartyField {
    pub fn from_key(key: &str) -> Self {
        match key {
            "status" => PartyField::Status,
            "muted" => PartyField::Muted,
            "recordings" => PartyField::Recordings,
            "standAlone" => PartyField::StandAlone,
            "missedCall" => PartyField::MissedCall,
            "direction" => PartyField::Direction,
            "to" => PartyField::To,
            "from" => PartyField::From,
            "conferenceRole" => PartyField::ConferenceRole,
            "ringOutRole" => PartyField::RingOutRole,
            "ringMeRole" => PartyField::RingMeRole,
            "park" => PartyField::Park,
            "extensionId" => PartyField::ExtensionId,
            "accountId" => PartyField::AccountId,
            other => PartyField::Other(other.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            PartyField::Status => "status",
            PartyField::Muted => "muted",
            PartyField::Recordings => "recordings",
            PartyField::StandAlone => "standAlone",
            PartyField::MissedCall => "missedCall",
            PartyField::Direction => "direction",
            PartyField::To => "to",
            PartyField::From => "from",
            PartyField::ConferenceRole => "conferenceRole",
            PartyField::RingOutRole => "ringOutRole",
            PartyField::RingMeRole => "ringMeRole",
            PartyField::Park => "park",
            PartyField::ExtensionId => "extensionId",
            PartyField::AccountId => "accountId",
            PartyField::Other(key) => key,
        }
    }
}

impl fmt::Display for PartyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A change to one party of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub session_id: String,
    pub field: PartyField,
    /// Party state after the change
    pub party: Party,
}

impl SessionEvent {
    pub fn new(session_id: impl Into<String>, field: PartyField, party: Party) -> Self {
        Self { session_id: session_id.into(), field, party }
    }

    pub fn status(session_id: impl Into<String>, party: Party) -> Self {
        Self::new(session_id, PartyField::Status, party)
    }
}

/// Synchronous session listener
///
/// Called after the session state has been updated and with no session lock
/// held, so implementations may read the session. Keep them short: they run
/// inside notification handling.
pub trait SessionObserver: Send + Sync {
    fn on_session_event(&self, session: &Session, event: &SessionEvent);
}

/// Events emitted by the collection manager
#[derive(Debug, Clone)]
pub enum CallControlEvent {
    /// Bootstrap finished; the manager can be queried
    Initialized,
    /// A session gained a party belonging to the observer
    NewSession(Arc<Session>),
}
