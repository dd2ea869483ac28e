//! The collection manager struct and its session bookkeeping

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::{broadcast, OnceCell};
use tracing::{debug, info};

use crate::config::{CallControlConfig, ExtensionInfo};
use crate::device::Device;
use crate::endpoints::Endpoints;
use crate::error::CallControlResult;
use crate::events::{CallControlEvent, PartyField, SessionEvent, SessionObserver};
use crate::platform::{Platform, PlatformClient};
use crate::session::{Session, SessionContext, SessionData};

pub(crate) type SessionMap = DashMap<String, Arc<Session>>;

/// Removes a session from the collection once "my party" is gone
///
/// Holds the map weakly so sessions kept alive by callers do not keep the
/// collection alive.
struct EvictionObserver {
    sessions: Weak<SessionMap>,
}

impl SessionObserver for EvictionObserver {
    fn on_session_event(&self, session: &Session, event: &SessionEvent) {
        if event.field != PartyField::Status {
            return;
        }
        let party = &event.party;
        if !party.is_disconnected() || party.is_handoff_disconnect() || !session.is_mine(party) {
            return;
        }
        // another party of ours may still be live
        if session.party().map_or(false, |mine| !mine.is_disconnected()) {
            return;
        }
        let Some(sessions) = self.sessions.upgrade() else {
            return;
        };
        let removed = sessions.remove_if(session.id(), |_, held| std::ptr::eq(Arc::as_ptr(held), session));
        if removed.is_some() {
            info!(session_id = %session.id(), party_id = %party.id, "Session ended, removed from collection");
        }
    }
}

/// Collection of the observer's live telephony sessions
pub struct CallControl {
    pub(crate) config: CallControlConfig,
    pub(crate) client: Arc<PlatformClient>,
    pub(crate) sessions: Arc<SessionMap>,
    pub(crate) devices: RwLock<Vec<Device>>,
    pub(crate) identity: RwLock<Option<ExtensionInfo>>,
    pub(crate) init: OnceCell<()>,
    pub(crate) ready: AtomicBool,
    pub(crate) event_tx: broadcast::Sender<CallControlEvent>,
}

impl fmt::Debug for CallControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallControl")
            .field("ready", &self.ready())
            .field("account_level", &self.config.account_level)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

impl CallControl {
    pub fn new(platform: Arc<dyn Platform>, config: CallControlConfig) -> CallControlResult<Self> {
        config.validate()?;
        let client = PlatformClient::new(platform, Endpoints::new(config.api_prefix.clone()))
            .with_user_agent(config.user_agent.clone());
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);
        Ok(Self {
            identity: RwLock::new(config.extension_info.clone()),
            config,
            client: Arc::new(client),
            sessions: Arc::new(DashMap::new()),
            devices: RwLock::new(Vec::new()),
            init: OnceCell::new(),
            ready: AtomicBool::new(false),
            event_tx,
        })
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &CallControlConfig {
        &self.config
    }

    /// True once `initialize` has finished
    pub fn ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn account_level(&self) -> bool {
        self.config.account_level
    }

    pub fn extension_info(&self) -> Option<ExtensionInfo> {
        self.identity.read().clone()
    }

    pub fn extension_id(&self) -> Option<String> {
        self.identity.read().as_ref().map(|info| info.id.clone())
    }

    pub fn account_id(&self) -> Option<String> {
        self.identity.read().as_ref().and_then(|info| info.account_id().map(str::to_string))
    }

    /// Every live session, oldest first
    ///
    /// Includes sessions that have no party of ours yet.
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        let mut sessions: Vec<Arc<Session>> =
            self.sessions.iter().map(|entry| Arc::clone(entry.value())).collect();
        sessions.sort_by(|a, b| {
            a.creation_time()
                .cmp(&b.creation_time())
                .then_with(|| a.id().cmp(b.id()))
        });
        sessions
    }

    pub fn session(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions().iter().map(|s| s.id().to_string()).collect()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.devices.read().clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CallControlEvent> {
        self.event_tx.subscribe()
    }

    // ===== SESSION BOOKKEEPING =====

    pub(crate) fn session_context(&self) -> SessionContext {
        SessionContext::new(Arc::clone(&self.client))
            .with_account_level(self.config.account_level)
            .with_event_capacity(self.config.event_channel_capacity)
    }

    /// Attach the observer identity to session data
    pub(crate) fn with_identity(&self, data: SessionData) -> SessionData {
        data.with_identity(self.extension_id(), self.account_id())
    }

    /// Build a session, attach eviction and insert it
    pub(crate) fn register_session(&self, data: SessionData, sequence: Option<u64>) -> Arc<Session> {
        let session = Arc::new(Session::new(data, self.session_context()).with_sequence(sequence));
        session.add_observer(Arc::new(EvictionObserver { sessions: Arc::downgrade(&self.sessions) }));
        debug!(session_id = %session.id(), parties = session.parties().len(), "Registered session");
        self.sessions.insert(session.id().to_string(), Arc::clone(&session));
        session
    }

    /// Insert fresh data for `data.id`, reusing a held session object
    pub(crate) fn upsert_session(&self, data: SessionData) -> Arc<Session> {
        match self.session(&data.id) {
            Some(existing) => {
                existing.restore(data);
                existing
            }
            None => self.register_session(data, None),
        }
    }

    /// True when `session` is still the object held under its id
    pub(crate) fn is_held(&self, session: &Arc<Session>) -> bool {
        self.sessions
            .get(session.id())
            .map_or(false, |entry| Arc::ptr_eq(entry.value(), session))
    }

    pub(crate) fn emit(&self, event: CallControlEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }
}
