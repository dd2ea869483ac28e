//! Client-side telephony call-state reconciliation
//!
//! `call-control-core` keeps a local, event-driven model of the active phone
//! calls of one extension (or a whole account). It combines a snapshot loaded
//! over REST with a stream of notification events that may arrive late,
//! twice or out of order, and exposes call-control operations on each call.
//!
//! ```text
//!  notification feed ──► CallControl ──► Session ──► SessionEvent (per field)
//!                            │              │
//!  REST (dyn Platform) ◄─────┴──────────────┘
//! ```
//!
//! - [`CallControl`] owns the collection of [`Session`]s, bootstraps it and
//!   routes notifications.
//! - [`Session`] reconciles one call: party diffing, per-party sequence
//!   gating, "my party" resolution and the REST operations on the call.
//! - [`legs`] pairs the two sessions of a RingOut call.
//!
//! The crate does no HTTP itself. Applications provide a [`Platform`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use call_control_core::{CallControlBuilder, CallControlEvent, PartyField, Platform};
//! use std::sync::Arc;
//!
//! # async fn example(platform: Arc<dyn Platform>) -> Result<(), Box<dyn std::error::Error>> {
//! let control = CallControlBuilder::new().platform(platform).build()?;
//! let mut events = control.subscribe_events();
//! control.initialize().await;
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let CallControlEvent::NewSession(session) = event {
//!             let mut changes = session.subscribe();
//!             while let Ok(change) = changes.recv().await {
//!                 if change.field == PartyField::Status {
//!                     println!("{}: {:?}", change.party.id, change.party.status_code());
//!                 }
//!             }
//!         }
//!     }
//! });
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod control;
pub mod device;
pub mod endpoints;
pub mod error;
pub mod events;
pub mod legs;
pub mod notification;
pub mod party;
pub mod platform;
pub mod session;

mod ids;

pub use config::{AccountRef, CallControlConfig, ExtensionInfo};
pub use control::{CallControl, CallControlBuilder, CallTarget};
pub use device::Device;
pub use endpoints::Endpoints;
pub use error::{CallControlError, CallControlResult};
pub use events::{CallControlEvent, PartyField, SessionEvent, SessionObserver};
pub use notification::{NotificationMessage, TelephonySessionEvent};
pub use party::{
    format_party, ConferenceRole, Direction, ParkInfo, Party, PartyOwner, PartyStatus, PartyStatusCode,
    PartyToFrom, RawParty, Recording, RingRole,
};
pub use platform::{ApiRequest, ApiResponse, HttpMethod, Platform, PlatformClient};
pub use session::{
    BringInParams, FlipParams, ForwardParams, PartyParams, ReplyParams, Session, SessionContext,
    SessionData, SessionOrigin, SessionUpdate, SuperviseMode, SuperviseParams, TransferParams,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
