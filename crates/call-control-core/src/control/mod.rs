//! Session collection manager
//!
//! [`CallControl`] owns every live [`Session`](crate::Session) of the
//! observing extension (or account), keeps them in step with the
//! notification feed, and exposes the operations that create new calls.
//!
//! # Architecture Overview
//!
//! ```text
//!                 initialize()                     on_notification_event()
//!                      │                                     │
//!       ┌──────────────▼──────────────┐        ┌─────────────▼─────────────┐
//!       │ bootstrap                   │        │ routing                   │
//!       │  extension info             │        │  unknown id → new Session │
//!       │  presence → session details │        │  known id   → on_updated  │
//!       │  devices                    │        └─────────────┬─────────────┘
//!       └──────────────┬──────────────┘                      │
//!                      │                                     │
//!              ┌───────▼─────────────────────────────────────▼───────┐
//!              │ sessions: DashMap<telephony session id, Session>    │
//!              └───────▲─────────────────────────────────────────────┘
//!                      │ evicts when "my party" disconnects
//!              ┌───────┴────────┐
//!              │ EvictionObserver│ (one per session)
//!              └────────────────┘
//! ```
//!
//! The sub-modules each add an `impl CallControl` block:
//!
//! - **`manager`** - the struct, accessors and session registration
//! - **`bootstrap`** - one-time initialization and device loading
//! - **`routing`** - notification handling and snapshot restore
//! - **`calls`** - call-out and conference creation
//! - **`builder`** - fluent construction
//!
//! # Usage
//!
//! ```rust,no_run
//! # use call_control_core::{CallControlBuilder, CallControlEvent, NotificationMessage, Platform};
//! # use std::sync::Arc;
//! # async fn example(platform: Arc<dyn Platform>, feed: Vec<NotificationMessage>) -> Result<(), Box<dyn std::error::Error>> {
//! let control = CallControlBuilder::new()
//!     .platform(platform)
//!     .user_agent("MyApp/1.0")
//!     .build()?;
//!
//! let mut events = control.subscribe_events();
//! control.initialize().await;
//! assert!(control.ready());
//!
//! for message in &feed {
//!     control.on_notification_event(message);
//! }
//!
//! while let Ok(CallControlEvent::NewSession(session)) = events.try_recv() {
//!     println!("new call {} with {} parties", session.id(), session.parties().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod calls;
pub mod manager;

mod bootstrap;
mod routing;

pub use builder::CallControlBuilder;
pub use calls::CallTarget;
pub use manager::CallControl;
