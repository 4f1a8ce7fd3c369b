//! Broadcast Hub
//!
//! Fans every ingested record out to all connected viewers.
//!
//! ## Architecture
//!
//! - **BroadcastHub**: owns the subscriber registry and the fan-out loop
//! - **Subscription**: a viewer's bounded queue; dropping it unregisters
//! - **Record**: the shared, immutable unit delivered to viewers
//!
//! ## Delivery contract
//!
//! Each subscriber gets a fixed-capacity queue. [`BroadcastHub::broadcast`]
//! never waits: when a queue is full the record is dropped for that
//! subscriber only, so one slow viewer cannot stall ingestion or the others.
//! A subscriber only sees records broadcast after it subscribed, in
//! broadcast order, each at most once.
//!
//! ## Example
//!
//! ```rust
//! use leno::hub::{BroadcastHub, HubConfig, Record};
//!
//! let hub = BroadcastHub::new(HubConfig::default());
//! let mut subscription = hub.subscribe();
//!
//! hub.broadcast(&Record::from("level=info msg=hello"));
//!
//! assert_eq!(subscription.try_recv().unwrap().as_str(), "level=info msg=hello");
//! ```

mod broadcast;
mod record;
mod subscription;

pub use broadcast::{BroadcastHub, HubConfig, HubStats};
pub use record::Record;
pub use subscription::{SubscriberId, Subscription};
