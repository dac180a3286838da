//! chain-events is a chain-agnostic event listener and normalization library.
//!
//! It subscribes to new activity on a blockchain-style data source, decodes
//! and enriches raw chain-specific records into a canonical [`ChainEvent`],
//! recovers events missed while offline by reading current chain storage,
//! and delivers everything, in order, through an ordered chain of
//! [`EventHandler`] consumers.
//!
//! The main entry point is [`Listener`], built via [`ListenerBuilder`] for a
//! concrete [`ChainFamily`]. Two families ship in-tree: [`chains::substrate`]
//! (runtime-event governance: democracy, preimages, treasury, collectives)
//! and [`chains::aave`] (EVM governance-module logs).
//!
//! # Roles
//!
//! Each family plugs in through three collaborators the listener drives:
//!
//! - [`Subscriber`] owns the live push feed,
//! - [`Processor`] turns raw records into canonical events,
//! - [`StorageFetcher`] reconstructs missed events from current storage.
//!
//! The RPC transport itself is out of scope: families receive an injected
//! API trait object, produced by an [`ApiConnector`] carried in the family
//! config.
//!
//! # Ordering and duplicates
//!
//! Events are delivered in feed order, one record at a time. When a
//! recovered range overlaps the live feed the same event can be delivered
//! once by each path, so consumers must be idempotent. The listener's
//! high-water mark ([`Listener::last_block_number`]) only ever advances on
//! live records.
//!
//! # Handler failures
//!
//! Handlers run in registration order, each receiving the previous
//! handler's output. A failing handler is logged and the remaining handlers
//! are skipped for that event only; delivery continues with the next event.

mod error;
mod handler;
mod interfaces;
mod listener;
mod types;

pub mod chains;

pub use error::{ApiError, HandlerError, ListenerError};
pub use handler::HandlerChain;
pub use interfaces::{
    ApiConnector, ChainFamily, DiscoverReconnectRange, EventHandler, Processor, StorageFetcher,
    Subscriber,
};
pub use listener::{Listener, ListenerBuilder};
pub use types::{ChainEvent, DisconnectedRange, EventData, Lifecycle, RawRecord};
