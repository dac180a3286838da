//! The role seams every chain family implements.
//!
//! A family splits its work across three collaborators: a [`Subscriber`]
//! that owns the live push feed, a [`Processor`] that turns raw records into
//! canonical [`ChainEvent`]s, and a [`StorageFetcher`] that reconstructs
//! events from chain storage for offline recovery. [`ChainFamily`] ties the
//! three together behind one factory so the listener can stay generic.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    error::{ApiError, HandlerError},
    types::{ChainEvent, DisconnectedRange, EventData, RawRecord},
};

/// Owns the live connection to a chain's push feed.
///
/// `subscribe` hands back the receiving half of a channel; the sending half
/// stays with whatever task pumps the feed. Dropping or closing the sender
/// ends the stream, which is how `unsubscribe` takes effect without
/// interrupting records already in flight.
#[async_trait]
pub trait Subscriber: Send {
    type Raw: RawRecord;

    async fn subscribe(&mut self) -> Result<mpsc::Receiver<Self::Raw>, ApiError>;

    /// Stops the feed. Idempotent; a no-op when nothing is active.
    fn unsubscribe(&mut self);
}

/// Turns one raw chain record into zero or more canonical events.
///
/// Processing is best-effort per record: entries that fail to decode or
/// enrich are logged and dropped, never surfaced as errors.
#[async_trait]
pub trait Processor: Send + Sync {
    type Raw: RawRecord;
    type Data: EventData;

    async fn process(&self, raw: Self::Raw) -> Vec<ChainEvent<Self::Data>>;
}

/// Reconstructs past events from current chain storage.
///
/// Storage reads see the *present* state, so reconstructed events carry the
/// block numbers storage can vouch for, not necessarily the heights the
/// originals were emitted at.
#[async_trait]
pub trait StorageFetcher: Send + Sync {
    type Data: EventData;

    /// Events for every entity whose storage-recorded origin falls inside
    /// `range` (normalized against the current head; `None` means
    /// everything). Results are sorted by block number ascending.
    async fn fetch(
        &self,
        range: Option<DisconnectedRange>,
        fetch_all_completed: bool,
    ) -> Result<Vec<ChainEvent<Self::Data>>, ApiError>;

    /// Events for a single entity, identified by its chain-level id.
    async fn fetch_one(
        &self,
        id: &str,
        entity: Option<<Self::Data as EventData>::Entity>,
    ) -> Result<Vec<ChainEvent<Self::Data>>, ApiError>;
}

/// Factory tying a family's collaborators to its API handle and config.
///
/// The listener is generic over this trait; adding a chain family means
/// implementing it once and never touching the listener.
#[async_trait]
pub trait ChainFamily: Send + Sync + 'static {
    /// The injected chain API handle the collaborators share.
    type Api: Clone + Send + Sync + 'static;
    /// Connection parameters for [`ChainFamily::connect`].
    type Config: Clone + Send + Sync + 'static;
    type Raw: RawRecord;
    type Data: EventData;
    type Subscriber: Subscriber<Raw = Self::Raw> + 'static;
    type Processor: Processor<Raw = Self::Raw, Data = Self::Data> + 'static;
    type Fetcher: StorageFetcher<Data = Self::Data> + 'static;

    /// Family label used in logs, e.g. `"substrate"`.
    const NETWORK: &'static str;

    async fn connect(config: &Self::Config) -> Result<Self::Api, ApiError>;

    fn subscriber(api: &Self::Api) -> Self::Subscriber;
    fn processor(api: &Self::Api) -> Self::Processor;
    fn storage_fetcher(api: &Self::Api) -> Self::Fetcher;
}

/// Injected factory for a family's API handle.
///
/// Families keep transport construction out of the core by carrying one of
/// these in their config; [`ChainFamily::connect`] delegates to it.
#[async_trait]
pub trait ApiConnector<A>: Send + Sync {
    async fn connect(&self) -> Result<A, ApiError>;
}

/// Asks the external persistence layer which blocks were missed.
///
/// Consulted once per recovery cycle, before the live feed opens. Returning
/// `None` skips recovery for this cycle.
#[async_trait]
pub trait DiscoverReconnectRange: Send + Sync {
    async fn discover(&self, chain: &str) -> Option<DisconnectedRange>;
}

/// A downstream consumer of canonical events.
///
/// Handlers run in registration order; each receives the previous handler's
/// output so a persistence handler can pass its stored row to a
/// notification handler behind it.
#[async_trait]
pub trait EventHandler<D: EventData>: Send + Sync {
    async fn handle(
        &self,
        event: &ChainEvent<D>,
        prev: Option<Value>,
    ) -> Result<Option<Value>, HandlerError>;

    /// Label used when logging this handler's failures.
    fn name(&self) -> &str;

    /// Event kinds this handler never sees. The chain skips it for matching
    /// events, passing the previous result through unchanged.
    fn excluded_events(&self) -> &[D::Kind] {
        &[]
    }
}
