//! The per-chain orchestrating state machine.
//!
//! A [`Listener`] wires one chain family's collaborators together: connect,
//! recover missed blocks through storage, then stream the live feed into the
//! handler chain from a spawned driver task. One listener per chain; a
//! multi-chain deployment runs several listeners side by side.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::{
    error::ListenerError,
    handler::HandlerChain,
    interfaces::{
        ChainFamily, DiscoverReconnectRange, EventHandler, Processor, StorageFetcher, Subscriber,
    },
    types::{EventData, RawRecord},
};

/// Builds a [`Listener`] for one chain.
#[must_use = "builders do nothing unless built"]
pub struct ListenerBuilder<C: ChainFamily> {
    chain: String,
    config: C::Config,
    handlers: HandlerChain<C::Data>,
    discover: Option<Arc<dyn DiscoverReconnectRange>>,
    skip_catchup: bool,
}

impl<C: ChainFamily> ListenerBuilder<C> {
    pub fn new(chain: impl Into<String>, config: C::Config) -> Self {
        Self {
            chain: chain.into(),
            config,
            handlers: HandlerChain::new(),
            discover: None,
            skip_catchup: false,
        }
    }

    /// Appends a downstream event handler. Dispatch order is registration
    /// order.
    pub fn handler(mut self, handler: Arc<dyn EventHandler<C::Data>>) -> Self {
        self.handlers.register(handler);
        self
    }

    /// Event kinds dropped before any handler runs.
    pub fn exclude_events(
        mut self,
        kinds: impl IntoIterator<Item = <C::Data as EventData>::Kind>,
    ) -> Self {
        self.handlers.exclude(kinds);
        self
    }

    /// Collaborator consulted for the missed-block range on each subscribe.
    /// Without one, recovery is skipped.
    pub fn discover_reconnect_range(mut self, discover: Arc<dyn DiscoverReconnectRange>) -> Self {
        self.discover = Some(discover);
        self
    }

    /// Skips offline recovery entirely; the listener goes straight to the
    /// live feed on subscribe.
    pub fn skip_catchup(mut self, skip: bool) -> Self {
        self.skip_catchup = skip;
        self
    }

    pub fn build(self) -> Listener<C> {
        Listener {
            chain: self.chain,
            config: self.config,
            handlers: self.handlers,
            discover: self.discover,
            skip_catchup: self.skip_catchup,
            subscriber: None,
            processor: None,
            fetcher: None,
            last_block: Arc::new(Mutex::new(None)),
            subscribed: false,
            driver: None,
        }
    }
}

/// The orchestrating state machine for one chain.
pub struct Listener<C: ChainFamily> {
    chain: String,
    config: C::Config,
    handlers: HandlerChain<C::Data>,
    discover: Option<Arc<dyn DiscoverReconnectRange>>,
    skip_catchup: bool,
    subscriber: Option<C::Subscriber>,
    processor: Option<Arc<C::Processor>>,
    fetcher: Option<Arc<C::Fetcher>>,
    /// Highest block number seen on the live feed. Recovery never moves it.
    last_block: Arc<Mutex<Option<u64>>>,
    subscribed: bool,
    driver: Option<JoinHandle<()>>,
}

impl<C: ChainFamily> Listener<C> {
    pub fn builder(chain: impl Into<String>, config: C::Config) -> ListenerBuilder<C> {
        ListenerBuilder::new(chain, config)
    }

    /// Connects to the chain and constructs the family's collaborators.
    ///
    /// Must succeed before [`subscribe`](Self::subscribe) does anything.
    pub async fn init(&mut self) -> Result<(), ListenerError> {
        let api = C::connect(&self.config).await.map_err(|source| {
            error!(chain = %self.chain, error = %source, "failed to construct API handle");
            ListenerError::Connect { chain: self.chain.clone(), source }
        })?;
        self.subscriber = Some(C::subscriber(&api));
        self.processor = Some(Arc::new(C::processor(&api)));
        self.fetcher = Some(Arc::new(C::storage_fetcher(&api)));
        info!(chain = %self.chain, network = C::NETWORK, "listener initialized");
        Ok(())
    }

    /// Recovers missed blocks, then opens the live feed.
    ///
    /// A driver task consumes raw records, processes them and dispatches the
    /// resulting events until the feed ends. Calling before [`init`] succeeds
    /// logs a warning and returns `Ok` without subscribing.
    pub async fn subscribe(&mut self) -> Result<(), ListenerError> {
        let Some(processor) = self.processor.as_ref().map(Arc::clone) else {
            warn!(chain = %self.chain, "subscriber isn't initialized, call init() first");
            return Ok(());
        };

        if !self.skip_catchup {
            self.process_missed_blocks().await;
        } else {
            info!(chain = %self.chain, "skipping missed block catchup");
        }

        let Some(subscriber) = self.subscriber.as_mut() else {
            warn!(chain = %self.chain, "subscriber isn't initialized, call init() first");
            return Ok(());
        };
        let feed = match subscriber.subscribe().await {
            Ok(feed) => feed,
            Err(source) => {
                error!(chain = %self.chain, error = %source, "failed to open live subscription");
                return Err(ListenerError::Subscribe { chain: self.chain.clone(), source });
            }
        };

        let handlers = self.handlers.clone();
        let last_block = Arc::clone(&self.last_block);
        let chain = self.chain.clone();
        self.driver = Some(tokio::spawn(async move {
            let mut stream = ReceiverStream::new(feed);
            while let Some(raw) = stream.next().await {
                let block = raw.block_number();
                {
                    let mut last = match last_block.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    if last.map_or(true, |prev| block > prev) {
                        *last = Some(block);
                    }
                }
                for event in processor.process(raw).await {
                    handlers.dispatch(&event).await;
                }
            }
            debug!(chain = %chain, "live feed ended, driver task exiting");
        }));
        self.subscribed = true;
        info!(chain = %self.chain, "subscribed to live feed");
        Ok(())
    }

    /// Closes the live feed.
    ///
    /// Records already handed to the driver task still flow through the
    /// handler chain; only new deliveries stop. A no-op when no subscription
    /// was ever active.
    pub fn unsubscribe(&mut self) {
        if !self.subscribed {
            warn!(chain = %self.chain, "no subscription to unsubscribe from");
            return;
        }
        if let Some(subscriber) = self.subscriber.as_mut() {
            subscriber.unsubscribe();
        }
        self.subscribed = false;
        info!(chain = %self.chain, "unsubscribed from live feed");
    }

    /// Runs one offline-recovery cycle through the storage fetcher.
    ///
    /// Recovery is best-effort: any missing collaborator or fetch failure is
    /// logged and the cycle abandoned without affecting the subscription.
    async fn process_missed_blocks(&self) {
        let Some(discover) = self.discover.as_ref() else {
            info!(
                chain = %self.chain,
                "no reconnect-range collaborator configured, skipping missed block catchup"
            );
            return;
        };
        let Some(fetcher) = self.fetcher.as_ref() else {
            warn!(chain = %self.chain, "storage fetcher isn't initialized, call init() first");
            return;
        };

        let Some(mut range) = discover.discover(&self.chain).await else {
            info!(chain = %self.chain, "no missed block range discovered");
            return;
        };

        // Anything the live feed already covered doesn't need recovering.
        let last = {
            let guard = match self.last_block.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard
        };
        if let Some(last) = last {
            if last > range.start_block {
                debug!(
                    chain = %self.chain,
                    discovered = range.start_block,
                    last_block = last,
                    "live feed is ahead of the discovered range start"
                );
                range.start_block = last;
            }
        }

        info!(
            chain = %self.chain,
            start_block = range.start_block,
            end_block = ?range.end_block,
            "recovering missed blocks from storage"
        );
        let events = match fetcher.fetch(Some(range), false).await {
            Ok(events) => events,
            Err(err) => {
                error!(
                    chain = %self.chain,
                    error = %err,
                    "storage fetch failed, abandoning missed block catchup"
                );
                return;
            }
        };
        for event in events {
            self.handlers.dispatch(&event).await;
        }
    }

    /// Swaps in new connection parameters and reconnects.
    ///
    /// Tears down any active subscription first, rebuilds the collaborators
    /// against the new config, and restores the subscription if one was
    /// active before the call.
    pub async fn update_config(&mut self, config: C::Config) -> Result<(), ListenerError> {
        let was_subscribed = self.subscribed;
        if was_subscribed {
            self.unsubscribe();
        }
        self.config = config;
        self.init().await?;
        if was_subscribed {
            self.subscribe().await?;
        }
        Ok(())
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn subscribed(&self) -> bool {
        self.subscribed
    }

    /// Highest block number seen on the live feed, if any.
    pub fn last_block_number(&self) -> Option<u64> {
        let guard = match self.last_block.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard
    }

    /// The storage fetcher, for ad-hoc [`fetch_one`](StorageFetcher::fetch_one)
    /// lookups outside the subscribe/recover flow.
    pub fn storage_fetcher(&self) -> Option<&Arc<C::Fetcher>> {
        self.fetcher.as_ref()
    }
}

impl<C: ChainFamily> Drop for Listener<C> {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}
