#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chain_events::{
    chains::{
        aave::{AaveApi, AaveProposal, AaveRawLog},
        substrate::{
            CollectiveProposalRecord, CollectiveVotesRecord, DepositInfo, DispatchEntry,
            PreimageRecord, PublicProposal, ReferendumInfo, SubstrateApi, SubstrateBlock,
            TreasuryProposalRecord,
        },
    },
    ApiConnector, ApiError, ChainEvent, DisconnectedRange, DiscoverReconnectRange, EventData,
    EventHandler, HandlerError,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Installs a fmt subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// In-memory Substrate node: storage maps plus a push feed whose sending
/// half is held here so tests can inject blocks and close the feed.
#[derive(Default)]
pub struct MockSubstrateApi {
    pub spec_version: u32,
    pub head: u64,
    pub public_props: Vec<PublicProposal>,
    pub deposits: HashMap<u32, DepositInfo>,
    pub referenda: Vec<ReferendumInfo>,
    pub dispatch_queue: Vec<DispatchEntry>,
    pub preimages: HashMap<String, PreimageRecord>,
    pub treasury_count: u32,
    pub treasury_approvals: Vec<u32>,
    pub treasury_proposals: HashMap<u32, TreasuryProposalRecord>,
    pub collective_hashes: HashMap<String, Vec<String>>,
    pub collective_records: HashMap<(String, String), CollectiveProposalRecord>,
    pub collective_vote_records: HashMap<(String, String), CollectiveVotesRecord>,
    feed: Mutex<Option<mpsc::Sender<SubstrateBlock>>>,
}

impl MockSubstrateApi {
    pub fn new(spec_version: u32, head: u64) -> Self {
        Self { spec_version, head, ..Default::default() }
    }

    pub async fn push_block(&self, block: SubstrateBlock) {
        let tx = self.feed.lock().unwrap().clone();
        tx.expect("no active block feed").send(block).await.expect("feed receiver dropped");
    }

    pub fn feed_open(&self) -> bool {
        self.feed.lock().unwrap().is_some()
    }
}

#[async_trait]
impl SubstrateApi for MockSubstrateApi {
    async fn runtime_version(&self) -> Result<u32, ApiError> {
        Ok(self.spec_version)
    }

    async fn best_block_number(&self) -> Result<u64, ApiError> {
        Ok(self.head)
    }

    async fn subscribe_blocks(&self) -> Result<mpsc::Receiver<SubstrateBlock>, ApiError> {
        let (tx, rx) = mpsc::channel(64);
        *self.feed.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn unsubscribe_blocks(&self) {
        self.feed.lock().unwrap().take();
    }

    async fn public_props(&self) -> Result<Vec<PublicProposal>, ApiError> {
        Ok(self.public_props.clone())
    }

    async fn deposit_of(&self, proposal_index: u32) -> Result<Option<DepositInfo>, ApiError> {
        Ok(self.deposits.get(&proposal_index).cloned())
    }

    async fn referendum_info(
        &self,
        referendum_index: u32,
    ) -> Result<Option<ReferendumInfo>, ApiError> {
        Ok(self.referenda.iter().find(|r| r.index == referendum_index).cloned())
    }

    async fn active_referenda(&self) -> Result<Vec<ReferendumInfo>, ApiError> {
        Ok(self.referenda.clone())
    }

    async fn dispatch_queue(&self) -> Result<Vec<DispatchEntry>, ApiError> {
        Ok(self.dispatch_queue.clone())
    }

    async fn preimage(&self, proposal_hash: &str) -> Result<Option<PreimageRecord>, ApiError> {
        Ok(self.preimages.get(proposal_hash).cloned())
    }

    async fn treasury_proposal_count(&self) -> Result<u32, ApiError> {
        Ok(self.treasury_count)
    }

    async fn treasury_approvals(&self) -> Result<Vec<u32>, ApiError> {
        Ok(self.treasury_approvals.clone())
    }

    async fn treasury_proposal(
        &self,
        proposal_index: u32,
    ) -> Result<Option<TreasuryProposalRecord>, ApiError> {
        Ok(self.treasury_proposals.get(&proposal_index).cloned())
    }

    async fn collective_proposals(&self, collective: &str) -> Result<Vec<String>, ApiError> {
        Ok(self.collective_hashes.get(collective).cloned().unwrap_or_default())
    }

    async fn collective_proposal_of(
        &self,
        collective: &str,
        proposal_hash: &str,
    ) -> Result<Option<CollectiveProposalRecord>, ApiError> {
        Ok(self
            .collective_records
            .get(&(collective.to_owned(), proposal_hash.to_owned()))
            .cloned())
    }

    async fn collective_votes(
        &self,
        collective: &str,
        proposal_hash: &str,
    ) -> Result<Option<CollectiveVotesRecord>, ApiError> {
        Ok(self
            .collective_vote_records
            .get(&(collective.to_owned(), proposal_hash.to_owned()))
            .cloned())
    }
}

/// In-memory Aave governance contract.
#[derive(Default)]
pub struct MockAaveApi {
    pub head: u64,
    pub proposals: Vec<AaveProposal>,
    /// When set, `subscribe_logs` refuses to open the feed.
    pub fail_subscribe: bool,
    /// When set, `current_block` errors, breaking storage fetches.
    pub fail_storage: bool,
    feed: Mutex<Option<mpsc::Sender<AaveRawLog>>>,
}

impl MockAaveApi {
    pub fn new(head: u64, proposals: Vec<AaveProposal>) -> Self {
        Self { head, proposals, ..Default::default() }
    }

    pub async fn push_log(&self, log: AaveRawLog) {
        let tx = self.feed.lock().unwrap().clone();
        tx.expect("no active log feed").send(log).await.expect("feed receiver dropped");
    }

    pub fn feed_open(&self) -> bool {
        self.feed.lock().unwrap().is_some()
    }
}

#[async_trait]
impl AaveApi for MockAaveApi {
    async fn current_block(&self) -> Result<u64, ApiError> {
        if self.fail_storage {
            return Err(ApiError::rpc("storage unavailable"));
        }
        Ok(self.head)
    }

    async fn proposal_count(&self) -> Result<u32, ApiError> {
        Ok(self.proposals.len() as u32)
    }

    async fn proposal_by_id(&self, id: u32) -> Result<Option<AaveProposal>, ApiError> {
        Ok(self.proposals.iter().find(|p| p.id == id).cloned())
    }

    async fn subscribe_logs(&self) -> Result<mpsc::Receiver<AaveRawLog>, ApiError> {
        if self.fail_subscribe {
            return Err(ApiError::SubscriptionClosed);
        }
        let (tx, rx) = mpsc::channel(64);
        *self.feed.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn unsubscribe_logs(&self) {
        self.feed.lock().unwrap().take();
    }
}

/// Connector that hands out a pre-built API handle.
pub struct FixedConnector<A>(pub A);

#[async_trait]
impl<A: Clone + Send + Sync> ApiConnector<A> for FixedConnector<A> {
    async fn connect(&self) -> Result<A, ApiError> {
        Ok(self.0.clone())
    }
}

/// Connector whose connection always fails.
pub struct RefusingConnector;

#[async_trait]
impl<A: Send + Sync + 'static> ApiConnector<A> for RefusingConnector {
    async fn connect(&self) -> Result<A, ApiError> {
        Err(ApiError::rpc("connection refused"))
    }
}

/// Reconnect-range collaborator whose answer tests can change between
/// subscribe cycles.
pub struct SettableRange(Mutex<Option<DisconnectedRange>>);

impl SettableRange {
    pub fn new(range: Option<DisconnectedRange>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(range)))
    }

    pub fn set(&self, range: Option<DisconnectedRange>) {
        *self.0.lock().unwrap() = range;
    }
}

#[async_trait]
impl DiscoverReconnectRange for SettableRange {
    async fn discover(&self, _chain: &str) -> Option<DisconnectedRange> {
        *self.0.lock().unwrap()
    }
}

/// Handler that forwards every event (with the chained value it received)
/// into a channel, and passes its own name on as the chained value.
pub struct RecordingHandler<D: EventData> {
    name: String,
    excluded: Vec<D::Kind>,
    tx: mpsc::UnboundedSender<(ChainEvent<D>, Option<Value>)>,
}

impl<D: EventData> RecordingHandler<D> {
    pub fn new(
        name: &str,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<(ChainEvent<D>, Option<Value>)>) {
        Self::with_exclusions(name, Vec::new())
    }

    pub fn with_exclusions(
        name: &str,
        excluded: Vec<D::Kind>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<(ChainEvent<D>, Option<Value>)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { name: name.to_owned(), excluded, tx }), rx)
    }
}

#[async_trait]
impl<D: EventData> EventHandler<D> for RecordingHandler<D> {
    async fn handle(
        &self,
        event: &ChainEvent<D>,
        prev: Option<Value>,
    ) -> Result<Option<Value>, HandlerError> {
        self.tx
            .send((event.clone(), prev))
            .map_err(|_| HandlerError::new("recording channel closed"))?;
        Ok(Some(json!(self.name)))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn excluded_events(&self) -> &[D::Kind] {
        &self.excluded
    }
}

/// Handler that fails whenever the event kind matches.
pub struct FailingHandler<D: EventData> {
    name: String,
    fail_on: D::Kind,
}

impl<D: EventData> FailingHandler<D> {
    pub fn new(name: &str, fail_on: D::Kind) -> Arc<Self> {
        Arc::new(Self { name: name.to_owned(), fail_on })
    }
}

#[async_trait]
impl<D: EventData> EventHandler<D> for FailingHandler<D> {
    async fn handle(
        &self,
        event: &ChainEvent<D>,
        prev: Option<Value>,
    ) -> Result<Option<Value>, HandlerError> {
        if event.kind() == self.fail_on {
            return Err(HandlerError::new("synthetic failure"));
        }
        Ok(prev)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
